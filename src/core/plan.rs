use crate::core::{composer, namespace, parser};
use crate::domain::model::{
    Environment, EnvironmentParameter, Output, Parameter, ParameterConstraint, RegistryEntry,
    Resource, ResourceProperty, Template, Value,
};
use crate::utils::error::{PlanError, Result};
use serde_json::json;
use std::collections::HashMap;

/// ResourceGroup 類型，用來包裝可擴展的角色
pub const GROUP_RESOURCE_TYPE: &str = "OS::Heat::ResourceGroup";

/// 被視為「角色包裝」的 group 類型
pub const SCALING_RESOURCE_TYPES: &[&str] = &["OS::Heat::ResourceGroup", "OS::Heat::AutoScalingGroup"];

pub const RESOURCE_DEF_PROPERTY: &str = "resource_def";
pub const COUNT_PROPERTY: &str = "count";

/// 一個部署計畫：master 模板與環境檔必須一起修改
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPlan {
    pub master_template: Template,
    pub environment: Environment,
    add_scaling: bool,
}

impl Default for DeploymentPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentPlan {
    pub fn new() -> Self {
        Self {
            master_template: Template::new(),
            environment: Environment::new(),
            add_scaling: true,
        }
    }

    pub fn from_parts(master_template: Template, environment: Environment) -> Self {
        Self {
            master_template,
            environment,
            add_scaling: true,
        }
    }

    /// 由持久層的兩份文字重建計畫
    pub fn from_texts(template_text: &str, environment_text: &str) -> Result<Self> {
        let master_template = parser::parse_template(template_text)?;
        let environment = parser::parse_environment(environment_text)?;
        Ok(Self::from_parts(master_template, environment))
    }

    /// 回傳 (master 模板文字, 環境文字)
    pub fn compose(&self) -> Result<(String, String)> {
        Ok((
            composer::compose_template(&self.master_template)?,
            composer::compose_environment(&self.environment)?,
        ))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.master_template.description = Some(description.into());
        self
    }

    /// 啟用時，每個角色都會包在 ResourceGroup 中並加上 count 參數
    pub fn with_scaling(mut self, add_scaling: bool) -> Self {
        self.add_scaling = add_scaling;
        self
    }

    pub fn scaling_enabled(&self) -> bool {
        self.add_scaling
    }

    /// 依 namespace 回傳角色在 master 模板中的資源 id
    pub fn master_resource_id(&self, ns: &str) -> String {
        if self.add_scaling {
            namespace::generate_group_id(ns)
        } else {
            namespace::generate_resource_id(ns)
        }
    }

    /// 目前已加入計畫的所有 namespace (依 registry 推得)
    pub fn role_namespaces(&self) -> Vec<&str> {
        self.environment
            .registry_entries()
            .filter_map(|e| namespace::remove_resource_alias_namespace(e.alias()))
            .collect()
    }

    pub fn add_template(
        &mut self,
        ns: &str,
        template: &Template,
        filename: &str,
        override_properties: Option<&HashMap<String, Value>>,
    ) -> Result<()> {
        let resource_alias = namespace::apply_resource_alias_namespace(ns);
        self.ensure_namespace_is_free(ns, &resource_alias)?;

        let is_overridden =
            |name: &str| override_properties.is_some_and(|props| props.contains_key(name));

        // 角色自己的 count 參數會與 group 的 count 參數同名
        if self.add_scaling && template.has_parameter(COUNT_PROPERTY) && !is_overridden(COUNT_PROPERTY) {
            return Err(PlanError::duplicate(
                "parameter",
                &namespace::generate_count_property_name(ns),
            ));
        }

        tracing::debug!("Adding template under namespace '{}' ({})", ns, filename);

        // Parameters
        for parameter in template.parameters() {
            if is_overridden(parameter.name()) {
                continue;
            }
            let namespaced = namespace::apply_template_namespace(ns, parameter.name());
            let value = parameter
                .default
                .clone()
                .unwrap_or_else(|| Value::String(String::new()));
            self.master_template
                .add_parameter(parameter.renamed(namespaced.clone()))?;
            self.environment
                .add_parameter(EnvironmentParameter::new(namespaced, value))?;
        }

        // Resource
        let resource_id = self.master_resource_id(ns);
        let mut inner = Resource::new(resource_id.clone(), resource_alias.clone());
        for parameter in template.parameters() {
            let value = match override_properties.and_then(|props| props.get(parameter.name())) {
                Some(literal) => literal.clone(),
                None => json!({
                    "get_param": namespace::apply_template_namespace(ns, parameter.name())
                }),
            };
            inner.add_property(ResourceProperty::new(parameter.name(), value));
        }

        let master_resource = if self.add_scaling {
            self.add_count_parameter(ns)?;
            let mut group = Resource::new(resource_id.clone(), GROUP_RESOURCE_TYPE);
            group.add_property(ResourceProperty::new(
                COUNT_PROPERTY,
                json!({"get_param": namespace::generate_count_property_name(ns)}),
            ));
            group.add_property(ResourceProperty::new(RESOURCE_DEF_PROPERTY, inner));
            group
        } else {
            inner
        };
        self.master_template.add_resource(master_resource)?;

        // Outputs
        for output in template.outputs() {
            let mut master_output = Output::new(
                namespace::apply_template_namespace(ns, output.name()),
                json!({"get_attr": [resource_id, output.name()]}),
            );
            master_output.description = output.description.clone();
            self.master_template.add_output(master_output)?;
        }

        self.environment
            .add_registry_entry(RegistryEntry::new(resource_alias, filename));

        tracing::debug!(
            "Namespace '{}' added: master now has {} parameters, {} resources, {} outputs",
            ns,
            self.master_template.parameter_count(),
            self.master_template.resource_count(),
            self.master_template.output_count()
        );
        Ok(())
    }

    /// 移除 namespace 的所有內容；不存在的 namespace 不會報錯
    pub fn remove_template(&mut self, ns: &str) {
        let parameters = self.master_template.remove_parameters_by_namespace(ns);
        let outputs = self.master_template.remove_outputs_by_namespace(ns);

        // 兩種 id 都嘗試移除，與建立時是否啟用 scaling 無關
        let mut resources = 0;
        for resource_id in [
            namespace::generate_resource_id(ns),
            namespace::generate_group_id(ns),
        ] {
            if self.master_template.remove_resource_by_id(&resource_id).is_some() {
                resources += 1;
            }
        }

        self.environment.remove_parameters_by_namespace(ns);
        self.environment
            .remove_registry_entry_by_alias(&namespace::apply_resource_alias_namespace(ns));

        tracing::debug!(
            "Removed namespace '{}': {} parameters, {} outputs, {} resources",
            ns,
            parameters.len(),
            outputs.len(),
            resources
        );
    }

    /// `name` 必須是完整的 namespaced 名稱
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<()> {
        let parameter = self.environment.find_parameter_by_name_mut(name)?;
        parameter.value = value;
        Ok(())
    }

    fn add_count_parameter(&mut self, ns: &str) -> Result<()> {
        let name = namespace::generate_count_property_name(ns);
        let mut count = Parameter::new(name.clone(), "number").with_default(json!(1));
        count.add_constraint(ParameterConstraint::new("range", json!({"min": 1})));
        self.master_template.add_parameter(count)?;
        self.environment
            .add_parameter(EnvironmentParameter::new(name, json!(1)))?;
        Ok(())
    }

    fn ensure_namespace_is_free(&self, ns: &str, resource_alias: &str) -> Result<()> {
        let registered = self
            .environment
            .find_registry_entry_by_alias(resource_alias)
            .is_ok();
        let resource_taken = self
            .master_template
            .has_resource(&namespace::generate_resource_id(ns))
            || self
                .master_template
                .has_resource(&namespace::generate_group_id(ns));
        let parameters_taken = self
            .master_template
            .parameters()
            .any(|p| namespace::matches_template_namespace(ns, p.name()))
            || self
                .environment
                .parameters()
                .any(|p| namespace::matches_template_namespace(ns, p.name()));
        let outputs_taken = self
            .master_template
            .outputs()
            .any(|o| namespace::matches_template_namespace(ns, o.name()));

        if registered || resource_taken || parameters_taken || outputs_taken {
            return Err(PlanError::duplicate("namespace", ns));
        }
        Ok(())
    }
}
