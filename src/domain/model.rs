use crate::core::namespace;
use crate::utils::error::{PlanError, Result};
use indexmap::{IndexMap, IndexSet};

/// 模板中所有「不透明」欄位 (metadata、policy、屬性值、輸出值) 的通用值樹
pub type Value = serde_json::Value;

/// `heat_template_version` 缺省時使用的版本
pub const DEFAULT_TEMPLATE_VERSION: &str = "2014-10-16";

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub version: String,
    pub description: Option<String>,
    parameters: IndexMap<String, Parameter>,
    parameter_groups: Vec<ParameterGroup>,
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    pub fn new() -> Self {
        Self {
            version: DEFAULT_TEMPLATE_VERSION.to_string(),
            description: None,
            parameters: IndexMap::new(),
            parameter_groups: Vec::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // Parameters

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<()> {
        if self.parameters.contains_key(parameter.name()) {
            return Err(PlanError::duplicate("parameter", parameter.name()));
        }
        self.parameters
            .insert(parameter.name().to_string(), parameter);
        Ok(())
    }

    pub fn find_parameter_by_name(&self, name: &str) -> Result<&Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| PlanError::not_found("parameter", name))
    }

    pub fn remove_parameter_by_name(&mut self, name: &str) -> Option<Parameter> {
        self.parameters.shift_remove(name)
    }

    /// 移除所有屬於指定 namespace 的參數，回傳被移除的項目
    pub fn remove_parameters_by_namespace(&mut self, ns: &str) -> Vec<Parameter> {
        drain_matching(&mut self.parameters, |name| {
            namespace::matches_template_namespace(ns, name)
        })
    }

    // Parameter groups

    pub fn parameter_groups(&self) -> &[ParameterGroup] {
        &self.parameter_groups
    }

    pub fn add_parameter_group(&mut self, group: ParameterGroup) {
        self.parameter_groups.push(group);
    }

    pub fn find_parameter_group_by_label(&self, label: &str) -> Option<&ParameterGroup> {
        self.parameter_groups.iter().find(|g| g.label == label)
    }

    pub fn remove_parameter_group_by_label(&mut self, label: &str) -> Option<ParameterGroup> {
        let index = self.parameter_groups.iter().position(|g| g.label == label)?;
        Some(self.parameter_groups.remove(index))
    }

    // Resources

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn resources_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources.values_mut()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn has_resource(&self, resource_id: &str) -> bool {
        self.resources.contains_key(resource_id)
    }

    pub fn add_resource(&mut self, resource: Resource) -> Result<()> {
        if self.resources.contains_key(resource.resource_id()) {
            return Err(PlanError::duplicate("resource", resource.resource_id()));
        }
        self.resources
            .insert(resource.resource_id().to_string(), resource);
        Ok(())
    }

    pub fn find_resource_by_id(&self, resource_id: &str) -> Result<&Resource> {
        self.resources
            .get(resource_id)
            .ok_or_else(|| PlanError::not_found("resource", resource_id))
    }

    pub fn remove_resource_by_id(&mut self, resource_id: &str) -> Option<Resource> {
        self.resources.shift_remove(resource_id)
    }

    // Outputs

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn add_output(&mut self, output: Output) -> Result<()> {
        if self.outputs.contains_key(output.name()) {
            return Err(PlanError::duplicate("output", output.name()));
        }
        self.outputs.insert(output.name().to_string(), output);
        Ok(())
    }

    pub fn find_output_by_name(&self, name: &str) -> Result<&Output> {
        self.outputs
            .get(name)
            .ok_or_else(|| PlanError::not_found("output", name))
    }

    pub fn remove_output_by_name(&mut self, name: &str) -> Option<Output> {
        self.outputs.shift_remove(name)
    }

    pub fn remove_outputs_by_namespace(&mut self, ns: &str) -> Vec<Output> {
        drain_matching(&mut self.outputs, |name| {
            namespace::matches_template_namespace(ns, name)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    pub param_type: String,
    pub description: Option<String>,
    pub label: Option<String>,
    pub default: Option<Value>,
    pub hidden: Option<bool>,
    constraints: Vec<ParameterConstraint>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: None,
            label: None,
            default: None,
            hidden: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 複製參數並改名 (合併角色模板時加上 namespace)
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn constraints(&self) -> &[ParameterConstraint] {
        &self.constraints
    }

    pub fn add_constraint(&mut self, constraint: ParameterConstraint) {
        self.constraints.push(constraint);
    }

    /// 依 constraint 類型移除，回傳被移除的數量
    pub fn remove_constraints_by_type(&mut self, constraint_type: &str) -> usize {
        let before = self.constraints.len();
        self.constraints
            .retain(|c| c.constraint_type != constraint_type);
        before - self.constraints.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterConstraint {
    pub constraint_type: String,
    pub definition: Value,
    pub description: Option<String>,
}

impl ParameterConstraint {
    pub fn new(constraint_type: impl Into<String>, definition: Value) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            definition,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    pub label: String,
    pub description: Option<String>,
    parameter_names: IndexSet<String>,
}

impl ParameterGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            parameter_names: IndexSet::new(),
        }
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameter_names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameter_names.contains(name)
    }

    /// 重複的名稱會被合併
    pub fn add_parameter_name(&mut self, name: impl Into<String>) {
        self.parameter_names.insert(name.into());
    }

    pub fn remove_parameter_name(&mut self, name: &str) -> bool {
        self.parameter_names.shift_remove(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    resource_id: String,
    pub resource_type: String,
    pub metadata: Option<Value>,
    pub depends_on: Option<Value>,
    pub update_policy: Option<Value>,
    pub deletion_policy: Option<Value>,
    properties: IndexMap<String, ResourceProperty>,
}

impl Resource {
    pub fn new(resource_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
            metadata: None,
            depends_on: None,
            update_policy: None,
            deletion_policy: None,
            properties: IndexMap::new(),
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn properties(&self) -> impl Iterator<Item = &ResourceProperty> {
        self.properties.values()
    }

    pub fn properties_mut(&mut self) -> impl Iterator<Item = &mut ResourceProperty> {
        self.properties.values_mut()
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// 同名屬性會被取代，回傳舊值
    pub fn add_property(&mut self, property: ResourceProperty) -> Option<ResourceProperty> {
        self.properties.insert(property.name.clone(), property)
    }

    pub fn find_property_by_name(&self, name: &str) -> Option<&ResourceProperty> {
        self.properties.get(name)
    }

    pub fn remove_property_by_name(&mut self, name: &str) -> Option<ResourceProperty> {
        self.properties.shift_remove(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl ResourceProperty {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 屬性值：一般的值樹，或內嵌的資源定義 (例如 ResourceGroup 的 `resource_def`)
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Value(Value),
    Resource(Box<Resource>),
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

impl From<Resource> for PropertyValue {
    fn from(resource: Resource) -> Self {
        PropertyValue::Resource(Box::new(resource))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    name: String,
    pub value: Value,
    pub description: Option<String>,
}

impl Output {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    parameters: IndexMap<String, EnvironmentParameter>,
    registry_entries: IndexMap<String, RegistryEntry>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &EnvironmentParameter> {
        self.parameters.values()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn add_parameter(&mut self, parameter: EnvironmentParameter) -> Result<()> {
        if self.parameters.contains_key(parameter.name()) {
            return Err(PlanError::duplicate("environment parameter", parameter.name()));
        }
        self.parameters
            .insert(parameter.name().to_string(), parameter);
        Ok(())
    }

    pub fn find_parameter_by_name(&self, name: &str) -> Result<&EnvironmentParameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| PlanError::not_found("environment parameter", name))
    }

    pub fn find_parameter_by_name_mut(&mut self, name: &str) -> Result<&mut EnvironmentParameter> {
        self.parameters
            .get_mut(name)
            .ok_or_else(|| PlanError::not_found("environment parameter", name))
    }

    pub fn remove_parameter_by_name(&mut self, name: &str) -> Option<EnvironmentParameter> {
        self.parameters.shift_remove(name)
    }

    pub fn remove_parameters_by_namespace(&mut self, ns: &str) -> Vec<EnvironmentParameter> {
        drain_matching(&mut self.parameters, |name| {
            namespace::matches_template_namespace(ns, name)
        })
    }

    pub fn registry_entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.registry_entries.values()
    }

    pub fn registry_entry_count(&self) -> usize {
        self.registry_entries.len()
    }

    /// 同一個 alias 只會對應一個檔名：重複加入時取代舊的項目
    pub fn add_registry_entry(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.registry_entries.insert(entry.alias().to_string(), entry)
    }

    pub fn find_registry_entry_by_alias(&self, alias: &str) -> Result<&RegistryEntry> {
        self.registry_entries
            .get(alias)
            .ok_or_else(|| PlanError::not_found("registry entry", alias))
    }

    pub fn remove_registry_entry_by_alias(&mut self, alias: &str) -> Option<RegistryEntry> {
        self.registry_entries.shift_remove(alias)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentParameter {
    name: String,
    pub value: Value,
}

impl EnvironmentParameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    alias: String,
    pub filename: String,
}

impl RegistryEntry {
    pub fn new(alias: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            filename: filename.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

fn drain_matching<T>(map: &mut IndexMap<String, T>, matches: impl Fn(&str) -> bool) -> Vec<T> {
    let doomed: Vec<String> = map.keys().filter(|k| matches(k.as_str())).cloned().collect();
    doomed
        .into_iter()
        .filter_map(|key| map.shift_remove(&key))
        .collect()
}
