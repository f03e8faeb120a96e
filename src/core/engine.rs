use crate::config::toml_config::PlanConfig;
use crate::core::plan::DeploymentPlan;
use crate::core::{parser, seed, Storage};
use crate::domain::model::Template;
use crate::utils::error::{PlanError, Result};

/// 一次組合的結果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub roles: usize,
    pub parameters: usize,
    pub resources: usize,
    pub outputs: usize,
    pub registry_entries: usize,
    pub template_path: String,
    pub environment_path: String,
}

pub struct PlanEngine<S: Storage> {
    storage: S,
    config: PlanConfig,
}

impl<S: Storage> PlanEngine<S> {
    pub fn new(storage: S, config: PlanConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// 依配置組合計畫並寫出 master 模板與環境檔
    pub fn run(&self) -> Result<PlanSummary> {
        tracing::info!("Composing plan '{}'", self.config.plan.name);

        let plan = self.build_plan()?;
        let summary = self.store_plan(&plan)?;

        tracing::info!(
            "Plan '{}' composed: {} roles, {} parameters, {} resources, {} outputs",
            self.config.plan.name,
            summary.roles,
            summary.parameters,
            summary.resources,
            summary.outputs
        );
        Ok(summary)
    }

    /// 從已輸出的計畫中移除一個 namespace 並寫回
    pub fn remove_role(&self, ns: &str) -> Result<PlanSummary> {
        let mut plan = self.load_plan()?;

        if !plan.role_namespaces().contains(&ns) {
            tracing::warn!("Namespace '{}' is not part of the plan, nothing to remove", ns);
        }
        plan.remove_template(ns);

        let summary = self.store_plan(&plan)?;
        tracing::info!("Removed namespace '{}' from plan '{}'", ns, self.config.plan.name);
        Ok(summary)
    }

    pub fn load_plan(&self) -> Result<DeploymentPlan> {
        let template_path = self.config.output.template_path();
        if !self.storage.exists(&template_path) {
            return Err(PlanError::not_found("plan template", &template_path));
        }

        let template_text = self.storage.read_to_string(&template_path)?;
        let environment_text = self
            .storage
            .read_to_string(&self.config.output.environment_path())?;
        Ok(DeploymentPlan::from_texts(&template_text, &environment_text)?
            .with_scaling(self.config.scaling_enabled()))
    }

    pub fn build_plan(&self) -> Result<DeploymentPlan> {
        let seed = self.load_seed()?;

        let mut plan = DeploymentPlan::new().with_scaling(self.config.scaling_enabled());
        if let Some(description) = &self.config.plan.description {
            plan = plan.with_description(description.clone());
        }

        for role in &self.config.roles {
            let ns = role.namespace();
            tracing::debug!("Adding role '{}' from {}", ns, role.template);

            let role_template = parser::parse_template(&self.storage.read_to_string(&role.template)?)?;
            let overrides = match &seed {
                Some(seed) => seed::get_property_map_for_role(seed, &role.name)?,
                None => None,
            };

            plan.add_template(&ns, &role_template, &role.registry_filename(), overrides.as_ref())?;

            for (name, value) in PlanConfig::namespaced_role_parameters(role) {
                plan.set_value(&name, value)?;
            }
        }

        if let Some(seed) = &seed {
            self.inject_seed(seed, &mut plan)?;
        }

        if let Some(parameters) = &self.config.plan.parameters {
            for (name, value) in parameters {
                plan.set_value(name, value.clone())?;
            }
        }

        Ok(plan)
    }

    fn load_seed(&self) -> Result<Option<Template>> {
        match &self.config.seed {
            Some(seed) => {
                tracing::debug!("Loading seed template {}", seed.template);
                let text = self.storage.read_to_string(&seed.template)?;
                Ok(Some(parser::parse_template(&text)?))
            }
            None => Ok(None),
        }
    }

    fn inject_seed(&self, seed: &Template, plan: &mut DeploymentPlan) -> Result<()> {
        seed::add_top_level_resources(seed, &mut plan.master_template)?;
        seed::add_top_level_parameters(seed, &mut plan.master_template, &mut plan.environment)?;
        seed::add_top_level_outputs(seed, &mut plan.master_template)?;

        for role in &self.config.roles {
            let seed_role = seed
                .resources()
                .filter(|r| seed::is_role_resource(r))
                .find(|r| r.resource_id().to_lowercase() == role.name.to_lowercase());

            match seed_role {
                Some(seed_role) => {
                    let resource_id = plan.master_resource_id(&role.namespace());
                    seed::update_references(
                        &mut plan.master_template,
                        seed_role.resource_id(),
                        &resource_id,
                    );
                }
                None => tracing::warn!("Role '{}' has no counterpart in the seed template", role.name),
            }
        }
        Ok(())
    }

    fn store_plan(&self, plan: &DeploymentPlan) -> Result<PlanSummary> {
        let (template_text, environment_text) = plan.compose()?;

        let template_path = self.config.output.template_path();
        let environment_path = self.config.output.environment_path();
        self.storage.write_string(&template_path, &template_text)?;
        self.storage.write_string(&environment_path, &environment_text)?;

        Ok(PlanSummary {
            roles: plan.role_namespaces().len(),
            parameters: plan.master_template.parameter_count(),
            resources: plan.master_template.resource_count(),
            outputs: plan.master_template.output_count(),
            registry_entries: plan.environment.registry_entry_count(),
            template_path,
            environment_path,
        })
    }
}
