use crate::core::namespace;
use crate::utils::error::{PlanError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub plan: PlanInfo,
    pub seed: Option<SeedConfig>,
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInfo {
    pub name: String,
    pub description: Option<String>,
    pub scaling: Option<bool>,
    /// 以完整名稱覆寫的環境參數 (在 seed 注入之後套用)
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    pub version: usize,
    pub template: String,
    pub filename: Option<String>,
    /// 以角色原本的參數名稱 (不含 namespace) 覆寫
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

impl RoleConfig {
    /// namespace = 角色名稱 + 版本
    pub fn namespace(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    pub fn registry_filename(&self) -> String {
        self.filename
            .clone()
            .unwrap_or_else(|| format!("provider-{}.yaml", self.namespace()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub template: Option<String>,
    pub environment: Option<String>,
}

impl OutputConfig {
    pub fn template_path(&self) -> String {
        let name = self.template.as_deref().unwrap_or("plan.yaml");
        format!("{}/{}", self.path.trim_end_matches('/'), name)
    }

    pub fn environment_path(&self) -> String {
        let name = self.environment.as_deref().unwrap_or("environment.yaml");
        format!("{}/{}", self.path.trim_end_matches('/'), name)
    }
}

impl PlanConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KEY_NAME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlanError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn scaling_enabled(&self) -> bool {
        self.plan.scaling.unwrap_or(true)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("plan.name", &self.plan.name)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(seed) = &self.seed {
            validation::validate_path("seed.template", &seed.template)?;
            validation::validate_file_extensions(
                "seed.template",
                &[seed.template.as_str()],
                TEMPLATE_EXTENSIONS,
            )?;
        }

        let mut namespaces = HashSet::new();
        for role in &self.roles {
            validation::validate_namespace_component("roles.name", &role.name)?;
            validation::validate_positive_number("roles.version", role.version, 1)?;
            validation::validate_path("roles.template", &role.template)?;
            validation::validate_file_extensions(
                "roles.template",
                &[role.template.as_str()],
                TEMPLATE_EXTENSIONS,
            )?;
            if let Some(filename) = &role.filename {
                validation::validate_non_empty_string("roles.filename", filename)?;
            }

            let ns = role.namespace();
            if !namespaces.insert(ns.clone()) {
                return Err(PlanError::InvalidConfigValueError {
                    field: "roles".to_string(),
                    value: ns,
                    reason: "Role name and version must be unique".to_string(),
                });
            }
        }

        if let Some(parameters) = &self.plan.parameters {
            for name in parameters.keys() {
                validation::validate_non_empty_string("plan.parameters", name)?;
            }
        }

        Ok(())
    }

    /// 角色參數覆寫轉為完整的 namespaced 名稱
    pub fn namespaced_role_parameters(role: &RoleConfig) -> Vec<(String, serde_json::Value)> {
        let ns = role.namespace();
        role.parameters
            .iter()
            .flatten()
            .map(|(name, value)| (namespace::apply_template_namespace(&ns, name), value.clone()))
            .collect()
    }
}

impl Validate for PlanConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
