pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::PlanConfig};

pub use crate::core::composer::{compose_environment, compose_template};
pub use crate::core::engine::{PlanEngine, PlanSummary};
pub use crate::core::parser::{parse_environment, parse_template};
pub use crate::core::plan::DeploymentPlan;
pub use domain::model::{Environment, Template};
pub use utils::error::{PlanError, Result};
