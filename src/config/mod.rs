pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "plan-composer")]
#[command(about = "Compose role templates into a single deployment plan")]
pub struct CliConfig {
    #[arg(long, short, help = "Path to the TOML plan description")]
    pub config: String,

    #[arg(long, default_value = ".", help = "Directory template paths are resolved against")]
    pub base_path: String,

    #[arg(long, help = "Override the output directory from the plan description")]
    pub output_path: Option<String>,

    #[arg(long, help = "Remove the given namespace from an already composed plan")]
    pub remove: Option<String>,

    #[arg(long, help = "Do not wrap roles in scaling groups")]
    pub no_scaling: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config", &self.config)?;
        validation::validate_file_extensions("config", &[self.config.as_str()], &["toml"])?;
        validation::validate_path("base_path", &self.base_path)?;
        if let Some(output_path) = &self.output_path {
            validation::validate_path("output_path", output_path)?;
        }
        if let Some(ns) = &self.remove {
            validation::validate_non_empty_string("remove", ns)?;
        }
        Ok(())
    }
}
