use clap::Parser;
use plan_composer::utils::{logger, validation::Validate};
use plan_composer::{CliConfig, LocalStorage, PlanConfig, PlanEngine};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting plan-composer");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let config_path = std::path::Path::new(&cli.base_path).join(&cli.config);
    let mut config = PlanConfig::from_file(&config_path)?;
    if let Some(output_path) = &cli.output_path {
        config.output.path = output_path.clone();
    }
    if cli.no_scaling {
        config.plan.scaling = Some(false);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Plan configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let storage = LocalStorage::new(cli.base_path.clone());
    let engine = PlanEngine::new(storage, config);

    let result = match &cli.remove {
        Some(ns) => engine.remove_role(ns),
        None => engine.run(),
    };

    match result {
        Ok(summary) => {
            println!("✅ Plan '{}' written", engine.config().plan.name);
            println!("📁 Template: {}", summary.template_path);
            println!("📁 Environment: {}", summary.environment_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Plan composition failed: {}", e);
            eprintln!("❌ {}", e);

            // 輸入資料錯誤與 IO / 設定錯誤使用不同的結束碼
            let exit_code = if e.is_data_error() { 2 } else { 1 };
            std::process::exit(exit_code);
        }
    }
}
