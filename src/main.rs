use clap::Parser;
use income_predict::utils::error::ErrorSeverity;
use income_predict::utils::{logger, validation::Validate};
use income_predict::{
    CliConfig, EtlEngine, LocalStorage, PredictError, PredictionClient, PredictionMode,
    PredictionPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting income-predict CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.mode == PredictionMode::Info {
        let client = PredictionClient::new(&config.api_endpoint, config.timeout_seconds)?;
        print!("{}", client.service_info().await);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let result = match PredictionPipeline::new(storage, config) {
        Ok(pipeline) => EtlEngine::new(pipeline).run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output_path) => {
            println!("✅ Prediction completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn exit_with(e: PredictError) -> ! {
    tracing::error!(
        "❌ Prediction failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
