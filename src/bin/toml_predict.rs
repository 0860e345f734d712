use anyhow::Context;
use clap::Parser;
use income_predict::core::{ConfigProvider, Pipeline};
use income_predict::utils::error::ErrorSeverity;
use income_predict::utils::{logger, validation::Validate};
use income_predict::{
    EtlEngine, LocalStorage, PredictionClient, PredictionMode, PredictionPipeline, TomlConfig,
};

#[derive(Parser)]
#[command(name = "toml-predict")]
#[command(about = "Income prediction runs driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "predict-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the prediction mode from config
    #[arg(long, value_enum)]
    mode: Option<PredictionMode>,

    /// Override the client index from config
    #[arg(long)]
    client_index: Option<usize>,

    /// Normalize the input and show the payload without calling the service
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    logger::init_logger(args.verbose || config.verbose(), config.json_logs());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(mode) = args.mode {
        config.prediction.mode = mode;
        tracing::info!("🔧 Mode overridden to: {}", mode);
    }
    if let Some(index) = args.client_index {
        config.prediction.client_index = Some(index);
        tracing::info!("🔧 Client index overridden to: {}", index);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if config.mode() == PredictionMode::Info {
        let client = PredictionClient::new(config.api_endpoint(), config.timeout_seconds())?;
        print!("{}", client.service_info().await);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = PredictionPipeline::new(storage, config)?;

    if args.dry_run {
        return perform_dry_run(&pipeline).await;
    }

    match EtlEngine::new(pipeline).run().await {
        Ok(output_path) => {
            println!("✅ Prediction completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Prediction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Service: {}", config.api_endpoint());
    println!("  Mode: {}", config.mode());
    if let Some(index) = config.client_index() {
        println!("  Client index: {}", index);
    }
    println!("  Input: {}", config.input_path());
    println!("  Default policy: {:?}", config.default_policy());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<P: Pipeline>(pipeline: &P) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let rows = pipeline.extract().await.context("Failed to read input")?;
    println!("  Rows read: {}", rows.len());

    let result = pipeline.transform(rows).await.context("Failed to normalize rows")?;
    println!("  Records to send: {}", result.records.len());

    if let (Some(index), Some(record), Some(preview)) = (
        result.client_indices.first(),
        result.records.first(),
        result.preview.first(),
    ) {
        println!();
        println!("📤 Payload for client #{}:", index);
        println!("{}", serde_json::to_string_pretty(record)?);
        println!();
        println!("👀 Display row:");
        println!("{}", serde_json::to_string_pretty(preview)?);
    }

    println!();
    println!("✅ Dry run complete. No requests were sent.");
    Ok(())
}
