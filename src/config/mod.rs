pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::ConfigProvider;
    use crate::domain::model::{DefaultPolicy, PredictionMode};
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "income-predict")]
    #[command(about = "Send client CSV rows to the income prediction service")]
    pub struct CliConfig {
        #[arg(short, long, default_value = "clients.csv")]
        pub input: String,

        #[arg(long, default_value = "http://localhost:8000")]
        pub api_endpoint: String,

        #[arg(long, value_enum, default_value_t = PredictionMode::Single)]
        pub mode: PredictionMode,

        #[arg(long, help = "Zero-based row index for single mode")]
        pub client_index: Option<usize>,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "csv,json")]
        pub output_formats: Vec<String>,

        #[arg(long, default_value_t = ',')]
        pub delimiter: char,

        #[arg(long, value_enum, default_value_t = DefaultPolicy::Falsy)]
        pub default_policy: DefaultPolicy,

        #[arg(long, default_value_t = 30)]
        pub timeout_seconds: u64,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl ConfigProvider for CliConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_formats(&self) -> &[String] {
            &self.output_formats
        }

        fn mode(&self) -> PredictionMode {
            self.mode
        }

        fn client_index(&self) -> Option<usize> {
            self.client_index
        }

        fn delimiter(&self) -> u8 {
            // validated as ASCII
            self.delimiter as u8
        }

        fn default_policy(&self) -> DefaultPolicy {
            self.default_policy
        }

        fn timeout_seconds(&self) -> u64 {
            self.timeout_seconds
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_url("api_endpoint", &self.api_endpoint)?;
            validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;

            if self.mode == PredictionMode::Info {
                return Ok(());
            }

            validation::validate_path("input", &self.input)?;
            validation::validate_file_extension("input", &self.input, &["csv", "tsv", "txt"])?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_output_formats("output_formats", &self.output_formats)?;
            validation::validate_delimiter("delimiter", self.delimiter)?;

            if self.mode == PredictionMode::Single {
                validation::validate_required_field("client_index", &self.client_index)?;
            }
            Ok(())
        }
    }

}
