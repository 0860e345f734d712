pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use crate::core::normalizer::{to_denormalized_flat, to_structured, DefaultPolicy};
pub use crate::core::{client::PredictionClient, etl::EtlEngine, pipeline::PredictionPipeline};
pub use domain::model::{FlatRow, PredictionMode};
pub use domain::schema::StructuredRecord;
pub use utils::error::{PredictError, Result};
