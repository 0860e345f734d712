use crate::domain::schema::StructuredRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One parsed CSV row: header name to scalar cell value.
pub type FlatRow = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PredictionMode {
    /// One client picked by zero-based row index.
    Single,
    /// Every row in the file, sent as one request.
    Batch,
    /// Service health, model metadata and feature list.
    Info,
}

impl std::fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PredictionMode::Single => "single",
            PredictionMode::Batch => "batch",
            PredictionMode::Info => "info",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub mode: PredictionMode,
    /// Source row index of each entry in `records`.
    pub client_indices: Vec<usize>,
    pub records: Vec<StructuredRecord>,
    /// Display form of `records`, see `normalizer::to_denormalized_flat`.
    pub preview: Vec<FlatRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_income: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPredictionRequest<'a> {
    pub clients: &'a [StructuredRecord],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<PredictionResponse>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub version: String,
    pub status: String,
    pub accuracy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureList {
    pub features: Vec<String>,
    #[serde(default)]
    pub total_features: Option<usize>,
    #[serde(default)]
    pub version: Option<String>,
}

impl FeatureList {
    pub fn count(&self) -> usize {
        self.total_features.unwrap_or(self.features.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPrediction {
    pub client_index: usize,
    pub predicted_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub mode: PredictionMode,
    pub schema_version: String,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
    pub predictions: Vec<ClientPrediction>,
}

/// When a flat row value counts as missing and gets the schema default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    /// Null, `false`, zero and `""` are all replaced.
    #[default]
    Falsy,
    /// Only a missing key or null is replaced.
    Absent,
}
