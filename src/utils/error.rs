use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Prediction service returned HTTP {status}: {detail}")]
    ApiStatusError { status: u16, detail: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input file contains no data rows")]
    EmptyInputError,

    #[error("Only one column found in '{header}'; expected the full client feature set")]
    SingleColumnError { header: String },

    #[error("Invalid client index {index}. Valid range: 0-{}", .len.saturating_sub(1))]
    ClientIndexError { index: usize, len: usize },

    #[error("Prediction service returned {got} predictions for {expected} clients")]
    PredictionCountMismatch { expected: usize, got: usize },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PredictError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PredictError::ApiError(_)
            | PredictError::ApiStatusError { .. }
            | PredictError::PredictionCountMismatch { .. } => ErrorCategory::Network,
            PredictError::CsvError(_)
            | PredictError::EmptyInputError
            | PredictError::SingleColumnError { .. }
            | PredictError::ClientIndexError { .. }
            | PredictError::ProcessingError { .. } => ErrorCategory::Input,
            PredictError::ConfigError { .. }
            | PredictError::ConfigValidationError { .. }
            | PredictError::InvalidConfigValueError { .. }
            | PredictError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PredictError::ZipError(_)
            | PredictError::IoError(_)
            | PredictError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 5xx and transport failures are worth retrying by hand
            PredictError::ApiError(_) => ErrorSeverity::Medium,
            PredictError::ApiStatusError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            PredictError::ZipError(_) | PredictError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PredictError::ApiError(_) => {
                "Check that the prediction service is running and reachable at the configured endpoint"
            }
            PredictError::ApiStatusError { .. } => {
                "Inspect the service response detail; the payload may not match the model schema"
            }
            PredictError::CsvError(_) => "Make sure the input is a well-formed CSV file with a header row",
            PredictError::EmptyInputError => "Add at least one client row below the header",
            PredictError::SingleColumnError { .. } => {
                "Check the delimiter (semicolon or tab instead of comma?) and that the file is really CSV"
            }
            PredictError::ClientIndexError { .. } => "Pick a zero-based client index inside the valid range",
            PredictError::ConfigError { .. }
            | PredictError::ConfigValidationError { .. }
            | PredictError::InvalidConfigValueError { .. }
            | PredictError::MissingConfigError { .. } => "Fix the configuration value and run again",
            PredictError::IoError(_) | PredictError::ZipError(_) => {
                "Check file permissions and available disk space"
            }
            PredictError::SerializationError(_) => "The service returned an unexpected JSON shape",
            PredictError::PredictionCountMismatch { .. } => {
                "Check the service logs; every submitted client should get exactly one prediction"
            }
            PredictError::ProcessingError { .. } => "Re-run with --verbose for details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PredictError::ApiError(e) if e.is_timeout() => {
                "Prediction service did not answer in time".to_string()
            }
            PredictError::ApiError(_) => "Prediction service is unavailable".to_string(),
            PredictError::ApiStatusError { status, .. } => {
                format!("Prediction failed (HTTP status {})", status)
            }
            PredictError::CsvError(e) => format!("Could not read CSV file: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
