use crate::domain::model::{
    BatchPredictionRequest, BatchPredictionResponse, FeatureList, ModelInfo, PredictionResponse,
    ServiceStatus,
};
use crate::domain::schema::StructuredRecord;
use crate::utils::error::{PredictError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Thin JSON client for the income prediction service.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn predict(&self, record: &StructuredRecord) -> Result<PredictionResponse> {
        let url = self.url("/predict");
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(record).send().await?;
        decode(response).await
    }

    pub async fn predict_batch(&self, records: &[StructuredRecord]) -> Result<BatchPredictionResponse> {
        let url = self.url("/predict/batch");
        tracing::debug!("POST {} with {} clients", url, records.len());
        let body = BatchPredictionRequest { clients: records };
        let response = self.client.post(&url).json(&body).send().await?;
        let batch: BatchPredictionResponse = decode(response).await?;

        if batch.predictions.len() != records.len() {
            return Err(PredictError::PredictionCountMismatch {
                expected: records.len(),
                got: batch.predictions.len(),
            });
        }
        Ok(batch)
    }

    pub async fn root_status(&self) -> Result<ServiceStatus> {
        self.get("/").await
    }

    pub async fn health(&self) -> Result<ServiceStatus> {
        self.get("/health").await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.get("/model/info").await
    }

    pub async fn features(&self) -> Result<FeatureList> {
        self.get("/features").await
    }

    /// Queries the root greeting, health, model metadata and features
    /// independently so one failing endpoint does not hide the others.
    pub async fn service_info(&self) -> ServiceInfo {
        let (root, health, model, features) = tokio::join!(
            self.root_status(),
            self.health(),
            self.model_info(),
            self.features()
        );
        ServiceInfo {
            root,
            health,
            model,
            features,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

#[derive(Debug)]
pub struct ServiceInfo {
    pub root: Result<ServiceStatus>,
    pub health: Result<ServiceStatus>,
    pub model: Result<ModelInfo>,
    pub features: Result<FeatureList>,
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Ok(root) => writeln!(
                f,
                "Service: {}",
                root.message.as_deref().unwrap_or(&root.status)
            )?,
            Err(e) => writeln!(f, "Service: no greeting ({})", e)?,
        }
        match &self.health {
            Ok(status) => writeln!(f, "API: available (status: {})", status.status)?,
            Err(e) => writeln!(f, "API: unavailable ({})", e)?,
        }
        match &self.model {
            Ok(model) => writeln!(
                f,
                "Model: {} v{} [{}], accuracy: {}",
                model.model_name, model.version, model.status, model.accuracy
            )?,
            Err(e) => writeln!(f, "Model: failed to load ({})", e)?,
        }
        match &self.features {
            Ok(features) => {
                writeln!(f, "Features: {}", features.count())?;
                for feature in &features.features {
                    writeln!(f, "  - {}", feature)?;
                }
            }
            Err(e) => writeln!(f, "Features: failed to load ({})", e)?,
        }
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    tracing::debug!("Prediction service response status: {}", status);

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        // prefer the structured error detail when the body is JSON
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or(text);
        tracing::error!("Prediction service error {}: {}", status, detail);
        return Err(PredictError::ApiStatusError {
            status: status.as_u16(),
            detail,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
