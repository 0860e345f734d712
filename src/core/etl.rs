use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order; returns the output path.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting prediction run...");

        tracing::info!("Reading client rows...");
        let rows = self.pipeline.extract().await?;
        tracing::info!("Loaded {} clients", rows.len());

        tracing::info!("Normalizing records...");
        let transformed = self.pipeline.transform(rows).await?;
        tracing::info!("Normalized {} records", transformed.records.len());
        for (index, preview) in transformed.client_indices.iter().zip(&transformed.preview) {
            tracing::debug!("Client #{} display row: {}", index, serde_json::Value::Object(preview.clone()));
        }

        tracing::info!("Requesting predictions...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
