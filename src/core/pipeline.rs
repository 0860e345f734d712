use crate::core::client::PredictionClient;
use crate::core::csv_reader;
use crate::core::normalizer::{denormalize_record, structure_row};
use crate::core::{ConfigProvider, FlatRow, Pipeline, Storage, TransformResult};
use crate::domain::model::{ClientPrediction, PredictionMode, PredictionReport};
use crate::domain::schema::SCHEMA_VERSION;
use crate::utils::error::{PredictError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const ARCHIVE_NAME: &str = "predictions.zip";

pub struct PredictionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: PredictionClient,
}

impl<S: Storage, C: ConfigProvider> PredictionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = PredictionClient::new(config.api_endpoint(), config.timeout_seconds())?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    async fn request_predictions(&self, result: &TransformResult) -> Result<Vec<ClientPrediction>> {
        let incomes: Vec<f64> = match result.mode {
            PredictionMode::Single => {
                let mut incomes = Vec::with_capacity(result.records.len());
                for record in &result.records {
                    incomes.push(self.client.predict(record).await?.predicted_income);
                }
                incomes
            }
            PredictionMode::Batch => self
                .client
                .predict_batch(&result.records)
                .await?
                .predictions
                .into_iter()
                .map(|p| p.predicted_income)
                .collect(),
            PredictionMode::Info => {
                return Err(PredictError::ProcessingError {
                    message: "info mode does not submit predictions".to_string(),
                })
            }
        };

        Ok(result
            .client_indices
            .iter()
            .zip(incomes)
            .map(|(&client_index, predicted_income)| ClientPrediction {
                client_index,
                predicted_income,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PredictionPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<FlatRow>> {
        tracing::debug!("Reading client rows from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        let rows = csv_reader::parse_rows(&data, self.config.delimiter())?;

        if let Some(first) = rows.first() {
            tracing::debug!("First row has {} columns: {:?}", first.len(), first.keys().collect::<Vec<_>>());
        }
        Ok(rows)
    }

    async fn transform(&self, rows: Vec<FlatRow>) -> Result<TransformResult> {
        let mode = self.config.mode();
        let policy = self.config.default_policy();

        let client_indices: Vec<usize> = match mode {
            PredictionMode::Single => {
                let index = self
                    .config
                    .client_index()
                    .ok_or_else(|| PredictError::MissingConfigError {
                        field: "client_index".to_string(),
                    })?;
                if index >= rows.len() {
                    return Err(PredictError::ClientIndexError {
                        index,
                        len: rows.len(),
                    });
                }
                vec![index]
            }
            PredictionMode::Batch => (0..rows.len()).collect(),
            PredictionMode::Info => Vec::new(),
        };

        let records: Vec<_> = client_indices
            .iter()
            .map(|&index| structure_row(&rows[index], policy))
            .collect();
        let preview = records.iter().map(denormalize_record).collect();

        tracing::debug!("Normalized {} of {} rows ({:?} policy)", records.len(), rows.len(), policy);

        Ok(TransformResult {
            mode,
            client_indices,
            records,
            preview,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let predictions = self.request_predictions(&result).await?;
        let output_path = format!("{}/{}", self.config.output_path(), ARCHIVE_NAME);
        let formats = self.config.output_formats();

        let report = PredictionReport {
            mode: result.mode,
            schema_version: SCHEMA_VERSION.to_string(),
            total_count: predictions.len(),
            generated_at: chrono::Utc::now(),
            predictions,
        };

        for prediction in &report.predictions {
            println!(
                "Client #{}: ₽{:.2}",
                prediction.client_index, prediction.predicted_income
            );
        }

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            if formats.iter().any(|f| f == "csv") {
                zip.start_file::<_, ()>("predictions.csv", FileOptions::default())?;
                zip.write_all(predictions_csv(&report)?.as_bytes())?;
            }

            if formats.iter().any(|f| f == "json") {
                zip.start_file::<_, ()>("predictions.json", FileOptions::default())?;
                zip.write_all(serde_json::to_string_pretty(&report)?.as_bytes())?;
            }

            // payload exactly as sent, for replaying against the service
            zip.start_file::<_, ()>("request.json", FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&result.records)?.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(ARCHIVE_NAME, &zip_data).await?;

        Ok(output_path)
    }
}

fn predictions_csv(report: &PredictionReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["client_index", "predicted_income"])?;
    for prediction in &report.predictions {
        writer.write_record([
            prediction.client_index.to_string(),
            format!("{:.2}", prediction.predicted_income),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| PredictError::ProcessingError {
        message: format!("Failed to flush CSV output: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| PredictError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DefaultPolicy;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const CSV: &str = "age,gender,hdb_outstand_sum,dp_ewb_last_employment_position\n\
                       35,M,50000,manager\n\
                       42.6,F,0,\n\
                       28,M,1200.5,analyst\n";

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_input(contents: &str) -> Self {
            let mut files = HashMap::new();
            files.insert("clients.csv".to_string(), contents.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                PredictError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        api_endpoint: String,
        mode: PredictionMode,
        client_index: Option<usize>,
        output_formats: Vec<String>,
        policy: DefaultPolicy,
    }

    impl MockConfig {
        fn new(api_endpoint: String, mode: PredictionMode) -> Self {
            Self {
                api_endpoint,
                mode,
                client_index: None,
                output_formats: vec!["csv".to_string(), "json".to_string()],
                policy: DefaultPolicy::Falsy,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_endpoint(&self) -> &str {
            &self.api_endpoint
        }

        fn input_path(&self) -> &str {
            "clients.csv"
        }

        fn output_path(&self) -> &str {
            "test_output"
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
            b','
        }

        fn default_policy(&self) -> DefaultPolicy {
            self.policy
        }

        fn timeout_seconds(&self) -> u64 {
            5
        }
    }

    fn read_entry(zip_bytes: Vec<u8>, name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut content = String::new();
        std::io::Read::read_to_string(&mut file, &mut content).unwrap();
        Some(content)
    }

    #[tokio::test]
    async fn test_extract_reads_rows_in_order() {
        let config = MockConfig::new("http://localhost:8000".to_string(), PredictionMode::Batch);
        let pipeline = PredictionPipeline::new(MockStorage::with_input(CSV), config).unwrap();

        let rows = pipeline.extract().await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["age"], json!(35));
        assert_eq!(rows[1]["age"], json!(42.6));
        assert_eq!(rows[2]["dp_ewb_last_employment_position"], json!("analyst"));
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let config = MockConfig::new("http://localhost:8000".to_string(), PredictionMode::Batch);
        let storage = MockStorage {
            files: Arc::new(Mutex::new(HashMap::new())),
        };
        let pipeline = PredictionPipeline::new(storage, config).unwrap();

        assert!(matches!(pipeline.extract().await, Err(PredictError::IoError(_))));
    }

    #[tokio::test]
    async fn test_transform_single_selects_index() {
        let mut config = MockConfig::new("http://localhost:8000".to_string(), PredictionMode::Single);
        config.client_index = Some(1);
        let pipeline = PredictionPipeline::new(MockStorage::with_input(CSV), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();

        assert_eq!(result.client_indices, vec![1]);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].personal.age, json!(42.6));
        assert_eq!(result.records[0].credit.hdb_outstand_sum, json!(0));
        assert_eq!(
            result.records[0].employment.dp_ewb_last_employment_position,
            json!("unknown")
        );
        assert_eq!(result.preview[0]["age"], json!(43));
        assert_eq!(result.preview[0]["gender"], json!("M"));
    }

    #[tokio::test]
    async fn test_transform_single_out_of_range() {
        let mut config = MockConfig::new("http://localhost:8000".to_string(), PredictionMode::Single);
        config.client_index = Some(3);
        let pipeline = PredictionPipeline::new(MockStorage::with_input(CSV), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let err = pipeline.transform(rows).await.unwrap_err();

        assert!(matches!(err, PredictError::ClientIndexError { index: 3, len: 3 }));
        assert_eq!(err.to_string(), "Invalid client index 3. Valid range: 0-2");
    }

    #[tokio::test]
    async fn test_transform_batch_with_absent_policy() {
        let mut config = MockConfig::new("http://localhost:8000".to_string(), PredictionMode::Batch);
        config.policy = DefaultPolicy::Absent;
        let pipeline = PredictionPipeline::new(MockStorage::with_input(CSV), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();

        assert_eq!(result.client_indices, vec![0, 1, 2]);
        assert_eq!(result.records.len(), 3);
        // empty cell parses as null, which is absent under either policy
        assert_eq!(
            result.records[1].employment.dp_ewb_last_employment_position,
            json!("unknown")
        );
        assert_eq!(result.records[2].credit.hdb_outstand_sum, json!(1200.5));
    }

    #[tokio::test]
    async fn test_load_single_writes_bundle() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/predict");
            then.status(200).json_body(json!({"predicted_income": 75000.5}));
        });

        let mut config = MockConfig::new(server.base_url(), PredictionMode::Single);
        config.client_index = Some(2);
        let storage = MockStorage::with_input(CSV);
        let pipeline = PredictionPipeline::new(storage.clone(), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        api_mock.assert();
        assert_eq!(output_path, "test_output/predictions.zip");

        let zip_bytes = storage.get_file(ARCHIVE_NAME).await.unwrap();
        let csv = read_entry(zip_bytes.clone(), "predictions.csv").unwrap();
        assert_eq!(csv, "client_index,predicted_income\n2,75000.50\n");

        let report: serde_json::Value =
            serde_json::from_str(&read_entry(zip_bytes.clone(), "predictions.json").unwrap()).unwrap();
        assert_eq!(report["mode"], json!("single"));
        assert_eq!(report["total_count"], json!(1));

        let request: serde_json::Value =
            serde_json::from_str(&read_entry(zip_bytes, "request.json").unwrap()).unwrap();
        assert_eq!(request[0]["personal"]["age"], json!(28));
    }

    #[tokio::test]
    async fn test_load_batch_respects_output_formats() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/predict/batch");
            then.status(200).json_body(json!({
                "predictions": [
                    {"predicted_income": 52.0},
                    {"predicted_income": 52.0},
                    {"predicted_income": 52.0}
                ],
                "total_count": 3
            }));
        });

        let mut config = MockConfig::new(server.base_url(), PredictionMode::Batch);
        config.output_formats = vec!["json".to_string()];
        let storage = MockStorage::with_input(CSV);
        let pipeline = PredictionPipeline::new(storage.clone(), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();
        pipeline.load(result).await.unwrap();

        api_mock.assert();
        let zip_bytes = storage.get_file(ARCHIVE_NAME).await.unwrap();
        assert!(read_entry(zip_bytes.clone(), "predictions.csv").is_none());

        let report: PredictionReport =
            serde_json::from_str(&read_entry(zip_bytes, "predictions.json").unwrap()).unwrap();
        assert_eq!(report.mode, PredictionMode::Batch);
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        let indices: Vec<usize> = report.predictions.iter().map(|p| p.client_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_load_propagates_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/predict/batch");
            then.status(500).json_body(json!({"detail": "model not loaded"}));
        });

        let config = MockConfig::new(server.base_url(), PredictionMode::Batch);
        let storage = MockStorage::with_input(CSV);
        let pipeline = PredictionPipeline::new(storage.clone(), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();
        let err = pipeline.load(result).await.unwrap_err();

        assert!(matches!(err, PredictError::ApiStatusError { status: 500, .. }));
        assert!(storage.get_file(ARCHIVE_NAME).await.is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_short_batch_response() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/predict/batch");
            then.status(200).json_body(json!({
                "predictions": [{"predicted_income": 10.0}],
                "total_count": 1
            }));
        });

        let config = MockConfig::new(server.base_url(), PredictionMode::Batch);
        let storage = MockStorage::with_input(CSV);
        let pipeline = PredictionPipeline::new(storage.clone(), config).unwrap();

        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();
        let err = pipeline.load(result).await.unwrap_err();

        api_mock.assert();
        assert!(matches!(
            err,
            PredictError::PredictionCountMismatch { expected: 3, got: 1 }
        ));
        assert!(storage.get_file(ARCHIVE_NAME).await.is_none());
    }
}
