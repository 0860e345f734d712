use httpmock::prelude::*;
use income_predict::{
    CliConfig, EtlEngine, LocalStorage, PredictError, PredictionMode, PredictionPipeline, TomlConfig,
};
use income_predict::DefaultPolicy;
use std::io::Read;
use tempfile::TempDir;

const CLIENTS_CSV: &str = "\
age,gender,turn_cur_cr_avg_act_v2,hdb_bki_total_products,avg_by_category__amount__sum__cashflowcategory_name__supermarkety,dp_ewb_last_employment_position,client_active_flag,blacklist_flag
35,M,1000,5,2000,manager,1,0
51,F,2500.75,2,,engineer,1,0
";

fn write_input(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("clients.csv");
    std::fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn cli_config(input: String, api_endpoint: String, output_path: String, mode: PredictionMode) -> CliConfig {
    CliConfig {
        input,
        api_endpoint,
        mode,
        client_index: None,
        output_path,
        output_formats: vec!["csv".to_string(), "json".to_string()],
        delimiter: ',',
        default_policy: DefaultPolicy::Falsy,
        timeout_seconds: 5,
        verbose: false,
        json_logs: false,
    }
}

fn zip_entry(path: &std::path::Path, name: &str) -> String {
    let zip_data = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_batch_prediction() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, CLIENTS_CSV);
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/predict/batch");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "predictions": [{"predicted_income": 52000.0}, {"predicted_income": 98500.25}],
                "total_count": 2
            }));
    });

    let config = cli_config(input, server.base_url(), output_path.clone(), PredictionMode::Batch);
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = PredictionPipeline::new(storage, config).unwrap();

    let result = EtlEngine::new(pipeline).run().await;

    api_mock.assert();
    let output_file = result.unwrap();
    assert!(output_file.ends_with("predictions.zip"));

    let archive_path = std::path::Path::new(&output_path).join("predictions.zip");
    assert!(archive_path.exists());

    let csv = zip_entry(&archive_path, "predictions.csv");
    assert_eq!(csv, "client_index,predicted_income\n0,52000.00\n1,98500.25\n");

    let request: serde_json::Value =
        serde_json::from_str(&zip_entry(&archive_path, "request.json")).unwrap();
    let clients = request.as_array().unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0]["spending"]["avg_by_category_supermarket_sum"], 2000);
    // empty cell in the second row falls back to the numeric default
    assert_eq!(clients[1]["spending"]["avg_by_category_supermarket_sum"], 0);
    assert_eq!(clients[1]["employment"]["dp_ewb_last_employment_position"], "engineer");
    assert_eq!(clients[1]["financial"]["turn_cur_cr_avg_act_v2"], 2500.75);
    assert_eq!(clients[1]["additional"]["first_salary_income"], 0);
}

#[tokio::test]
async fn test_end_to_end_single_prediction() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, CLIENTS_CSV);
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/predict")
            .json_body_partial(r#"{"personal": {"age": 51, "gender": "F"}}"#);
        then.status(200).json_body(serde_json::json!({"predicted_income": 75000.5}));
    });

    let mut config = cli_config(input, server.base_url(), output_path.clone(), PredictionMode::Single);
    config.client_index = Some(1);
    let pipeline = PredictionPipeline::new(LocalStorage::new(output_path.clone()), config).unwrap();

    EtlEngine::new(pipeline).run().await.unwrap();

    api_mock.assert();
    let archive_path = std::path::Path::new(&output_path).join("predictions.zip");
    let report: serde_json::Value =
        serde_json::from_str(&zip_entry(&archive_path, "predictions.json")).unwrap();
    assert_eq!(report["mode"], "single");
    assert_eq!(report["predictions"][0]["client_index"], 1);
    assert_eq!(report["predictions"][0]["predicted_income"], 75000.5);
}

#[tokio::test]
async fn test_single_prediction_index_out_of_range_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, CLIENTS_CSV);
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/predict");
        then.status(200).json_body(serde_json::json!({"predicted_income": 1.0}));
    });

    let mut config = cli_config(input, server.base_url(), output_path.clone(), PredictionMode::Single);
    config.client_index = Some(2);
    let pipeline = PredictionPipeline::new(LocalStorage::new(output_path.clone()), config).unwrap();

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, PredictError::ClientIndexError { index: 2, len: 2 }));
    api_mock.assert_hits(0);
    assert!(!std::path::Path::new(&output_path).join("predictions.zip").exists());
}

#[tokio::test]
async fn test_wrong_delimiter_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "age;gender\n35;M\n");
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let config = cli_config(
        input,
        "http://localhost:8000".to_string(),
        output_path.clone(),
        PredictionMode::Batch,
    );
    let pipeline = PredictionPipeline::new(LocalStorage::new(output_path), config).unwrap();

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, PredictError::SingleColumnError { .. }));
    assert!(err.recovery_suggestion().contains("delimiter"));
}

#[tokio::test]
async fn test_toml_config_drives_batch_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, CLIENTS_CSV).replace('\\', "/");
    let output_path = temp_dir.path().join("out").to_str().unwrap().replace('\\', "/");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/predict/batch");
        then.status(200).json_body(serde_json::json!({
            "predictions": [{"predicted_income": 52.0}, {"predicted_income": 52.0}],
            "total_count": 2
        }));
    });

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[service]
endpoint = "{}"
timeout_seconds = 5

[input]
path = "{}"

[prediction]
mode = "batch"
default_policy = "absent"

[output]
path = "{}"
formats = ["json"]
"#,
        server.base_url(),
        input,
        output_path
    ))
    .unwrap();

    let pipeline = PredictionPipeline::new(LocalStorage::new(output_path.clone()), config).unwrap();
    EtlEngine::new(pipeline).run().await.unwrap();

    api_mock.assert();
    let archive_path = std::path::Path::new(&output_path).join("predictions.zip");
    let request: serde_json::Value =
        serde_json::from_str(&zip_entry(&archive_path, "request.json")).unwrap();
    assert_eq!(request[0]["additional"]["blacklist_flag"], 0);
    assert_eq!(request[0]["additional"]["client_active_flag"], 1);

    let zip_data = std::fs::read(&archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert!(archive.by_name("predictions.csv").is_err());
}
