// Tests for loading series and model artifacts from disk
// Uses tempfile for fixture files

mod common;

use chrono::NaiveDate;
use hydro_forecast_service::config::Config;
use hydro_forecast_service::context::{AppContext, LoadError};
use hydro_forecast_service::forecast::{
    ForecastEstimate, LevelAdapter, ModelError, SarimaModel, TargetMonth,
};
use hydro_forecast_service::importers::monthly_csv::{
    MISSING_VALUE_MARKER, PRECIPITATION_COLUMN, TEMPERATURE_COLUMN,
};
use hydro_forecast_service::importers::{CsvImportError, MonthlyCsvImporter};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config_with(flow: &str, temperature: &str, precipitation: &str, model: &str) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        flow_data_path: flow.to_string(),
        flow_sheet: None,
        temperature_data_path: temperature.to_string(),
        precipitation_data_path: precipitation.to_string(),
        flow_model_path: model.to_string(),
        temperature_model_path: model.to_string(),
        precipitation_model_path: model.to_string(),
        narrative: common::narrative_config("http://127.0.0.1:1"),
    }
}

#[test]
fn test_temperature_csv_skips_missing_marker() {
    let file = write_temp(
        "YEAR,Month,Temperature_C\n\
         2024,10,8.5\n\
         2024,11,-999\n\
         2024,12,9.25\n",
    );

    let series = MonthlyCsvImporter::new(file.path().to_str().unwrap(), TEMPERATURE_COLUMN)
        .with_missing_marker(MISSING_VALUE_MARKER)
        .load("temperatura")
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series.anchor(), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
    assert_eq!(series.last_value(), 9.25);
}

#[test]
fn test_precipitation_csv_out_of_order_rows() {
    let file = write_temp(
        "YEAR,Month,Precipitacion\n\
         2025,1,120.0\n\
         2024,12,95.5\n",
    );

    let series = MonthlyCsvImporter::new(file.path().to_str().unwrap(), PRECIPITATION_COLUMN)
        .load("precipitacion")
        .unwrap();

    assert_eq!(series.anchor(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(series.last_value(), 120.0);
}

#[test]
fn test_missing_csv_file_reports_path() {
    let result = MonthlyCsvImporter::new("/nonexistent/temperatura.csv", TEMPERATURE_COLUMN)
        .load("temperatura");

    match result {
        Err(CsvImportError::Open { path, .. }) => assert_eq!(path, "/nonexistent/temperatura.csv"),
        other => panic!("Expected Open error, got {other:?}"),
    }
}

#[test]
fn test_model_artifact_drives_level_adapter() {
    // AR(1) around a constant mean: y_t = 2 + 0.5 y_{t-1}
    let artifact = write_temp(r#"{"intercept": 2.0, "ar": [0.5], "history": [6.0]}"#);
    let csv = write_temp("YEAR,Month,Temperature_C\n2025,1,9.0\n2025,2,10.0\n");

    let model = SarimaModel::from_path(artifact.path()).unwrap();
    let series = MonthlyCsvImporter::new(csv.path().to_str().unwrap(), TEMPERATURE_COLUMN)
        .load("temperatura")
        .unwrap();
    let adapter = LevelAdapter::temperature(&series, &model);

    // Two steps after the 2025-02 anchor: 2 + 0.5 * 6 = 5, then 2 + 0.5 * 5 = 4.5
    let estimate = adapter.estimate(TargetMonth::parse("2025-04").unwrap()).unwrap();
    assert_eq!(estimate, ForecastEstimate::Value(4.5));

    let estimate = adapter.estimate(TargetMonth::parse("2026-03").unwrap()).unwrap();
    assert_eq!(estimate, ForecastEstimate::Unavailable);
}

#[test]
fn test_malformed_model_artifact() {
    let artifact = write_temp("not a model");

    let result = SarimaModel::from_path(artifact.path());

    assert!(matches!(result, Err(ModelError::Parse { .. })));
}

#[test]
fn test_context_load_fails_on_missing_workbook() {
    let csv = write_temp("YEAR,Month,Temperature_C,Precipitacion\n2025,1,9.0,100.0\n");
    let artifact = write_temp(r#"{"history": [1.0]}"#);
    let csv_path = csv.path().to_str().unwrap();
    let config = config_with(
        "/nonexistent/caudales.xlsx",
        csv_path,
        csv_path,
        artifact.path().to_str().unwrap(),
    );

    let result = AppContext::load(&config);

    assert!(matches!(result, Err(LoadError::Workbook(_))));
}
