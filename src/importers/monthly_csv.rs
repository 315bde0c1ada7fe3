use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::series::{Observation, SeriesError, TimeSeries};

pub const YEAR_COLUMN: &str = "YEAR";
pub const MONTH_COLUMN: &str = "Month";
pub const TEMPERATURE_COLUMN: &str = "Temperature_C";
pub const PRECIPITATION_COLUMN: &str = "Precipitacion";

/// Marker used by the climate tables for a missing observation
pub const MISSING_VALUE_MARKER: f64 = -999.0;

#[derive(Error, Debug)]
pub enum CsvImportError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column in header row: {0}")]
    MissingColumn(String),

    #[error("Invalid data at line {line}: {msg}")]
    InvalidData { line: u64, msg: String },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Loader for monthly climate tables (YEAR, Month, value)
pub struct MonthlyCsvImporter {
    path: String,
    value_column: String,
    missing_marker: Option<f64>,
}

impl MonthlyCsvImporter {
    pub fn new(path: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value_column: value_column.into(),
            missing_marker: None,
        }
    }

    /// Drop rows where any used column equals `marker`
    pub fn with_missing_marker(mut self, marker: f64) -> Self {
        self.missing_marker = Some(marker);
        self
    }

    /// Load the table at the configured path into a named series
    pub fn load(&self, name: &str) -> Result<TimeSeries, CsvImportError> {
        info!("Loading {} series from {}", name, self.path);
        let file = File::open(&self.path).map_err(|source| CsvImportError::Open {
            path: self.path.clone(),
            source,
        })?;
        let series = self.parse_reader(name, file)?;
        info!(
            "Loaded {} {} observations, anchor {}",
            series.len(),
            name,
            series.anchor()
        );
        Ok(series)
    }

    pub fn parse_reader<R: Read>(&self, name: &str, reader: R) -> Result<TimeSeries, CsvImportError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| CsvImportError::MissingColumn(wanted.to_string()))
        };
        let year_idx = column(YEAR_COLUMN)?;
        let month_idx = column(MONTH_COLUMN)?;
        let value_idx = column(self.value_column.as_str())?;

        let mut observations = Vec::new();
        let mut dropped = 0;

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let fields = [year_idx, month_idx, value_idx].map(|idx| self.parse_field(record.get(idx), line));
            let [Some(year), Some(month), Some(value)] = fields else {
                debug!("Line {} has a missing value, dropping", line);
                dropped += 1;
                continue;
            };
            let [year, month, value] = [year?, month?, value?];

            let date = month_start(year, month).ok_or_else(|| CsvImportError::InvalidData {
                line,
                msg: format!("Invalid year/month: {year}/{month}"),
            })?;

            observations.push(Observation { date, value });
        }

        if dropped > 0 {
            warn!("Dropped {} rows with missing values from {} series", dropped, name);
        }

        Ok(TimeSeries::new(name, observations)?)
    }

    /// `None` marks a missing cell; `Some(Err)` an unparseable one
    fn parse_field(&self, raw: Option<&str>, line: u64) -> Option<Result<f64, CsvImportError>> {
        let raw = raw?.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(v) if Some(v) == self.missing_marker || !v.is_finite() => None,
            Ok(v) => Some(Ok(v)),
            Err(_) => Some(Err(CsvImportError::InvalidData {
                line,
                msg: format!("Cannot parse number: {raw}"),
            })),
        }
    }
}

fn month_start(year: f64, month: f64) -> Option<NaiveDate> {
    if year.fract() != 0.0 || month.fract() != 0.0 || !(1.0..=12.0).contains(&month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
}
