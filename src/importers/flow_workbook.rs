use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::series::{Observation, SeriesError, TimeSeries};

/// Header of the date column in the flow workbook
pub const DATE_COLUMN: &str = "Fecha";

/// Sub-station columns summed into the composite catchment flow
pub const STATION_COLUMNS: [&str; 3] = ["valor_H34", "valor_H36", "valor_H13"];

/// Lower bound applied to the natural log of the summed flow
pub const FLOW_FLOOR: f64 = 1.0;

#[derive(Error, Debug)]
pub enum WorkbookImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Missing column in header row: {0}")]
    MissingColumn(String),

    #[error("Invalid data at row {row}, col {col}: {msg}")]
    InvalidData { row: usize, col: usize, msg: String },

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Natural log of a composite flow, clamped from below at `FLOW_FLOOR`.
///
/// Zero or negative totals (undefined log) clamp to the floor as well.
pub fn log_flow(total: f64) -> f64 {
    let log = total.ln();
    if log.is_nan() {
        return FLOW_FLOOR;
    }
    log.max(FLOW_FLOOR)
}

/// Loader for the composite flow workbook.
///
/// # Expected Sheet Structure:
/// ```text
/// Row 1: Header (Fecha | valor_H34 | valor_H36 | valor_H13 | ...)
/// Row 2+: One observation per row (date | station readings)
/// ```
/// Column order does not matter; columns are located by header name.
pub struct FlowWorkbookImporter {
    workbook_path: String,
    sheet: Option<String>,
}

impl FlowWorkbookImporter {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet: None,
        }
    }

    /// Read a named sheet instead of the first one
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    /// Load the log-transformed composite flow series.
    ///
    /// This is synchronous file IO; async callers should use spawn_blocking.
    pub fn load_log_series(&self) -> Result<TimeSeries, WorkbookImportError> {
        info!("Loading flow workbook: {}", self.workbook_path);

        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(WorkbookImportError::WorkbookOpen(e.to_string())),
        };

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(WorkbookImportError::NoSheets)?,
        };

        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(_) => return Err(WorkbookImportError::SheetNotFound(sheet_name)),
        };

        let series = parse_flow_range(&range)?;
        info!(
            "Loaded {} flow observations from sheet {}, anchor {}",
            series.len(),
            sheet_name,
            series.anchor()
        );
        Ok(series)
    }
}

/// Turn a worksheet range into the log flow series.
///
/// Rows without a date or with any missing station reading are skipped.
pub fn parse_flow_range(range: &Range<Data>) -> Result<TimeSeries, WorkbookImportError> {
    let date_col = find_column(range, DATE_COLUMN)?;
    let station_cols = STATION_COLUMNS
        .iter()
        .map(|name| find_column(range, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut observations = Vec::new();
    let mut skipped_rows = 0;

    for row_idx in 1..range.height() {
        let date = match parse_date(range, row_idx, date_col)? {
            Some(d) => d,
            None => {
                debug!("Row {} has no date, skipping", row_idx);
                skipped_rows += 1;
                continue;
            }
        };

        let mut total = 0.0;
        let mut complete = true;
        for &col in &station_cols {
            match parse_reading(range, row_idx, col)? {
                Some(value) => total += value,
                None => {
                    complete = false;
                    break;
                }
            }
        }

        if !complete {
            debug!("Row {} ({}) has a missing station reading, skipping", row_idx, date);
            skipped_rows += 1;
            continue;
        }

        observations.push(Observation {
            date,
            value: log_flow(total),
        });
    }

    if skipped_rows > 0 {
        warn!("Skipped {} incomplete flow rows", skipped_rows);
    }

    Ok(TimeSeries::new("caudal", observations)?)
}

fn find_column(range: &Range<Data>, name: &str) -> Result<usize, WorkbookImportError> {
    (0..range.width())
        .find(|&col| matches!(range.get((0, col)), Some(Data::String(s)) if s.trim() == name))
        .ok_or_else(|| WorkbookImportError::MissingColumn(name.to_string()))
}

/// Parse a date cell (ISO text, Excel datetime, or Excel date serial)
fn parse_date(
    range: &Range<Data>,
    row: usize,
    col: usize,
) -> Result<Option<NaiveDate>, WorkbookImportError> {
    match range.get((row, col)) {
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
                })
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date())
                })
                .map(Some)
                .map_err(|_| WorkbookImportError::InvalidDate(s.clone()))
        }
        Some(Data::DateTime(excel_date)) => Ok(excel_date.as_datetime().map(|dt| dt.date())),
        Some(Data::Float(f)) => Ok(Some(excel_serial_date(*f as i64))),
        Some(Data::Int(i)) => Ok(Some(excel_serial_date(*i))),
        Some(Data::Empty) | None => Ok(None),
        other => Err(WorkbookImportError::InvalidData {
            row,
            col,
            msg: format!("Expected date, got: {other:?}"),
        }),
    }
}

fn excel_serial_date(days: i64) -> NaiveDate {
    let base_date = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    base_date + chrono::Duration::days(days)
}

/// Parse a station reading; empty cells count as missing
fn parse_reading(
    range: &Range<Data>,
    row: usize,
    col: usize,
) -> Result<Option<f64>, WorkbookImportError> {
    match range.get((row, col)) {
        Some(Data::Float(f)) if f.is_finite() => Ok(Some(*f)),
        Some(Data::Float(_)) => Ok(None),
        Some(Data::Int(i)) => Ok(Some(*i as f64)),
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                Ok(None)
            } else {
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| WorkbookImportError::InvalidData {
                        row,
                        col,
                        msg: format!("Cannot parse flow value: {s}"),
                    })
            }
        }
        Some(Data::Empty) | None => Ok(None),
        other => Err(WorkbookImportError::InvalidData {
            row,
            col,
            msg: format!("Expected number, got: {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[Vec<Data>]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn header() -> Vec<Data> {
        vec![
            Data::String("Fecha".to_string()),
            Data::String("valor_H34".to_string()),
            Data::String("valor_H36".to_string()),
            Data::String("valor_H13".to_string()),
        ]
    }

    #[test]
    fn test_log_flow_clamps_below_floor() {
        assert_eq!(log_flow(2.0), 1.0);
        assert_eq!(log_flow(0.3), 1.0);
        assert_eq!(log_flow(0.0), 1.0);
        assert_eq!(log_flow(-2.0), 1.0);
        assert!((log_flow(10.0) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_parse_sums_stations_and_logs() {
        let range = sheet(&[
            header(),
            vec![
                Data::String("2024-12-01".to_string()),
                Data::Float(2.0),
                Data::Float(3.0),
                Data::Int(5),
            ],
            vec![
                Data::String("2025-01-01".to_string()),
                Data::Float(4.0),
                Data::Float(4.0),
                Data::Float(2.0),
            ],
        ]);

        let series = parse_flow_range(&range).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.anchor(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!((series.last_value() - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let range = sheet(&[
            header(),
            vec![
                Data::String("2024-11-01".to_string()),
                Data::Float(2.0),
                Data::Float(3.0),
                Data::Float(5.0),
            ],
            vec![
                Data::String("2024-12-01".to_string()),
                Data::Float(2.0),
                Data::Empty,
                Data::Float(5.0),
            ],
            vec![Data::Empty, Data::Float(1.0), Data::Float(1.0), Data::Float(1.0)],
        ]);

        let series = parse_flow_range(&range).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.anchor(), NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
    }

    #[test]
    fn test_low_composite_flow_clamps_log_to_floor() {
        let range = sheet(&[
            header(),
            vec![
                Data::String("2025-01-01".to_string()),
                Data::Float(0.5),
                Data::Float(1.0),
                Data::Float(0.5),
            ],
        ]);

        let series = parse_flow_range(&range).unwrap();
        assert_eq!(series.last_value(), 1.0);
    }

    #[test]
    fn test_excel_serial_dates() {
        let range = sheet(&[
            header(),
            // 45658 = 2025-01-01
            vec![Data::Int(45658), Data::Float(1.0), Data::Float(1.0), Data::Float(1.0)],
        ]);

        let series = parse_flow_range(&range).unwrap();
        assert_eq!(series.anchor(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_missing_station_column() {
        let range = sheet(&[vec![
            Data::String("Fecha".to_string()),
            Data::String("valor_H34".to_string()),
        ]]);

        match parse_flow_range(&range) {
            Err(WorkbookImportError::MissingColumn(name)) => assert_eq!(name, "valor_H36"),
            other => panic!("Expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_value_is_an_error() {
        let range = sheet(&[
            header(),
            vec![
                Data::String("2025-01-01".to_string()),
                Data::String("abc".to_string()),
                Data::Float(1.0),
                Data::Float(1.0),
            ],
        ]);

        assert!(matches!(
            parse_flow_range(&range),
            Err(WorkbookImportError::InvalidData { row: 1, col: 1, .. })
        ));
    }

    #[test]
    fn test_missing_workbook() {
        let importer = FlowWorkbookImporter::new("does-not-exist.xlsx");
        assert!(matches!(
            importer.load_log_series(),
            Err(WorkbookImportError::WorkbookOpen(_))
        ));
    }
}
