//! Training dataset ingestion
//!
//! Reads the historical CSV once, derives hour/day/month from the
//! timestamp column, and hands the trainer a feature table plus the raw
//! target labels. A missing or unparseable timestamp or target is fatal
//! here, before any artifact is written.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use ndarray::Array2;
use thiserror::Error;

/// Derived calendar columns, appended after the dataset's own feature
/// columns in the order the timestamp expansion produces them.
pub const CALENDAR_COLUMNS: &[&str] = &["hour", "day", "month"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
    #[error("row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
    #[error("row {row}: cannot parse '{value}' in column '{column}' as a number")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: target label is empty")]
    EmptyLabel { row: usize },
    #[error("dataset {path} has no rows")]
    Empty { path: PathBuf },
}

/// One parsed training dataset: all records live here exactly once and
/// are discarded after fitting.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature column headers: dataset order, calendar columns appended.
    pub columns: Vec<String>,
    /// Row-major feature values, width == `columns.len()`.
    pub features: Array2<f32>,
    /// Raw target labels, one per row.
    pub labels: Vec<String>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.features.ncols()
    }
}

/// Read a CSV with one header row into a [`Dataset`].
///
/// Every column other than `timestamp_column` and `target_column` is a
/// feature and must parse as a number in every row.
pub fn load_csv(
    path: &Path,
    timestamp_column: &str,
    target_column: &str,
) -> Result<Dataset, DatasetError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let column_index = |name: &str| -> Result<usize, DatasetError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let ts_idx = column_index(timestamp_column)?;
    let target_idx = column_index(target_column)?;

    let feature_headers: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_idx && *i != target_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut values: Vec<f32> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut n_rows = 0usize;

    for (row_num, record) in reader.records().enumerate() {
        // Header is line 1; data rows are reported 1-based after it.
        let row = row_num + 2;
        let record = record.map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for (idx, name) in &feature_headers {
            let raw = record.get(*idx).unwrap_or("").trim();
            let parsed: f32 = raw.parse().map_err(|_| DatasetError::BadNumber {
                row,
                column: name.clone(),
                value: raw.to_string(),
            })?;
            values.push(parsed);
        }

        let raw_ts = record.get(ts_idx).unwrap_or("").trim();
        let (hour, day, month) =
            parse_timestamp(raw_ts).ok_or_else(|| DatasetError::BadTimestamp {
                row,
                value: raw_ts.to_string(),
            })?;
        values.extend([hour as f32, day as f32, month as f32]);

        let label = record.get(target_idx).unwrap_or("").trim();
        if label.is_empty() {
            return Err(DatasetError::EmptyLabel { row });
        }
        labels.push(label.to_string());

        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    let mut columns: Vec<String> = feature_headers.into_iter().map(|(_, h)| h).collect();
    columns.extend(CALENDAR_COLUMNS.iter().map(|c| c.to_string()));

    let width = columns.len();
    let features = Array2::from_shape_vec((n_rows, width), values)
        .expect("row width is fixed by the header");

    Ok(Dataset {
        columns,
        features,
        labels,
    })
}

/// Calendar components of a timestamp cell. Accepts RFC 3339 and the
/// plain `YYYY-MM-DD HH:MM:SS` form common in exported sensor logs.
fn parse_timestamp(raw: &str) -> Option<(u32, u32, u32)> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let naive = dt.naive_utc();
        return Some((naive.hour(), naive.day(), naive.month()));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some((naive.hour(), naive.day(), naive.month()));
        }
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================
