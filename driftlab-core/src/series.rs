//! CSV series ingestion.
//!
//! Parses `(date, value)` observations from CSV bytes. The `date` column is
//! an opaque ordering key and is never interpreted; `value` must parse as a
//! float after trimming surrounding whitespace. Extra columns are ignored
//! and row order is preserved exactly.
//!
//! Every error here is fatal: a rejected input produces no observations,
//! so nothing downstream is ever written from bad data.

use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// A single time-series observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub date: String,
    pub value: f64,
}

/// Errors raised while ingesting a series.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input has no header row")]
    MissingHeader,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("input contains a header but no data rows")]
    EmptyInput,

    #[error("row {row}: cannot parse value {text:?} as a number")]
    ValueParse { row: usize, text: String },

    #[error("failed to read CSV input: {0}")]
    Read(#[from] csv::Error),
}

/// Parse a series from CSV bytes.
///
/// Pure: consumes `input` and touches nothing else. The header must contain
/// `date` and `value`, every data row must carry a parseable value, and at
/// least one data row must be present. Row numbers in errors are 1-based
/// and count data rows only.
pub fn parse_series<R: Read>(input: R) -> Result<Vec<Point>, IngestError> {
    let mut reader = csv::Reader::from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(IngestError::MissingHeader);
    }

    let date_idx = headers.iter().position(|h| h == "date");
    let value_idx = headers.iter().position(|h| h == "value");
    let (date_idx, value_idx) = match (date_idx, value_idx) {
        (Some(d), Some(v)) => (d, v),
        (d, v) => {
            let mut missing = Vec::new();
            if d.is_none() {
                missing.push("date".to_string());
            }
            if v.is_none() {
                missing.push("value".to_string());
            }
            return Err(IngestError::MissingColumns(missing));
        }
    };

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let date = record.get(date_idx).unwrap_or("").to_string();
        let raw = record.get(value_idx).unwrap_or("");
        let value: f64 = raw.trim().parse().map_err(|_| IngestError::ValueParse {
            row,
            text: raw.to_string(),
        })?;
        points.push(Point { date, value });
    }

    if points.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    Ok(points)
}
