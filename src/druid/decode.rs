//! Decoding of the SQL endpoint's object-per-row JSON array.
//!
//! Druid answers `[{"type": "...", "<status column>": "...", "total": N}, ...]`.
//! The status column is chosen at configuration time, so rows are read as
//! generic JSON objects and picked apart by column name instead of through a
//! fixed serde struct.

use serde_json::{Map, Value};

use crate::types::TaskCountRecord;

/// Column holding the task kind.
pub const TYPE_COLUMN: &str = "type";
/// Column holding the aggregated count.
pub const TOTAL_COLUMN: &str = "total";

/// The response body did not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not a JSON array of row objects: {0}")]
    Json(#[from] serde_json::Error),
    #[error("row {row} has no '{column}' column")]
    MissingColumn { row: usize, column: String },
    #[error("row {row} column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },
}

/// Decode a full response body into records, preserving upstream order.
///
/// Any malformed row fails the whole body; no partial result is returned.
pub fn decode_rows(body: &[u8], status_column: &str) -> Result<Vec<TaskCountRecord>, DecodeError> {
    let rows: Vec<Map<String, Value>> = serde_json::from_slice(body)?;
    rows.iter()
        .enumerate()
        .map(|(idx, row)| decode_row(idx, row, status_column))
        .collect()
}

fn decode_row(
    row: usize,
    fields: &Map<String, Value>,
    status_column: &str,
) -> Result<TaskCountRecord, DecodeError> {
    let task_type = string_column(row, fields, TYPE_COLUMN)?;
    let status = string_column(row, fields, status_column)?;
    let total = count_column(row, fields, TOTAL_COLUMN)?;
    Ok(TaskCountRecord {
        task_type,
        status,
        total,
    })
}

fn column<'a>(row: usize, fields: &'a Map<String, Value>, name: &str) -> Result<&'a Value, DecodeError> {
    fields.get(name).ok_or_else(|| DecodeError::MissingColumn {
        row,
        column: name.to_string(),
    })
}

fn string_column(row: usize, fields: &Map<String, Value>, name: &str) -> Result<String, DecodeError> {
    match column(row, fields, name)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(DecodeError::InvalidValue {
            row,
            column: name.to_string(),
            reason: format!("expected a string, got {}", json_kind(other)),
        }),
    }
}

fn count_column(row: usize, fields: &Map<String, Value>, name: &str) -> Result<u64, DecodeError> {
    let value = column(row, fields, name)?;
    value.as_u64().ok_or_else(|| DecodeError::InvalidValue {
        row,
        column: name.to_string(),
        reason: format!("expected a non-negative integer, got {value}"),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
