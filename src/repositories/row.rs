use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Extracts a required string field from a row.
pub(crate) fn str_field(row: &Value, field: &str) -> Result<String> {
    row.get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::MissingData(field.to_string()))
}

/// Extracts an optional string field from a row.
pub(crate) fn opt_str_field(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(|v| v.as_str()).map(str::to_string)
}

/// Extracts a required UUID field from a row.
pub(crate) fn uuid_field(row: &Value, field: &str) -> Result<Uuid> {
    row.get(field)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| AppError::MissingData(field.to_string()))
}

/// Extracts a required small integer field from a row.
pub(crate) fn u8_field(row: &Value, field: &str) -> Result<u8> {
    row.get(field)
        .and_then(|v| v.as_u64())
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| AppError::MissingData(field.to_string()))
}

/// Extracts an optional small integer field from a row.
pub(crate) fn opt_u8_field(row: &Value, field: &str) -> Option<u8> {
    row.get(field)
        .and_then(|v| v.as_u64())
        .and_then(|n| u8::try_from(n).ok())
}

/// Extracts a required `YYYY-MM-DD` date field from a row.
pub(crate) fn date_field(row: &Value, field: &str) -> Result<NaiveDate> {
    row.get(field)
        .and_then(|v| v.as_str())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .ok_or_else(|| AppError::MissingData(field.to_string()))
}
