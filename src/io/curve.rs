//! Write rendered payload JSON files.
//!
//! Payloads are written exactly as a caller would receive them (success,
//! processing or error shape), pretty-printed.

use std::fs::File;
use std::path::Path;

use serde_json::Value;

use crate::error::AppError;

/// Write a payload as pretty JSON.
pub fn write_payload_json(path: &Path, payload: &Value) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::export(path, e))?;
    serde_json::to_writer_pretty(file, payload).map_err(|e| AppError::export(path, e))?;
    Ok(())
}
