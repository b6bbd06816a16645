//! Export item parameters to CSV.
//!
//! One row per item in estimation order, so the file opens cleanly in a
//! spreadsheet next to the original response matrix.

use std::path::Path;

use crate::domain::AnalysisResult;
use crate::error::AppError;

/// Column order of the parameter table.
pub const ITEM_PARAMETER_COLUMNS: [&str; 8] = [
    "item_id",
    "model_type",
    "discrimination",
    "se_discrimination",
    "difficulty",
    "se_difficulty",
    "guessing",
    "se_guessing",
];

/// Write the item parameter table of `result`.
pub fn write_item_parameters_csv(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| AppError::export(path, e))?;

    writer
        .write_record(ITEM_PARAMETER_COLUMNS)
        .map_err(|e| AppError::export(path, e))?;
    for item in &result.item_parameters {
        let numbers = [
            item.discrimination,
            item.se_discrimination,
            item.difficulty,
            item.se_difficulty,
            item.guessing,
            item.se_guessing,
        ]
        .map(|v| format!("{v:.6}"));

        let mut record = vec![item.item_id.clone(), item.model_type.clone()];
        record.extend(numbers);
        writer.write_record(&record).map_err(|e| AppError::export(path, e))?;
    }
    writer.flush().map_err(|e| AppError::export(path, e))?;
    Ok(())
}
