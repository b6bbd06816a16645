//! Response-matrix CSV ingest and cleaning.
//!
//! Input: one row per respondent, one column per item, an optional leading
//! identifier column. Cells hold scored responses (usually 0/1); blank,
//! `NA`, `NaN` and `.` are treated as missing.
//!
//! Output: a `respondents × items` `DMatrix` with `NaN` marking missing
//! responses.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::pipeline::PipelineError;

/// Substrings that mark a leading column as respondent identifiers.
const IDENTIFIER_HINTS: [&str; 4] = ["id", "student", "person", "subject"];

/// Cell tokens read as a missing response.
const MISSING_TOKENS: [&str; 4] = ["", "na", "nan", "."];

/// Parsed responses with item names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMatrix {
    pub items: Vec<String>,
    /// `n_respondents × n_items`; `NaN` is a missing response.
    pub responses: DMatrix<f64>,
    /// Name of the identifier column that was excluded, if any.
    pub identifier: Option<String>,
}

impl ResponseMatrix {
    pub fn n_respondents(&self) -> usize {
        self.responses.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.responses.ncols()
    }

    /// Keep only the columns at `keep` (in that order).
    pub fn select_columns(&self, keep: &[usize]) -> ResponseMatrix {
        ResponseMatrix {
            items: keep.iter().map(|&j| self.items[j].clone()).collect(),
            responses: self.responses.select_columns(keep.iter()),
            identifier: self.identifier.clone(),
        }
    }
}

/// Whether a column header names respondent identifiers (best effort).
pub fn is_identifier_column(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IDENTIFIER_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Load a response matrix, excluding a leading identifier column.
pub fn load_responses(path: &Path) -> Result<ResponseMatrix, PipelineError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
        _ => PipelineError::Read(format!("failed to open '{}': {e}", path.display())),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Read(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let identifier = headers.first().filter(|name| is_identifier_column(name)).cloned();
    let first_item = usize::from(identifier.is_some());
    let items: Vec<String> = headers[first_item.min(headers.len())..].to_vec();
    if items.is_empty() {
        return Err(PipelineError::EmptyUpload);
    }

    let mut values: Vec<f64> = Vec::new();
    let mut n_rows = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| PipelineError::Read(format!("CSV parse error at line {line}: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        parse_row(&record, line, first_item, &items, &mut values)?;
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(PipelineError::EmptyUpload);
    }

    info!(
        path = %path.display(),
        respondents = n_rows,
        items = items.len(),
        identifier = identifier.as_deref().unwrap_or("-"),
        "loaded response matrix"
    );

    Ok(ResponseMatrix {
        responses: DMatrix::from_row_slice(n_rows, items.len(), &values),
        items,
        identifier,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_row(
    record: &StringRecord,
    line: usize,
    first_item: usize,
    items: &[String],
    out: &mut Vec<f64>,
) -> Result<(), PipelineError> {
    for (j, item) in items.iter().enumerate() {
        let raw = record.get(first_item + j).unwrap_or("");
        out.push(parse_cell(raw).ok_or_else(|| PipelineError::InvalidCell {
            line,
            column: item.clone(),
            value: raw.to_string(),
        })?);
    }
    Ok(())
}

/// `Some(NaN)` for missing tokens, `Some(v)` for finite numbers, `None` otherwise.
fn parse_cell(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if MISSING_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sample variance of each item over observed responses.
///
/// `None` for items with fewer than two observations.
pub fn item_variances(responses: &DMatrix<f64>) -> Vec<Option<f64>> {
    responses
        .column_iter()
        .map(|col| {
            let observed: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
            if observed.len() < 2 {
                return None;
            }
            let n = observed.len() as f64;
            let mean = observed.iter().sum::<f64>() / n;
            let ss: f64 = observed.iter().map(|v| (v - mean) * (v - mean)).sum();
            Some(ss / (n - 1.0))
        })
        .collect()
}

/// Drop items whose observed responses never vary.
///
/// Returns the cleaned matrix and the names of the dropped items.
pub fn drop_invariant_items(matrix: &ResponseMatrix) -> (ResponseMatrix, Vec<String>) {
    let variances = item_variances(&matrix.responses);
    let (keep, dropped): (Vec<usize>, Vec<usize>) =
        (0..matrix.n_items()).partition(|&j| variances[j] != Some(0.0));

    let dropped: Vec<String> = dropped.into_iter().map(|j| matrix.items[j].clone()).collect();
    if !dropped.is_empty() {
        warn!(items = ?dropped, "removing invariant items");
    }
    (matrix.select_columns(&keep), dropped)
}

/// Mean over items of each item's mean observed response.
///
/// Items without any observation are left out; an empty matrix rates 0.
pub fn response_rate(responses: &DMatrix<f64>) -> f64 {
    let means: Vec<f64> = responses
        .column_iter()
        .filter_map(|col| {
            let observed: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
            (!observed.is_empty()).then(|| observed.iter().sum::<f64>() / observed.len() as f64)
        })
        .collect();

    if means.is_empty() {
        0.0
    } else {
        means.iter().sum::<f64>() / means.len() as f64
    }
}

/// Write the cleaned matrix (items only, missing cells blank).
pub fn write_cleaned(matrix: &ResponseMatrix, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PipelineError::Write(format!("'{}': {e}", path.display())))?;
    let csv_err = |e: csv::Error| PipelineError::Write(format!("'{}': {e}", path.display()));

    writer.write_record(&matrix.items).map_err(csv_err)?;
    for row in matrix.responses.row_iter() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| if v.is_nan() { String::new() } else { v.to_string() })
            .collect();
        writer.write_record(&cells).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn detects_identifier_column() {
        assert!(is_identifier_column("student_id"));
        assert!(is_identifier_column("Person"));
        assert!(is_identifier_column("SubjectNo"));
        assert!(!is_identifier_column("Q1"));
        assert!(!is_identifier_column("item_3"));
    }

    #[test]
    fn loads_matrix_without_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "r.csv",
            "\u{feff}student_id,Q1,Q2,Q3\ns1,1,0,1\ns2,0,NA,1\ns3,1,1,\n",
        );
        let m = load_responses(&path).unwrap();
        assert_eq!(m.identifier.as_deref(), Some("student_id"));
        assert_eq!(m.items, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(m.n_respondents(), 3);
        assert_eq!(m.responses[(0, 0)], 1.0);
        assert!(m.responses[(1, 1)].is_nan());
        assert!(m.responses[(2, 2)].is_nan());
    }

    #[test]
    fn all_columns_are_items_without_identifier_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "r.csv", "Q1,Q2\n1,0\n0,1\n");
        let m = load_responses(&path).unwrap();
        assert_eq!(m.identifier, None);
        assert_eq!(m.n_items(), 2);
    }

    #[test]
    fn rejects_non_numeric_cells_and_empty_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_csv(&dir, "bad.csv", "id,Q1,Q2\na,1,yes\n");
        match load_responses(&bad) {
            Err(PipelineError::InvalidCell { line, column, value }) => {
                assert_eq!((line, column.as_str(), value.as_str()), (2, "Q2", "yes"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let empty = write_csv(&dir, "empty.csv", "id,Q1,Q2\n");
        assert!(matches!(load_responses(&empty), Err(PipelineError::EmptyUpload)));

        let missing = dir.path().join("nope.csv");
        assert!(matches!(load_responses(&missing), Err(PipelineError::FileNotFound(_))));
    }

    #[test]
    fn drops_only_zero_variance_items() {
        let matrix = ResponseMatrix {
            items: vec!["Q1".into(), "Q2".into(), "Q3".into(), "Q4".into()],
            responses: DMatrix::from_row_slice(3, 4, &[
                1.0, 1.0, 0.0, f64::NAN,
                0.0, 1.0, 1.0, f64::NAN,
                1.0, 1.0, 0.0, 1.0,
            ]),
            identifier: None,
        };
        let (clean, dropped) = drop_invariant_items(&matrix);
        assert_eq!(dropped, vec!["Q2"]);
        // Q4 has a single observation: variance undefined, item kept.
        assert_eq!(clean.items, vec!["Q1", "Q3", "Q4"]);
        assert_eq!(clean.responses.ncols(), 3);
    }

    #[test]
    fn response_rate_averages_item_means() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, f64::NAN]);
        // Item means: 1.0 and 0.0.
        assert!((response_rate(&m) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cleaned_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ResponseMatrix {
            items: vec!["Q1".into(), "Q3".into()],
            responses: DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]),
            identifier: Some("id".into()),
        };
        let path = dir.path().join("nested").join("cleaned_s1.csv");
        write_cleaned(&matrix, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Q1,Q3\n1,\n0,1\n");

        let back = load_responses(&path).unwrap();
        assert_eq!(back.items, matrix.items);
        assert_eq!(back.identifier, None);
    }
}
