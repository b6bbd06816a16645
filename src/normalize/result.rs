//! Raw estimator payload → canonical `AnalysisResult`.
//!
//! Every numeric, boolean and string field crossing the estimator boundary is
//! routed through `coerce`. Missing sections become typed defaults; the only
//! fatal outcome is a payload without usable item parameters, since a
//! completed result must always carry at least one item.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::domain::{
    AnalysisResult, DataSummary, ItemParameter, JobStatus, ModelFit, ModelInfo, TestInformation,
};
use crate::normalize::coerce::{to_bool, to_clean_string, to_f64, to_i64};

const DEFAULT_MODEL_TYPE: &str = "3PL";
const DEFAULT_ANALYSIS_TYPE: &str = "2PL_IRT";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("estimator result is not a JSON object")]
    NotAnObject,

    #[error("estimator result contains no item parameters")]
    NoItems,
}

/// Data-set figures the pipeline measured itself.
///
/// Used as defaults for `data_summary` when the estimator omits them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalSummary {
    pub n_students: usize,
    pub n_items: usize,
    pub original_students: usize,
    pub response_rate: f64,
}

/// Context attached to the normalized result.
#[derive(Debug, Clone)]
pub struct ResultContext<'a> {
    pub session_id: &'a str,
    pub data_path: &'a str,
    pub created_at: DateTime<Utc>,
    pub local: LocalSummary,
}

/// Normalize a raw `fit` payload into the canonical schema.
pub fn normalize_analysis(raw: &Value, ctx: &ResultContext<'_>) -> Result<AnalysisResult, NormalizeError> {
    let root = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let item_parameters = normalize_items(root.get("item_parameters"));
    if item_parameters.is_empty() {
        return Err(NormalizeError::NoItems);
    }

    Ok(AnalysisResult {
        session_id: ctx.session_id.to_string(),
        status: JobStatus::Completed,
        item_parameters,
        model_info: normalize_model_info(root.get("model_info")),
        model_fit: normalize_model_fit(root.get("model_fit")),
        test_information: normalize_test_information(root.get("test_information")),
        data_summary: normalize_data_summary(root.get("data_summary"), &ctx.local),
        data_path: ctx.data_path.to_string(),
        created_at: ctx.created_at,
        analysis_type: to_clean_string(root.get("analysis_type"), DEFAULT_ANALYSIS_TYPE),
    })
}

/// Normalize item parameters given either row- or column-oriented.
pub fn normalize_items(raw: Option<&Value>) -> Vec<ItemParameter> {
    let rows: Vec<Map<String, Value>> = match raw {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item {
                Value::Object(map) => Some(map.clone()),
                other => {
                    warn!(index = idx, value = %other, "skipping non-object item parameter entry");
                    None
                }
            })
            .collect(),
        Some(Value::Object(columns)) => rows_from_columns(columns),
        _ => Vec::new(),
    };

    rows.iter()
        .enumerate()
        .map(|(idx, row)| normalize_item(row, idx + 1))
        .collect()
}

fn normalize_item(row: &Map<String, Value>, position: usize) -> ItemParameter {
    ItemParameter {
        item_id: to_clean_string(row.get("item_id"), &format!("item_{position}")),
        difficulty: to_f64(row.get("difficulty"), 0.0),
        discrimination: to_f64(row.get("discrimination"), 1.0),
        guessing: to_f64(row.get("guessing"), 0.0),
        se_difficulty: to_f64(row.get("se_difficulty"), 0.0),
        se_discrimination: to_f64(row.get("se_discrimination"), 0.0),
        se_guessing: to_f64(row.get("se_guessing"), 0.0),
        model_type: to_clean_string(row.get("model_type"), DEFAULT_MODEL_TYPE),
    }
}

/// Transpose `{"item_id": [..], "difficulty": [..]}` into one map per item.
///
/// Scalar-valued columns are broadcast to every row.
fn rows_from_columns(columns: &Map<String, Value>) -> Vec<Map<String, Value>> {
    let n_rows = columns
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    (0..n_rows)
        .map(|i| {
            columns
                .iter()
                .map(|(key, column)| {
                    let cell = match column {
                        Value::Array(values) => values.get(i).cloned().unwrap_or(Value::Null),
                        scalar => scalar.clone(),
                    };
                    (key.clone(), cell)
                })
                .collect()
        })
        .collect()
}

pub fn normalize_model_info(raw: Option<&Value>) -> ModelInfo {
    let field = |key: &str| raw.and_then(|v| v.get(key));
    ModelInfo {
        model_type: to_clean_string(field("type"), DEFAULT_MODEL_TYPE),
        converged: to_bool(field("converged"), true),
        iterations: to_i64(field("iterations"), 0),
        log_likelihood: to_f64(field("log_likelihood"), 0.0),
    }
}

pub fn normalize_model_fit(raw: Option<&Value>) -> ModelFit {
    let field = |key: &str| raw.and_then(|v| v.get(key));
    ModelFit {
        m2: to_f64(field("m2"), 0.0),
        m2_p: to_f64(field("m2_p"), 0.0),
        m2_df: to_i64(field("m2_df"), 0),
        tli: to_f64(field("tli"), 0.0),
        rmsea: to_f64(field("rmsea"), 0.0),
        reliability: to_f64(field("reliability"), 0.0),
        log_likelihood: to_f64(field("log_likelihood"), 0.0),
        aic: to_f64(field("aic"), 0.0),
        bic: to_f64(field("bic"), 0.0),
        converged: to_bool(field("converged"), true),
    }
}

/// Normalize the parallel `theta`/`information` arrays.
///
/// Lengths are equalized by truncating to the shorter series.
pub fn normalize_test_information(raw: Option<&Value>) -> TestInformation {
    let mut theta = numeric_series(raw.and_then(|v| v.get("theta")));
    let mut information = numeric_series(raw.and_then(|v| v.get("information")));

    if theta.len() != information.len() {
        warn!(
            theta = theta.len(),
            information = information.len(),
            "test information arrays differ in length; truncating"
        );
        let n = theta.len().min(information.len());
        theta.truncate(n);
        information.truncate(n);
    }

    TestInformation { theta, information }
}

fn normalize_data_summary(raw: Option<&Value>, local: &LocalSummary) -> DataSummary {
    let field = |key: &str| raw.and_then(|v| v.get(key));
    DataSummary {
        n_students: to_i64(field("n_students"), local.n_students as i64),
        n_items: to_i64(field("n_items"), local.n_items as i64),
        original_students: to_i64(field("original_students"), local.original_students as i64),
        response_rate: to_f64(field("response_rate"), local.response_rate),
    }
}

/// A list of floats where each element may itself be wrapped (`[[0.1], [0.2]]`).
///
/// Empty sub-containers are dropped; a bare scalar becomes a one-element list.
pub fn numeric_series(raw: Option<&Value>) -> Vec<f64> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .filter(|v| !matches!(v, Value::Array(inner) if inner.is_empty()))
            .map(|v| to_f64(Some(v), 0.0))
            .collect(),
        Some(scalar) => vec![to_f64(Some(scalar), 0.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ResultContext<'static> {
        ResultContext {
            session_id: "s-1",
            data_path: "/data/cleaned_s-1.csv",
            created_at: DateTime::<Utc>::default(),
            local: LocalSummary {
                n_students: 200,
                n_items: 2,
                original_students: 200,
                response_rate: 0.61,
            },
        }
    }

    fn r_style_payload() -> Value {
        json!({
            "status": ["success"],
            "analysis_type": ["['3PL']"],
            "item_parameters": [
                {"item_id": ["Q1"], "difficulty": [0.25], "discrimination": "1.4",
                 "guessing": [[0.12]], "se_difficulty": null, "model_type": "['3PL']"},
                {"item_id": "Q2", "difficulty": -1.0, "discrimination": [], "guessing": []}
            ],
            "model_info": {"type": ["3PL"], "converged": ["TRUE"], "iterations": ["57"], "log_likelihood": [-812.4]},
            "model_fit": {"m2": [[12.5]], "m2_p": 0.3, "m2_df": ["9.0"], "rmsea": [0.02], "converged": "FALSE"},
            "test_information": {"theta": [[-1.0], [0.0], [1.0]], "information": [0.5, 1.5]},
            "data_summary": {"n_students": [198], "response_rate": "0.6"}
        })
    }

    #[test]
    fn nested_payload_is_fully_typed() {
        let result = normalize_analysis(&r_style_payload(), &ctx()).unwrap();

        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.analysis_type, "3PL");
        assert_eq!(result.item_parameters.len(), 2);

        let q1 = &result.item_parameters[0];
        assert_eq!(q1.item_id, "Q1");
        assert_eq!(q1.difficulty, 0.25);
        assert_eq!(q1.discrimination, 1.4);
        assert_eq!(q1.guessing, 0.12);
        assert_eq!(q1.se_difficulty, 0.0);
        assert_eq!(q1.model_type, "3PL");

        let q2 = &result.item_parameters[1];
        assert_eq!(q2.discrimination, 1.0);
        assert_eq!(q2.guessing, 0.0);

        assert_eq!(result.model_info.model_type, "3PL");
        assert!(result.model_info.converged);
        assert_eq!(result.model_info.iterations, 57);
        assert_eq!(result.model_fit.m2, 12.5);
        assert_eq!(result.model_fit.m2_df, 9);
        assert_eq!(result.model_fit.tli, 0.0);
        assert!(!result.model_fit.converged);
    }

    #[test]
    fn test_information_arrays_end_up_parallel() {
        let result = normalize_analysis(&r_style_payload(), &ctx()).unwrap();
        assert_eq!(result.test_information.theta, vec![-1.0, 0.0]);
        assert_eq!(result.test_information.information, vec![0.5, 1.5]);
    }

    #[test]
    fn data_summary_falls_back_to_local_counts() {
        let result = normalize_analysis(&r_style_payload(), &ctx()).unwrap();
        assert_eq!(result.data_summary.n_students, 198);
        assert_eq!(result.data_summary.n_items, 2);
        assert_eq!(result.data_summary.original_students, 200);
        assert_eq!(result.data_summary.response_rate, 0.6);
        assert_eq!(result.data_path, "/data/cleaned_s-1.csv");
        assert_eq!(result.session_id, "s-1");
    }

    #[test]
    fn column_oriented_items_are_transposed() {
        let items = normalize_items(Some(&json!({
            "item_id": ["A", "B", "C"],
            "difficulty": [0.0, 1.0, 2.0],
            "discrimination": [1.1, 1.2, 1.3],
            "model_type": "2PL"
        })));
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].item_id, "C");
        assert_eq!(items[2].difficulty, 2.0);
        assert_eq!(items[1].discrimination, 1.2);
        assert!(items.iter().all(|i| i.model_type == "2PL"));
    }

    #[test]
    fn missing_item_ids_get_positional_names() {
        let items = normalize_items(Some(&json!([{"difficulty": 0.1}, 42, {"item_id": []}])));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_id, "item_1");
        assert_eq!(items[1].item_id, "item_2");
    }

    #[test]
    fn payload_without_items_is_rejected() {
        let err = normalize_analysis(&json!({"item_parameters": []}), &ctx()).unwrap_err();
        assert!(matches!(err, NormalizeError::NoItems));

        let err = normalize_analysis(&json!(["not", "an", "object"]), &ctx()).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject));
    }

    #[test]
    fn absent_sections_become_defaults() {
        let result = normalize_analysis(&json!({"item_parameters": [{"item_id": "X"}]}), &ctx()).unwrap();
        assert_eq!(result.model_info.model_type, "3PL");
        assert!(result.model_info.converged);
        assert_eq!(result.model_fit, ModelFit { converged: true, ..ModelFit::default() });
        assert!(result.test_information.theta.is_empty());
        assert_eq!(result.analysis_type, "2PL_IRT");
        assert_eq!(result.data_summary.n_students, 200);
    }

    #[test]
    fn numeric_series_accepts_scalars_and_wrapped_values() {
        assert_eq!(numeric_series(Some(&json!(3.5))), vec![3.5]);
        assert_eq!(numeric_series(Some(&json!([[1], [], ["2"], "x"]))), vec![1.0, 2.0, 0.0]);
        assert!(numeric_series(None).is_empty());
    }
}
