//! Shared domain types.
//!
//! These types are kept serializable so they can be:
//!
//! - cached in the job state store as JSON
//! - returned to callers of the curve queries
//! - exported to CSV/JSON by the `io` module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::math::ItemParams;

/// Lifecycle state of one analysis job.
///
/// `pending → processing → {completed | error}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record of a session. Overwritten wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
}

impl StatusRecord {
    pub fn new(status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Estimated parameters for one item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemParameter {
    pub item_id: String,
    pub difficulty: f64,
    pub discrimination: f64,
    pub guessing: f64,
    pub se_difficulty: f64,
    pub se_discrimination: f64,
    pub se_guessing: f64,
    pub model_type: String,
}

impl ItemParameter {
    /// The `(a, b, c)` triple used by the kernels.
    pub fn params(&self) -> ItemParams {
        ItemParams::new(self.discrimination, self.difficulty, self.guessing)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    #[serde(rename = "type")]
    pub model_type: String,
    pub converged: bool,
    pub iterations: i64,
    pub log_likelihood: f64,
}

/// Global fit statistics reported by the estimator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelFit {
    pub m2: f64,
    pub m2_p: f64,
    pub m2_df: i64,
    pub tli: f64,
    pub rmsea: f64,
    pub reliability: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub converged: bool,
}

/// Test information on the estimator's own grid (parallel arrays).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestInformation {
    pub theta: Vec<f64>,
    pub information: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSummary {
    pub n_students: i64,
    pub n_items: i64,
    pub original_students: i64,
    pub response_rate: f64,
}

/// Canonical output of one completed analysis job.
///
/// Every field has a serde default so that a truncated or partially written
/// cache entry still decodes; callers then see empty `data_path` /
/// `item_parameters` and report missing results instead of "not found".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub session_id: String,
    pub status: JobStatus,
    pub item_parameters: Vec<ItemParameter>,
    pub model_info: ModelInfo,
    pub model_fit: ModelFit,
    pub test_information: TestInformation,
    pub data_summary: DataSummary,
    pub data_path: String,
    pub created_at: DateTime<Utc>,
    pub analysis_type: String,
}

/// One point of an item characteristic curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IccPoint {
    pub item_id: String,
    pub theta: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IccData {
    pub icc_data: Vec<IccPoint>,
}

/// One point of an item information function (long format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IifPoint {
    pub theta: f64,
    pub iif: f64,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IifData {
    pub iif_data: Vec<IifPoint>,
}

/// Test information and its standard error on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TifData {
    pub theta: Vec<f64>,
    pub tif: Vec<f64>,
    pub sem: Vec<f64>,
}

/// Result of a read query against a session that may still be running.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The session has a stored result and the payload was produced.
    Ready(T),
    /// The session is known (status present) but has no result yet.
    Processing(StatusRecord),
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Processing(_) => None,
        }
    }
}
