//! Curve queries (ICC / IIF / TIF) over completed analysis sessions.
//!
//! Every curve query follows the same protocol:
//!
//! 1. load the session's stored result (or report it as processing/unknown)
//! 2. ask the remote estimator for the curve
//! 3. on any remote failure, compute the same curve locally from the stored
//!    item parameters
//!
//! Both paths produce the same success shape, so callers cannot tell which
//! one answered.

pub mod fallback;
pub mod icc;
pub mod iif;
pub mod tif;

pub use fallback::with_fallback;
pub use icc::local_icc;
pub use iif::local_iif;
pub use tif::local_tif;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{AnalysisResult, ItemParameter, Outcome, StatusRecord};
use crate::estimator::Estimator;
use crate::math::{ItemParams, ThetaGrid};
use crate::store::JobStore;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Missing analysis results")]
    MissingResults,

    #[error("Local computation failed: {0}")]
    Computation(String),
}

/// Items the local kernels can evaluate, paired with their ids.
///
/// Items with an empty id or non-finite parameters are skipped with a
/// warning.
pub fn usable_items(items: &[ItemParameter]) -> Vec<(&str, ItemParams)> {
    items
        .iter()
        .filter_map(|item| {
            let params = item.params();
            if item.item_id.is_empty() || !params.is_finite() {
                warn!(
                    item_id = %item.item_id,
                    a = params.a,
                    b = params.b,
                    c = params.c,
                    "skipping item with unusable parameters"
                );
                None
            } else {
                Some((item.item_id.as_str(), params))
            }
        })
        .collect()
}

/// The stored pieces a curve query needs.
struct CurveInputs {
    data_path: String,
    items: Vec<ItemParameter>,
}

/// Read-only query facade over the job store and the estimator.
pub struct CurveService {
    store: Arc<JobStore>,
    estimator: Arc<dyn Estimator>,
}

impl CurveService {
    pub fn new(store: Arc<JobStore>, estimator: Arc<dyn Estimator>) -> Self {
        Self { store, estimator }
    }

    /// Current status record of a session.
    pub fn get_status(&self, session_id: &str) -> Result<StatusRecord, QueryError> {
        self.store.get_status(session_id).ok_or(QueryError::SessionNotFound)
    }

    /// The stored analysis result, or the status while the job is running.
    pub fn get_analysis(&self, session_id: &str) -> Result<Outcome<AnalysisResult>, QueryError> {
        if let Some(result) = self.store.get_result(session_id) {
            return Ok(Outcome::Ready(result));
        }
        match self.store.get_status(session_id) {
            Some(status) => Ok(Outcome::Processing(status)),
            None => Err(QueryError::SessionNotFound),
        }
    }

    /// Item characteristic curves, optionally restricted to one item.
    pub fn get_icc(&self, session_id: &str, item_id: Option<&str>) -> Result<Outcome<Value>, QueryError> {
        self.query(session_id, |inputs| {
            with_fallback(
                "icc",
                || self.estimator.curve(&inputs.data_path, item_id),
                || success(&local_icc(&inputs.items, item_id, ThetaGrid::icc())),
            )
        })
    }

    /// Item information functions in long format.
    pub fn get_iif(&self, session_id: &str) -> Result<Outcome<Value>, QueryError> {
        self.query(session_id, |inputs| {
            with_fallback(
                "iif",
                || self.estimator.information(&inputs.data_path),
                || local_iif(&inputs.items, ThetaGrid::iif()).and_then(|data| success(&data)),
            )
        })
    }

    /// Test information function with its standard error of measurement.
    pub fn get_tif(&self, session_id: &str) -> Result<Outcome<Value>, QueryError> {
        self.query(session_id, |inputs| {
            with_fallback(
                "tif",
                || self.estimator.test_information(&inputs.data_path),
                || success(&local_tif(&inputs.items, ThetaGrid::tif())),
            )
        })
    }

    fn query<F>(&self, session_id: &str, compute: F) -> Result<Outcome<Value>, QueryError>
    where
        F: FnOnce(&CurveInputs) -> Result<Value, QueryError>,
    {
        let result = match self.get_analysis(session_id)? {
            Outcome::Ready(result) => result,
            Outcome::Processing(status) => {
                debug!(session_id, status = %status.status, "curve requested before results exist");
                return Ok(Outcome::Processing(status));
            }
        };

        if result.data_path.is_empty() || result.item_parameters.is_empty() {
            warn!(session_id, "stored analysis result lacks data path or item parameters");
            return Err(QueryError::MissingResults);
        }

        let inputs = CurveInputs {
            data_path: result.data_path,
            items: result.item_parameters,
        };
        compute(&inputs).map(Outcome::Ready)
    }
}

/// Serialize a locally computed payload and tag it with `status: "success"`.
fn success<T: Serialize>(payload: &T) -> Result<Value, QueryError> {
    let mut value = serde_json::to_value(payload).map_err(|e| QueryError::Computation(e.to_string()))?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("status".to_string(), Value::from("success"));
            Ok(value)
        }
        None => Err(QueryError::Computation("payload is not a JSON object".to_string())),
    }
}

/// Render a query outcome in the reply shape callers consume:
/// the payload itself, `{status: "processing", message}`, or
/// `{status: "error", error}`.
pub fn to_wire(outcome: Result<Outcome<Value>, QueryError>) -> Value {
    match outcome {
        Ok(Outcome::Ready(payload)) => payload,
        Ok(Outcome::Processing(status)) => json!({
            "status": "processing",
            "message": status.message,
        }),
        Err(e) => json!({
            "status": "error",
            "error": e.to_string(),
        }),
    }
}
