//! Remote estimation engine.
//!
//! The engine is an opaque capability: given a cleaned data file it returns
//! item parameters, fit statistics and curves, or it fails. Every failure
//! mode (transport, HTTP status, undecodable body, self-reported error)
//! collapses into a single `EstimatorError`; there are no partial results.

pub mod client;

pub use client::*;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("estimation service is degraded; not contacting it until restart")]
    Degraded,

    #[error("estimation service unreachable: {0}")]
    Transport(String),

    #[error("estimation service {endpoint} returned HTTP {code}: {body}")]
    Status { endpoint: String, code: u16, body: String },

    #[error("estimation service {endpoint} returned an invalid response: {detail}")]
    Malformed { endpoint: String, detail: String },

    #[error("estimation service {endpoint} reported an error: {message}")]
    Remote { endpoint: String, message: String },
}

/// The five remote capabilities.
///
/// All calls block until the reply arrives or the per-call timeout expires.
/// Payloads are loosely typed JSON and must go through `normalize` (fit) or
/// be passed on verbatim (curve payloads already in the reply schema).
pub trait Estimator: Send + Sync {
    /// Liveness check. `false` also when the client is degraded.
    fn health(&self) -> bool;

    /// Estimate item parameters for the cleaned response matrix at `data_path`.
    fn fit(&self, data_path: &str) -> Result<Value, EstimatorError>;

    /// Item characteristic curves, optionally for a single item.
    fn curve(&self, data_path: &str, item_id: Option<&str>) -> Result<Value, EstimatorError>;

    /// Item information functions.
    fn information(&self, data_path: &str) -> Result<Value, EstimatorError>;

    /// Test information function and standard error of measurement.
    fn test_information(&self, data_path: &str) -> Result<Value, EstimatorError>;
}
