//! Blocking HTTP client for the remote estimation engine.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::estimator::{Estimator, EstimatorError};
use crate::normalize::to_clean_string;

/// Longest slice of an error body kept in error messages.
const BODY_SNIPPET: usize = 200;

/// Per-capability request timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub health: Duration,
    pub icc: Duration,
    pub query: Duration,
    pub fit: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            icc: Duration::from_secs(90),
            query: Duration::from_secs(120),
            fit: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Serialize)]
struct DataRequest<'a> {
    data_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<&'a str>,
}

/// Client for the estimator's `/health`, `/analyze`, `/icc`, `/iif` and
/// `/testinfo` endpoints.
///
/// Holds a minimal circuit breaker: after `degrade_after` consecutive health
/// checks fail at the transport level, the client is degraded for the rest
/// of its life and every call fails immediately with
/// `EstimatorError::Degraded`. There is no automatic reset; build a new
/// client to try the engine again.
#[derive(Debug)]
pub struct EstimatorClient {
    http: Client,
    base_url: String,
    timeouts: Timeouts,
    degrade_after: u32,
    consecutive_failures: AtomicU32,
    degraded: AtomicBool,
}

impl EstimatorClient {
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts, degrade_after: u32) -> Result<Self, EstimatorError> {
        let http = Client::builder()
            .build()
            .map_err(|e| EstimatorError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
            degrade_after: degrade_after.max(1),
            consecutive_failures: AtomicU32::new(0),
            degraded: AtomicBool::new(false),
        })
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<(), EstimatorError> {
        if self.is_degraded() {
            Err(EstimatorError::Degraded)
        } else {
            Ok(())
        }
    }

    fn record_transport_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.degrade_after && !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(
                base_url = %self.base_url,
                failures,
                "estimator unreachable; client degraded until restart"
            );
        }
    }

    /// POST a JSON body and decode the JSON reply.
    fn post(&self, endpoint: &str, body: &DataRequest<'_>, timeout: Duration) -> Result<Value, EstimatorError> {
        self.ensure_available()?;

        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, data_path = body.data_path, "calling estimator");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .map_err(|e| EstimatorError::Transport(format!("{endpoint} request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| EstimatorError::Transport(format!("{endpoint} response read failed: {e}")))?;

        if !status.is_success() {
            return Err(EstimatorError::Status {
                endpoint: endpoint.to_string(),
                code: status.as_u16(),
                body: snippet(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| EstimatorError::Malformed {
            endpoint: endpoint.to_string(),
            detail: format!("{e}; body: {}", snippet(&text)),
        })
    }

    /// POST and require `status == "success"` in the reply.
    fn post_success(&self, endpoint: &str, body: &DataRequest<'_>, timeout: Duration) -> Result<Value, EstimatorError> {
        let payload = self.post(endpoint, body, timeout)?;
        let status = to_clean_string(payload.get("status"), "");
        if status != "success" {
            return Err(EstimatorError::Remote {
                endpoint: endpoint.to_string(),
                message: remote_error(&payload, &format!("{endpoint} failed")),
            });
        }
        Ok(payload)
    }
}

impl Estimator for EstimatorClient {
    fn health(&self) -> bool {
        if self.is_degraded() {
            return false;
        }

        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).timeout(self.timeouts.health).send() {
            Ok(resp) if resp.status().is_success() => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
                true
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "estimator health check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "estimator health check failed");
                self.record_transport_failure();
                false
            }
        }
    }

    fn fit(&self, data_path: &str) -> Result<Value, EstimatorError> {
        let body = DataRequest { data_path, item_id: None };
        let payload = self.post("analyze", &body, self.timeouts.fit)?;

        if to_clean_string(payload.get("status"), "") == "error" {
            return Err(EstimatorError::Remote {
                endpoint: "analyze".to_string(),
                message: remote_error(&payload, "Unknown error from estimator"),
            });
        }
        info!(data_path, "estimator fit completed");
        Ok(payload)
    }

    fn curve(&self, data_path: &str, item_id: Option<&str>) -> Result<Value, EstimatorError> {
        let body = DataRequest { data_path, item_id };
        self.post_success("icc", &body, self.timeouts.icc)
    }

    fn information(&self, data_path: &str) -> Result<Value, EstimatorError> {
        let body = DataRequest { data_path, item_id: None };
        self.post_success("iif", &body, self.timeouts.query)
    }

    fn test_information(&self, data_path: &str) -> Result<Value, EstimatorError> {
        let body = DataRequest { data_path, item_id: None };
        self.post_success("testinfo", &body, self.timeouts.query)
    }
}

fn remote_error(payload: &Value, default: &str) -> String {
    to_clean_string(payload.get("error"), default)
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
