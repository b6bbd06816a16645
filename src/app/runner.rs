//! Background job runner.
//!
//! Stands in for an external task queue: every submitted upload becomes one
//! independent pipeline run on a `rayon` pool. The runner keeps its own
//! per-job bookkeeping (`JobReport`) separate from the status records that
//! pollers read.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::JobStatus;
use crate::error::AppError;
use crate::pipeline::AnalysisPipeline;
use crate::store::JobStore;

/// Fresh opaque session identifier.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub file: PathBuf,
    pub session_id: String,
}

impl JobRequest {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            session_id: new_session_id(),
        }
    }

    pub fn with_session(file: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            session_id: session_id.into(),
        }
    }
}

/// Runner-side outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub session_id: String,
    pub file: PathBuf,
    pub error: Option<String>,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

pub struct JobRunner {
    pipeline: Arc<AnalysisPipeline>,
    store: Arc<JobStore>,
    pool: rayon::ThreadPool,
}

impl JobRunner {
    /// `threads = 0` lets rayon pick one worker per core.
    pub fn new(pipeline: Arc<AnalysisPipeline>, store: Arc<JobStore>, threads: usize) -> Result<Self, AppError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("irt-job-{i}"))
            .build()
            .map_err(|e| AppError::Config(format!("failed to start job pool: {e}")))?;
        Ok(Self { pipeline, store, pool })
    }

    /// Queue and run every request concurrently; reports come back in
    /// submission order.
    pub fn run_batch(&self, requests: &[JobRequest]) -> Vec<JobReport> {
        for request in requests {
            self.store.put_status(&request.session_id, JobStatus::Pending, "queued");
        }
        self.pool
            .install(|| requests.par_iter().map(|request| self.run_one(request)).collect())
    }

    /// Queue and run a single request.
    pub fn submit(&self, request: &JobRequest) -> JobReport {
        self.run_batch(std::slice::from_ref(request)).remove(0)
    }

    fn run_one(&self, request: &JobRequest) -> JobReport {
        let outcome = self.pipeline.start_analysis(&request.file, &request.session_id);
        let error = match outcome {
            Ok(result) => {
                info!(
                    session_id = %request.session_id,
                    items = result.item_parameters.len(),
                    "job finished"
                );
                None
            }
            Err(e) => {
                error!(session_id = %request.session_id, error = %e, "job failed");
                Some(e.to_string())
            }
        };
        JobReport {
            session_id: request.session_id.clone(),
            file: request.file.clone(),
            error,
        }
    }
}
