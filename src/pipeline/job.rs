//! One analysis job, from uploaded file to stored result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::domain::{AnalysisResult, JobStatus};
use crate::estimator::Estimator;
use crate::normalize::{LocalSummary, ResultContext, normalize_analysis};
use crate::pipeline::{PipelineError, drop_invariant_items, load_responses, response_rate, write_cleaned};
use crate::store::JobStore;

/// Minimum number of items an analysis needs after cleaning.
pub const MIN_ITEMS: usize = 2;

pub struct AnalysisPipeline {
    store: Arc<JobStore>,
    estimator: Arc<dyn Estimator>,
    data_dir: PathBuf,
}

impl AnalysisPipeline {
    pub fn new(store: Arc<JobStore>, estimator: Arc<dyn Estimator>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            estimator,
            data_dir: data_dir.into(),
        }
    }

    /// Where the cleaned matrix of `session_id` is written.
    pub fn cleaned_path(&self, session_id: &str) -> PathBuf {
        self.data_dir.join(format!("cleaned_{session_id}.csv"))
    }

    /// Run the whole job once.
    ///
    /// Any failure is first recorded as an `error` status for pollers and
    /// then returned to the caller for its own bookkeeping. Nothing is
    /// retried.
    pub fn start_analysis(&self, file_path: &Path, session_id: &str) -> Result<AnalysisResult, PipelineError> {
        info!(session_id, file = %file_path.display(), "starting analysis");
        match self.execute(file_path, session_id) {
            Ok(result) => Ok(result),
            Err(e) => {
                let message = format!("Analysis failed: {e}");
                error!(session_id, error = %e, "analysis failed");
                self.store.put_status(session_id, JobStatus::Error, &message);
                Err(e)
            }
        }
    }

    fn execute(&self, file_path: &Path, session_id: &str) -> Result<AnalysisResult, PipelineError> {
        self.store
            .put_status(session_id, JobStatus::Processing, "Reading and validating data...");

        let raw = load_responses(file_path)?;
        let (clean, _dropped) = drop_invariant_items(&raw);
        if clean.n_items() < MIN_ITEMS {
            return Err(PipelineError::NotEnoughItems {
                remaining: clean.n_items(),
            });
        }

        let cleaned_path = self.cleaned_path(session_id);
        write_cleaned(&clean, &cleaned_path)?;
        // The estimator runs in its own working directory.
        let cleaned_path = std::path::absolute(&cleaned_path)?;

        let local = LocalSummary {
            n_students: clean.n_respondents(),
            n_items: clean.n_items(),
            original_students: raw.n_respondents(),
            response_rate: response_rate(&clean.responses),
        };
        info!(
            session_id,
            students = local.n_students,
            items = local.n_items,
            response_rate = local.response_rate,
            "data validated"
        );
        self.store.put_status(
            session_id,
            JobStatus::Processing,
            &format!(
                "Data validated. {} students, {} items. Starting IRT analysis...",
                local.n_students, local.n_items
            ),
        );

        if !self.estimator.health() {
            return Err(PipelineError::ServiceUnavailable);
        }

        let data_path = cleaned_path.to_string_lossy().into_owned();
        let raw_result = self.estimator.fit(&data_path)?;

        let ctx = ResultContext {
            session_id,
            data_path: &data_path,
            created_at: Utc::now(),
            local,
        };
        let result = normalize_analysis(&raw_result, &ctx)?;

        self.store.put_result(session_id, &result)?;
        self.store
            .put_status(session_id, JobStatus::Completed, "IRT analysis completed successfully");
        info!(session_id, items = result.item_parameters.len(), "analysis completed");
        Ok(result)
    }
}
