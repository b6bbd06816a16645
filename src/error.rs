//! Binary-facing error type.
//!
//! Library modules carry their own error enums; `AppError` wraps them for the
//! `irt` binary and decides the process exit code:
//!
//! - `2` usage, configuration, local I/O
//! - `3` unknown session / missing analysis results
//! - `4` upstream estimator failure
//! - `5` analysis job failure

use std::path::PathBuf;

use thiserror::Error;

use crate::curves::QueryError;
use crate::estimator::EstimatorError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("Failed to write '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{failed} of {total} analysis jobs failed")]
    JobsFailed { failed: usize, total: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn export(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Export {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Usage(_) | AppError::Export { .. } | AppError::Io(_) => 2,
            AppError::Store(_) => 2,
            AppError::Query(QueryError::Computation(_)) => 4,
            AppError::Query(_) => 3,
            AppError::Estimator(_) => 4,
            AppError::Pipeline(_) | AppError::JobsFailed { .. } => 5,
        }
    }
}
