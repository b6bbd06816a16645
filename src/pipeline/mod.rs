//! Analysis jobs: clean an uploaded response matrix, delegate estimation,
//! normalize and store the result.

pub mod ingest;
pub mod job;

pub use ingest::*;
pub use job::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::estimator::EstimatorError;
use crate::normalize::NormalizeError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read response data: {0}")]
    Read(String),

    #[error("Failed to write cleaned data {0}")]
    Write(String),

    #[error("Invalid response value '{value}' at line {line}, column '{column}'")]
    InvalidCell { line: usize, column: String, value: String },

    #[error("Upload contains no responses")]
    EmptyUpload,

    #[error("Not enough valid items after removing invariant ones ({remaining} left, need at least 2)")]
    NotEnoughItems { remaining: usize },

    #[error("Estimation service is not available. Please try again later.")]
    ServiceUnavailable,

    #[error("IRT analysis failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("IRT analysis returned unusable results: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Failed to store analysis results: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
