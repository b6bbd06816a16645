//! Ephemeral job state: status and result records per session.

pub mod backend;
pub mod jobs;

pub use backend::*;
pub use jobs::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state backend error: {0}")]
    Backend(String),

    #[error("state backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
