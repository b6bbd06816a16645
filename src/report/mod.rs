//! Terminal reports for analyses, statuses and job runs.

pub mod format;

pub use format::*;
