//! `irt-curves` library crate.
//!
//! The binary (`irt`) is a thin wrapper around this library so that:
//!
//! - job lifecycle and curve queries are testable without spawning processes
//! - the same services can sit behind another front-end (an HTTP layer, a queue worker)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod curves;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod io;
pub mod logging;
pub mod math;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod store;
