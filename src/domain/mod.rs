//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the job lifecycle (`JobStatus`, `StatusRecord`)
//! - the canonical analysis result (`AnalysisResult` and its parts)
//! - curve payloads (`IccData`, `IifData`, `TifData`)
//! - the query outcome wrapper (`Outcome`)

pub mod types;

pub use types::*;
