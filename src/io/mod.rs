//! Input/output helpers.
//!
//! - item parameter CSV export (`export`)
//! - payload JSON export (`curve`)

pub mod curve;
pub mod export;

pub use curve::*;
pub use export::*;
