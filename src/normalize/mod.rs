//! Result normalization at the estimator boundary.
//!
//! - `coerce`: pure scalar coercions with explicit defaults
//! - `result`: raw `fit` payload → canonical `AnalysisResult`

pub mod coerce;
pub mod result;

pub use coerce::*;
pub use result::*;
