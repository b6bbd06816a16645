//! Numeric kernels: ability grids and closed-form 3PL curves.

pub mod grid;
pub mod irt;

pub use grid::*;
pub use irt::*;
