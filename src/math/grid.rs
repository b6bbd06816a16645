//! Ability (θ) grids.
//!
//! Curves are always evaluated on `linspace(min, max, points)` with every
//! node rounded to a fixed number of decimals, so two runs on the same
//! parameters serialize byte-identical grids.

/// Default lower end of the ability range.
pub const THETA_MIN: f64 = -4.0;

/// Default upper end of the ability range.
pub const THETA_MAX: f64 = 4.0;

/// A fixed, evenly spaced ability grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaGrid {
    pub min: f64,
    pub max: f64,
    pub points: usize,
    /// Decimal places each node is rounded to.
    pub decimals: u32,
}

impl ThetaGrid {
    pub const fn new(min: f64, max: f64, points: usize, decimals: u32) -> Self {
        Self {
            min,
            max,
            points,
            decimals,
        }
    }

    /// Grid used for item characteristic curves: 41 nodes, 8 decimals.
    pub const fn icc() -> Self {
        Self::new(THETA_MIN, THETA_MAX, 41, 8)
    }

    /// Grid used for item information functions: 101 nodes, 6 decimals.
    pub const fn iif() -> Self {
        Self::new(THETA_MIN, THETA_MAX, 101, 6)
    }

    /// Grid used for the test information function: 41 nodes, 6 decimals.
    pub const fn tif() -> Self {
        Self::new(THETA_MIN, THETA_MAX, 41, 6)
    }

    /// Materialize the rounded grid nodes.
    pub fn values(&self) -> Vec<f64> {
        linspace(self.min, self.max, self.points)
            .into_iter()
            .map(|t| round_to(t, self.decimals))
            .collect()
    }
}

/// `n` evenly spaced values from `min` to `max`, both endpoints included.
///
/// `n = 0` yields an empty grid and `n = 1` yields `[min]`.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n as f64 - 1.0);
            let mut out: Vec<f64> = (0..n).map(|i| min + step * i as f64).collect();
            // Pin the endpoint; accumulated float error would otherwise drift it.
            out[n - 1] = max;
            out
        }
    }
}

/// Round to `decimals` places. Negative zero is normalized to `0.0`.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let v = linspace(-4.0, 4.0, 41);
        assert_eq!(v.len(), 41);
        assert_eq!(v[0], -4.0);
        assert_eq!(v[40], 4.0);
        assert!((v[1] - v[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn linspace_degenerate_sizes() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.5, 1.0, 1), vec![0.5]);
    }

    #[test]
    fn default_grids_have_call_site_resolutions() {
        assert_eq!(ThetaGrid::icc().values().len(), 41);
        assert_eq!(ThetaGrid::tif().values().len(), 41);
        assert_eq!(ThetaGrid::iif().values().len(), 101);
    }

    #[test]
    fn grid_center_is_positive_zero() {
        let grid = ThetaGrid::tif().values();
        let center = grid[20];
        assert_eq!(center, 0.0);
        assert!(center.is_sign_positive());
    }

    #[test]
    fn rounding_is_reproducible() {
        let a = ThetaGrid::iif().values();
        let b = ThetaGrid::iif().values();
        assert_eq!(a, b);
        assert_eq!(a[1], -3.92);
    }
}
