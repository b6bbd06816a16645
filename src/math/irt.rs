//! Closed-form kernels for the three-parameter logistic (3PL) model.
//!
//! With discrimination `a`, difficulty `b` and guessing `c`:
//!
//! - `L(θ) = 1 / (1 + exp(-a(θ - b)))`
//! - `P(θ) = c + (1 - c) L(θ)`
//! - `P'(θ) = a (1 - c) L (1 - L)`
//! - `I(θ) = P'(θ)² / (P (1 - P))`
//!
//! Numerical notes:
//! - `L` is evaluated in a sign-split form so `exp` never overflows.
//! - `P` is clamped to `[ε, 1 - ε]` inside the information ratio, so the
//!   kernels stay finite at the tails of the grid and for `c ∈ {0, 1}`.
//!
//! Every kernel is total for finite inputs. Validating per-item parameters
//! (skipping non-finite ones) is the caller's job.

/// Clamp applied to `P` in the information denominator.
pub const PROB_EPSILON: f64 = 1e-9;

/// Floor applied to test information before taking `1 / sqrt(·)`.
pub const SEM_EPSILON: f64 = 1e-9;

/// The `(a, b, c)` triple of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl ItemParams {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

/// Standard logistic function.
pub fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Probability of a correct response (the item characteristic curve).
///
/// No bounds checking: out-of-range parameters give valid-but-extreme values.
pub fn probability(a: f64, b: f64, c: f64, theta: f64) -> f64 {
    c + (1.0 - c) * logistic(a * (theta - b))
}

/// Item information at `theta`. `c` is clamped to `[0, 1]`.
pub fn information(a: f64, b: f64, c: f64, theta: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    let l = logistic(a * (theta - b));
    let p = (c + (1.0 - c) * l).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
    let slope = a * (1.0 - c) * l * (1.0 - l);
    slope * slope / (p * (1.0 - p))
}

/// Item information evaluated on every node of `theta`.
pub fn information_curve(item: ItemParams, theta: &[f64]) -> Vec<f64> {
    theta
        .iter()
        .map(|&t| information(item.a, item.b, item.c, t))
        .collect()
}

/// Test information: the sum of item information over `items`, per node.
pub fn test_information(items: &[ItemParams], theta: &[f64]) -> Vec<f64> {
    let mut total = vec![0.0; theta.len()];
    for item in items {
        for (acc, &t) in total.iter_mut().zip(theta) {
            *acc += information(item.a, item.b, item.c, t);
        }
    }
    total
}

/// Standard error of measurement, `1 / sqrt(max(tif, ε))` elementwise.
///
/// Never infinite or NaN: `f64::max` discards a NaN operand.
pub fn sem(tif: &[f64]) -> Vec<f64> {
    tif.iter().map(|&v| 1.0 / v.max(SEM_EPSILON).sqrt()).collect()
}
