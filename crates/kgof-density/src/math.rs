//! Small numerically-stable math utilities shared by the densities.

use kgof_ad::Scalar;

/// Natural log of `2π`.
pub const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Stable `log(exp(y) + exp(-y)) = log(2 cosh y)`.
///
/// Evaluated as `|y| + ln(1 + exp(-2|y|))`, so the exponential is always in
/// `(0, 1]` and never overflows. Generic so the AD engine differentiates the
/// stable form; the derivative is `tanh(y)`, including at `y = 0`.
#[inline]
pub fn log_2cosh<S: Scalar>(y: S) -> S {
    let a = y.abs();
    a + (S::from_f64(-2.0) * a).exp().ln_1p()
}

/// Log-normalizer of a `d`-dimensional normal with covariance determinant
/// `exp(log_det)`: `-0.5 * (d ln(2π) + log_det)`.
#[inline]
pub fn mvn_log_normalizer(d: usize, log_det: f64) -> f64 {
    -0.5 * (d as f64 * LN_2PI + log_det)
}
