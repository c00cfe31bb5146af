//! Gamma-family densities, in natural and log coordinates.

use kgof_ad::Scalar;
use statrs::function::gamma::ln_gamma;

use crate::density::LogDensity;
use crate::transforms::{Bijector, ExpBijector};

fn params_are_valid(alpha: f64, beta: f64) -> bool {
    alpha.is_finite() && alpha > 0.0 && beta.is_finite() && beta > 0.0
}

fn warn_if_invalid(name: &str, alpha: f64, beta: f64) {
    if !params_are_valid(alpha, beta) {
        log::warn!("{name}: alpha={alpha}, beta={beta} must be positive; no normalizer");
    }
}

/// `alpha ln(beta) - lnΓ(alpha)` when both parameters are positive and finite.
fn gamma_log_normalizer(alpha: f64, beta: f64) -> Option<f64> {
    params_are_valid(alpha, beta).then(|| alpha * beta.ln() - ln_gamma(alpha))
}

/// Unnormalized Gamma density on `t > 0`.
///
/// `log_den(t) = -beta t + (alpha - 1) ln t`, without the `lnΓ` term.
/// `beta` enters as a rate. Inputs `t <= 0` are not checked and yield
/// NaN or infinities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gamma {
    alpha: f64,
    beta: f64,
}

impl Gamma {
    /// Create the density with shape `alpha` and scale parameter `beta`.
    pub fn new(alpha: f64, beta: f64) -> Self {
        warn_if_invalid("Gamma", alpha, beta);
        Self { alpha, beta }
    }

    /// Shape `alpha` with `beta = 1`.
    pub fn with_shape(alpha: f64) -> Self {
        Self::new(alpha, 1.0)
    }

    /// Shape parameter.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Scale parameter (used as a rate in the log-density).
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl LogDensity for Gamma {
    fn name(&self) -> &'static str {
        "Gamma"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let neg_beta = S::from_f64(-self.beta);
        let shape_m1 = S::from_f64(self.alpha - 1.0);
        x.iter().map(|&t| neg_beta * t + shape_m1 * t.ln()).sum()
    }

    fn log_normalizer(&self) -> Option<f64> {
        gamma_log_normalizer(self.alpha, self.beta)
    }
}

/// Gamma density in log coordinates `x = ln t`, supported on the whole line.
///
/// `log_den(x) = -beta e^x + (alpha - 1) x + x`, where the last `x` is the
/// Jacobian of `t = e^x`. Written out directly rather than through
/// `ln(exp(x))` so very negative inputs stay finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogGamma {
    alpha: f64,
    beta: f64,
}

impl LogGamma {
    /// Create the density with shape `alpha` and scale parameter `beta`.
    pub fn new(alpha: f64, beta: f64) -> Self {
        warn_if_invalid("LogGamma", alpha, beta);
        Self { alpha, beta }
    }

    /// Shape `alpha` with `beta = 1`.
    pub fn with_shape(alpha: f64) -> Self {
        Self::new(alpha, 1.0)
    }

    /// The same family in natural coordinates.
    pub fn natural(&self) -> Gamma {
        Gamma { alpha: self.alpha, beta: self.beta }
    }
}

impl LogDensity for LogGamma {
    fn name(&self) -> &'static str {
        "LogGamma"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let neg_beta = S::from_f64(-self.beta);
        let shape_m1 = S::from_f64(self.alpha - 1.0);
        x.iter()
            .map(|&z| {
                neg_beta * ExpBijector.forward(z)
                    + shape_m1 * z
                    + ExpBijector.log_abs_det_jacobian(z)
            })
            .sum()
    }

    fn log_normalizer(&self) -> Option<f64> {
        gamma_log_normalizer(self.alpha, self.beta)
    }
}
