//! Inter-arrival-time densities of nonhomogeneous Poisson processes.
//!
//! With intensity `λ(t)` and cumulative intensity `Λ(t) = ∫_0^t λ`, the first
//! arrival time has density `λ(t) exp(-Λ(t))`. Inputs are single-column
//! batches of gaps `t > 0`; the domain is not checked.

use kgof_ad::Scalar;

use crate::density::LogDensity;
use crate::transforms::ExpTransformed;

/// Arrival gaps under the linear intensity `λ(t) = 1 + b t`.
///
/// `log_den(t) = -(0.5 b t^2 + t - ln(1 + b t))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonHomPoissonLinear {
    b: f64,
}

impl NonHomPoissonLinear {
    /// Create the density with slope `b`.
    pub fn new(b: f64) -> Self {
        Self { b }
    }

    /// Slope of the intensity.
    pub fn slope(&self) -> f64 {
        self.b
    }
}

impl LogDensity for NonHomPoissonLinear {
    fn name(&self) -> &'static str {
        "NonHomPoissonLinear"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let b = S::from_f64(self.b);
        let half_b = S::from_f64(0.5 * self.b);
        let s: S = x.iter().map(|&t| half_b * t * t + t - (b * t).ln_1p()).sum();
        -s
    }

    // Already exactly λ(t) exp(-Λ(t)), which integrates to one when Λ → ∞.
    fn log_normalizer(&self) -> Option<f64> {
        (self.b >= 0.0).then_some(0.0)
    }
}

/// Arrival gaps under the sine intensity `λ(t) = b (1 + sin(w t))`.
///
/// `log_den(t) = b (-t + (cos(w t) - 1) / w) + ln(b (1 + sin(w t)))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonHomPoissonSine {
    w: f64,
    b: f64,
}

impl NonHomPoissonSine {
    /// Create the density with frequency `w` and amplitude `b`.
    pub fn new(w: f64, b: f64) -> Self {
        Self { w, b }
    }

    /// Frequency of the sine.
    pub fn frequency(&self) -> f64 {
        self.w
    }

    /// Amplitude of the intensity.
    pub fn amplitude(&self) -> f64 {
        self.b
    }
}

impl Default for NonHomPoissonSine {
    fn default() -> Self {
        Self::new(10.0, 1.0)
    }
}

impl LogDensity for NonHomPoissonSine {
    fn name(&self) -> &'static str {
        "NonHomPoissonSine"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let b = S::from_f64(self.b);
        let w = S::from_f64(self.w);
        let one = S::from_f64(1.0);
        x.iter()
            .map(|&t| {
                let wt = w * t;
                b * (-t + (wt.cos() - one) / w) + (b * (one + wt.sin())).ln()
            })
            .sum()
    }

    fn log_normalizer(&self) -> Option<f64> {
        (self.b > 0.0).then_some(0.0)
    }
}

/// [`NonHomPoissonLinear`] in log-time `x = ln t`, supported on the whole line.
///
/// `log_den(x) = -(0.5 b e^{2x} + e^x - ln(1 + b e^x) - x)`.
pub type LogPoissonLinear = ExpTransformed<NonHomPoissonLinear>;

impl LogPoissonLinear {
    /// Create the log-time density with slope `b`.
    pub fn new(b: f64) -> Self {
        ExpTransformed::wrap(NonHomPoissonLinear::new(b), "LogPoissonLinear")
    }
}
