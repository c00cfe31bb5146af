//! Common data types for kgof

use serde::{Deserialize, Serialize};

/// How a density produces its score function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientKind {
    /// Differentiated from the log-density by the AD engine.
    Automatic,
    /// Closed-form score supplied by the density.
    Analytic,
}

/// Optional capabilities a density declares up front.
///
/// Lets callers branch on availability instead of probing for
/// `NotImplemented` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Score comes from a closed form rather than the AD engine.
    pub analytic_gradient: bool,
    /// Exact normalized log-density is available.
    pub normalized: bool,
    /// A sampler for the normalized density is available.
    pub datasource: bool,
}

impl Capabilities {
    /// Gradient kind implied by these capabilities.
    pub fn gradient_kind(&self) -> GradientKind {
        if self.analytic_gradient { GradientKind::Analytic } else { GradientKind::Automatic }
    }
}
