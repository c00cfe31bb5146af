//! Unnormalized probability densities and their score functions.
//!
//! This crate hosts the model side of kernel goodness-of-fit testing:
//! - the density contract ([`LogDensity`], [`UnnormalizedDensity`])
//! - concrete densities (Gaussian, Gaussian-Bernoulli RBM, Poisson-process
//!   inter-arrival times, Gamma family)
//! - log-domain reparameterizations (transforms/bijectors)
//! - small numeric helpers (stable log-cosh, normal log-pdf)
//!
//! Scores come from reverse-mode AD of the log-density unless a density
//! supplies a closed form.

pub mod density;
pub mod gamma;
pub mod math;
pub mod normal;
pub mod poisson;
pub mod rbm;
pub mod transforms;

pub use density::{Gradient, LogDensity, ScoreFn, UnnormalizedDensity};
pub use gamma::{Gamma, LogGamma};
pub use normal::{IsotropicNormal, Normal};
pub use poisson::{LogPoissonLinear, NonHomPoissonLinear, NonHomPoissonSine};
pub use rbm::GaussBernRBM;
pub use transforms::{Bijector, ExpBijector, ExpTransformed};

pub use kgof_ad::AdMode;
pub use kgof_core::{Capabilities, DataSource, Error, GradientKind, Result};
