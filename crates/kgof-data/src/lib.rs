//! # kgof-data
//!
//! Data sources: samplers that draw exact points from the normalized
//! counterpart of a density family. Densities hand these out through
//! [`kgof_core::DataSource`]; evaluation code never samples.
//!
//! Every sampler is deterministic for a fixed seed.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Isotropic and full-covariance multivariate normal samplers.
pub mod normal;
/// Gibbs sampler for the Gaussian-Bernoulli RBM.
pub mod rbm;

pub use normal::{DsIsotropicNormal, DsNormal};
pub use rbm::{DsGaussBernRBM, GibbsConfig};

use kgof_core::{Error, Result};

pub(crate) fn check_sample_size(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::Validation("sample size n must be > 0".to_string()));
    }
    Ok(())
}
