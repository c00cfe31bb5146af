//! Core traits for kgof
//!
//! Density code returns samplers through [`DataSource`] so that it never
//! depends on a concrete sampling algorithm.

use crate::Result;
use nalgebra::DMatrix;

/// Sampler for the normalized counterpart of a density.
pub trait DataSource: Send + Sync {
    /// Width of each drawn point.
    fn dim(&self) -> usize;

    /// Draw `n` points as an `n x dim` matrix.
    ///
    /// The same `seed` must always produce the same sample.
    fn sample(&self, n: usize, seed: u64) -> Result<DMatrix<f64>>;

    /// Sampler name (e.g. "isotropic_normal", "gauss_bern_rbm").
    fn name(&self) -> &str;
}
