use kgof_core::{DataSource, Error, Result};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::check_sample_size;

/// Gibbs sampler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GibbsConfig {
    /// Full `h | x`, `x | h` sweeps before a chain's state is kept.
    pub burnin: usize,
}

impl Default for GibbsConfig {
    fn default() -> Self {
        Self { burnin: 2000 }
    }
}

/// Sampler for the Gaussian-Bernoulli RBM
/// `p(x, h) ∝ exp(x^T B h + b^T x + c^T h - 0.5 ||x||^2)`, `h ∈ {-1, 1}^dh`.
///
/// Runs `n` independent Gibbs chains started from `N(0, I)` and returns the
/// visible state of each after burn-in.
#[derive(Debug, Clone)]
pub struct DsGaussBernRBM {
    b_mat: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
    config: GibbsConfig,
}

impl DsGaussBernRBM {
    /// Create the sampler with the default [`GibbsConfig`].
    pub fn new(b_mat: DMatrix<f64>, b: DVector<f64>, c: DVector<f64>) -> Result<Self> {
        Self::with_config(b_mat, b, c, GibbsConfig::default())
    }

    /// Create the sampler with explicit Gibbs settings.
    pub fn with_config(
        b_mat: DMatrix<f64>,
        b: DVector<f64>,
        c: DVector<f64>,
        config: GibbsConfig,
    ) -> Result<Self> {
        let (dx, dh) = (b.len(), c.len());
        if dx == 0 || dh == 0 || b_mat.shape() != (dx, dh) {
            return Err(Error::Validation(format!(
                "RBM shape mismatch: B is {}x{}, expected {dx}x{dh} with dx, dh > 0",
                b_mat.nrows(),
                b_mat.ncols()
            )));
        }
        if config.burnin == 0 {
            return Err(Error::Validation("Gibbs burnin must be > 0".to_string()));
        }
        Ok(Self { b_mat, b, c, config })
    }

    /// Gibbs settings in use.
    pub fn config(&self) -> GibbsConfig {
        self.config
    }
}

impl DataSource for DsGaussBernRBM {
    fn dim(&self) -> usize {
        self.b.len()
    }

    fn sample(&self, n: usize, seed: u64) -> Result<DMatrix<f64>> {
        check_sample_size(n)?;
        let (dx, dh) = self.b_mat.shape();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = DMatrix::from_fn(n, dx, |_, _| StandardNormal.sample(&mut rng));
        let mut h = DMatrix::<f64>::zeros(n, dh);
        let b_t = self.b_mat.transpose();

        log::debug!(
            "DsGaussBernRBM: {n} chains, dx={dx}, dh={dh}, burnin={}",
            self.config.burnin
        );

        for _ in 0..self.config.burnin {
            // h_j | x: P(h_j = 1) = sigmoid(2 y_j) = (1 + tanh(y_j)) / 2.
            let y = &x * &self.b_mat;
            for i in 0..n {
                for j in 0..dh {
                    let p = 0.5 * (1.0 + (y[(i, j)] + self.c[j]).tanh());
                    h[(i, j)] = if rng.random::<f64>() < p { 1.0 } else { -1.0 };
                }
            }

            // x | h ~ N(B h + b, I)
            x = &h * &b_t;
            for i in 0..n {
                for j in 0..dx {
                    let z: f64 = StandardNormal.sample(&mut rng);
                    x[(i, j)] += self.b[j] + z;
                }
            }
        }
        Ok(x)
    }

    fn name(&self) -> &str {
        "gauss_bern_rbm"
    }
}
