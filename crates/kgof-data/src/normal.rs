use kgof_core::{DataSource, Error, Result};
use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::check_sample_size;

fn standard_normal_matrix(rng: &mut StdRng, n: usize, d: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, d, |_, _| StandardNormal.sample(rng))
}

/// Sampler for `N(mean, variance * I)`.
#[derive(Debug, Clone)]
pub struct DsIsotropicNormal {
    mean: DVector<f64>,
    variance: f64,
}

impl DsIsotropicNormal {
    /// Create the sampler. `variance` must be finite and > 0.
    pub fn new(mean: DVector<f64>, variance: f64) -> Result<Self> {
        if !variance.is_finite() || variance <= 0.0 {
            return Err(Error::Validation(format!(
                "variance must be finite and > 0, got {}",
                variance
            )));
        }
        Ok(Self { mean, variance })
    }
}

impl DataSource for DsIsotropicNormal {
    fn dim(&self) -> usize {
        self.mean.len()
    }

    fn sample(&self, n: usize, seed: u64) -> Result<DMatrix<f64>> {
        check_sample_size(n)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let sd = self.variance.sqrt();
        let mut x = standard_normal_matrix(&mut rng, n, self.dim());
        for mut row in x.row_iter_mut() {
            for (v, &m) in row.iter_mut().zip(self.mean.iter()) {
                *v = *v * sd + m;
            }
        }
        Ok(x)
    }

    fn name(&self) -> &str {
        "isotropic_normal"
    }
}

/// Sampler for `N(mean, cov)` through the Cholesky factor of `cov`.
#[derive(Debug, Clone)]
pub struct DsNormal {
    mean: DVector<f64>,
    chol_l: DMatrix<f64>,
}

impl DsNormal {
    /// Create the sampler; `cov` must be square, match `mean`, and be SPD.
    pub fn new(mean: DVector<f64>, cov: &DMatrix<f64>) -> Result<Self> {
        let d = mean.len();
        if cov.nrows() != d || cov.ncols() != d {
            return Err(Error::Validation(format!(
                "cov must be {d}x{d} to match mean, got {}x{}",
                cov.nrows(),
                cov.ncols()
            )));
        }
        let chol = cov.clone().cholesky().ok_or_else(|| {
            Error::Computation("covariance not SPD (Cholesky failed)".to_string())
        })?;
        Ok(Self { mean, chol_l: chol.l() })
    }
}

impl DataSource for DsNormal {
    fn dim(&self) -> usize {
        self.mean.len()
    }

    fn sample(&self, n: usize, seed: u64) -> Result<DMatrix<f64>> {
        check_sample_size(n)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let z = standard_normal_matrix(&mut rng, n, self.dim());
        // Rows are z_i^T L^T = (L z_i)^T.
        let mut x = z * self.chol_l.transpose();
        for mut row in x.row_iter_mut() {
            for (v, &m) in row.iter_mut().zip(self.mean.iter()) {
                *v += m;
            }
        }
        log::debug!("DsNormal: drew {} points in dimension {}", n, self.dim());
        Ok(x)
    }

    fn name(&self) -> &str {
        "normal"
    }
}
