//! Gaussian-Bernoulli Restricted Boltzmann Machine with the hidden layer
//! marginalized out.

use kgof_ad::Scalar;
use kgof_core::{DataSource, Error, Result};
use kgof_data::DsGaussBernRBM;
use nalgebra::{DMatrix, DVector};

use crate::density::{Gradient, LogDensity};
use crate::math::log_2cosh;

/// Gaussian-Bernoulli RBM.
///
/// The joint `p(x, h) ∝ exp(x^T B h + b^T x + c^T h - 0.5 ||x||^2)` with
/// `h ∈ {-1, 1}^dh` marginalizes to
///
/// `log p(x) = b·x - 0.5 ||x||^2 + Σ_j log(2 cosh((xB + c)_j)) + const`.
///
/// The score has the closed form `b - x + tanh(xB + c) B^T`.
#[derive(Debug, Clone)]
pub struct GaussBernRBM {
    b_mat: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
}

impl GaussBernRBM {
    /// Create the RBM from weights `B` (`dx x dh`), visible bias `b` (`dx`)
    /// and hidden bias `c` (`dh`).
    ///
    /// Fails with [`Error::Validation`] on a shape mismatch or an empty layer.
    pub fn new(b_mat: DMatrix<f64>, b: DVector<f64>, c: DVector<f64>) -> Result<Self> {
        let (dx, dh) = (b.len(), c.len());
        if dx == 0 || dh == 0 {
            return Err(Error::Validation(format!(
                "RBM shape mismatch: dx={dx} and dh={dh} must both be > 0"
            )));
        }
        if b_mat.shape() != (dx, dh) {
            return Err(Error::Validation(format!(
                "RBM shape mismatch: B is {}x{}, expected {dx}x{dh}",
                b_mat.nrows(),
                b_mat.ncols()
            )));
        }
        log::debug!("GaussBernRBM: dx={dx}, dh={dh}");
        Ok(Self { b_mat, b, c })
    }

    /// Weight matrix `B`.
    pub fn weights(&self) -> &DMatrix<f64> {
        &self.b_mat
    }

    /// Number of hidden units.
    pub fn hidden_dim(&self) -> usize {
        self.c.len()
    }

    fn score_batch(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut phi = x * &self.b_mat;
        for mut row in phi.row_iter_mut() {
            for (y, &cj) in row.iter_mut().zip(self.c.iter()) {
                *y = (*y + cj).tanh();
            }
        }
        let mut grad = phi * self.b_mat.transpose();
        grad -= x;
        for mut row in grad.row_iter_mut() {
            for (g, &bi) in row.iter_mut().zip(self.b.iter()) {
                *g += bi;
            }
        }
        grad
    }
}

impl LogDensity for GaussBernRBM {
    fn name(&self) -> &'static str {
        "GaussBernRBM"
    }

    fn dimension(&self) -> usize {
        self.b.len()
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let half = S::from_f64(0.5);
        let visible: S = x
            .iter()
            .zip(self.b.iter())
            .map(|(&xi, &bi)| xi * S::from_f64(bi) - half * xi * xi)
            .sum();
        let hidden: S = self
            .c
            .iter()
            .enumerate()
            .map(|(j, &cj)| {
                let y: S = x
                    .iter()
                    .enumerate()
                    .map(|(i, &xi)| xi * S::from_f64(self.b_mat[(i, j)]))
                    .sum();
                log_2cosh(y + S::from_f64(cj))
            })
            .sum();
        visible + hidden
    }

    fn score(&self) -> Gradient<Self> {
        Gradient::Analytic(Self::score_batch)
    }

    fn has_sampler(&self) -> bool {
        true
    }

    fn sampler(&self) -> Result<Box<dyn DataSource>> {
        Ok(Box::new(DsGaussBernRBM::new(self.b_mat.clone(), self.b.clone(), self.c.clone())?))
    }
}
