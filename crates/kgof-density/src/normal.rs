//! Gaussian densities: isotropic and full covariance.

use kgof_ad::Scalar;
use kgof_core::{DataSource, Error, Result};
use kgof_data::{DsIsotropicNormal, DsNormal};
use nalgebra::{DMatrix, DVector};

use crate::density::LogDensity;
use crate::math::mvn_log_normalizer;

/// Eigenvalues with magnitude at or below this make a covariance rank-deficient.
const RANK_TOL: f64 = 1e-7;

fn variance_is_valid(variance: f64) -> bool {
    variance.is_finite() && variance > 0.0
}

/// Unnormalized isotropic normal `N(mean, variance * I)`.
///
/// `log_den(x) = -||x - mean||^2 / (2 variance)`. The variance is not
/// validated; a non-positive one still evaluates but has no normalizer or
/// sampler.
#[derive(Debug, Clone)]
pub struct IsotropicNormal {
    mean: DVector<f64>,
    variance: f64,
}

impl IsotropicNormal {
    /// Create the density.
    pub fn new(mean: DVector<f64>, variance: f64) -> Self {
        if !variance_is_valid(variance) {
            log::warn!("IsotropicNormal: variance {variance} is not positive; no normalizer or sampler");
        }
        Self { mean, variance }
    }

    /// Mean vector.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Scalar variance.
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

impl LogDensity for IsotropicNormal {
    fn name(&self) -> &'static str {
        "IsotropicNormal"
    }

    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let ss: S = x
            .iter()
            .zip(self.mean.iter())
            .map(|(&xi, &m)| {
                let d = xi - S::from_f64(m);
                d * d
            })
            .sum();
        -ss / S::from_f64(2.0 * self.variance)
    }

    fn log_normalizer(&self) -> Option<f64> {
        if !variance_is_valid(self.variance) {
            return None;
        }
        let d = self.mean.len();
        Some(mvn_log_normalizer(d, d as f64 * self.variance.ln()))
    }

    fn has_sampler(&self) -> bool {
        variance_is_valid(self.variance)
    }

    fn sampler(&self) -> Result<Box<dyn DataSource>> {
        Ok(Box::new(DsIsotropicNormal::new(self.mean.clone(), self.variance)?))
    }
}

/// Unnormalized multivariate normal `N(mean, cov)` with full covariance.
///
/// The precision matrix is computed once at construction from the
/// eigen-decomposition `cov = V diag(E) V^T` as `V diag(1/E) V^T`.
#[derive(Debug, Clone)]
pub struct Normal {
    mean: DVector<f64>,
    cov: DMatrix<f64>,
    prec: DMatrix<f64>,
    eigenvalues: DVector<f64>,
}

impl Normal {
    /// Create the density.
    ///
    /// Fails with [`Error::Validation`] unless `cov` is square, symmetric,
    /// matches `mean` in size, and is full rank (every eigenvalue magnitude
    /// above `1e-7`).
    pub fn new(mean: DVector<f64>, cov: DMatrix<f64>) -> Result<Self> {
        let d = mean.len();
        if cov.nrows() != cov.ncols() {
            return Err(Error::Validation(format!(
                "invalid covariance: must be square, got {}x{}",
                cov.nrows(),
                cov.ncols()
            )));
        }
        if cov.nrows() != d {
            return Err(Error::Validation(format!(
                "invalid covariance: mean has length {d} but cov is {}x{}",
                cov.nrows(),
                cov.ncols()
            )));
        }
        let scale = cov.amax().max(1.0);
        if (&cov - cov.transpose()).amax() > 1e-10 * scale {
            return Err(Error::Validation("invalid covariance: not symmetric".to_string()));
        }

        let eig = cov.clone().symmetric_eigen();
        if eig.eigenvalues.iter().any(|e| e.abs() <= RANK_TOL) {
            return Err(Error::Validation(
                "invalid covariance: matrix is not full rank".to_string(),
            ));
        }
        let inv_e = eig.eigenvalues.map(|e| 1.0 / e);
        let prec = &eig.eigenvectors * DMatrix::from_diagonal(&inv_e) * eig.eigenvectors.transpose();
        log::debug!("Normal: d={d}, precision={prec}");
        if eig.eigenvalues.iter().any(|&e| e <= 0.0) {
            log::warn!("Normal: covariance is not positive definite; no normalizer or sampler");
        }

        Ok(Self { mean, cov, prec, eigenvalues: eig.eigenvalues })
    }

    /// Mean vector.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Covariance matrix.
    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }

    /// Cached precision matrix (inverse covariance).
    pub fn precision(&self) -> &DMatrix<f64> {
        &self.prec
    }

    fn is_positive_definite(&self) -> bool {
        self.eigenvalues.iter().all(|&e| e > 0.0)
    }
}

impl LogDensity for Normal {
    fn name(&self) -> &'static str {
        "Normal"
    }

    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S {
        let d = self.mean.len();
        let x0: Vec<S> = x.iter().zip(self.mean.iter()).map(|(&xi, &m)| xi - S::from_f64(m)).collect();
        // sum_i (x0 P)_i * x0_i
        let quad: S = (0..d)
            .map(|i| {
                let x0p_i: S = (0..d).map(|j| x0[j] * S::from_f64(self.prec[(j, i)])).sum();
                x0p_i * x0[i]
            })
            .sum();
        -quad / S::from_f64(2.0)
    }

    fn log_normalizer(&self) -> Option<f64> {
        if !self.is_positive_definite() {
            return None;
        }
        let log_det: f64 = self.eigenvalues.iter().map(|e| e.ln()).sum();
        Some(mvn_log_normalizer(self.mean.len(), log_det))
    }

    fn has_sampler(&self) -> bool {
        self.is_positive_definite()
    }

    fn sampler(&self) -> Result<Box<dyn DataSource>> {
        Ok(Box::new(DsNormal::new(self.mean.clone(), &self.cov)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::UnnormalizedDensity;
    use crate::math::LN_2PI;
    use approx::assert_relative_eq;
    use kgof_core::GradientKind;

    fn normal_logpdf(x: f64, mu: f64, sigma: f64) -> f64 {
        let z = (x - mu) / sigma;
        -0.5 * z * z - sigma.ln() - 0.5 * LN_2PI
    }

    #[test]
    fn test_isotropic_end_to_end() {
        let p = IsotropicNormal::new(DVector::from_vec(vec![0.0, 0.0]), 1.0);
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        let ld = p.log_den(&x).unwrap();
        assert_relative_eq!(ld[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(ld[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_isotropic_normalized_matches_product_of_normals() {
        let mean = DVector::from_vec(vec![1.0, -0.5, 2.0]);
        let var = 2.5;
        let p = IsotropicNormal::new(mean.clone(), var);
        let x = DMatrix::from_row_slice(3, 3, &[0.0, 0.0, 0.0, 1.0, -0.5, 2.0, 3.0, 1.0, -1.0]);

        let ln = p.log_normalized_den(&x).unwrap();
        let ld = p.log_den(&x).unwrap();
        for i in 0..3 {
            let expected: f64 = (0..3).map(|j| normal_logpdf(x[(i, j)], mean[j], var.sqrt())).sum();
            assert_relative_eq!(ln[i], expected, epsilon = 1e-12);
            // Difference is the log-normalizer, independent of the row.
            assert_relative_eq!(ln[i] - ld[i], ln[0] - ld[0], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_isotropic_score_closed_form() {
        // grad = -(x - mean) / variance
        let p = IsotropicNormal::new(DVector::from_vec(vec![1.0, 2.0]), 0.5);
        let x = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 3.0, -1.0]);
        let g = p.grad_log(&x).unwrap();
        assert_eq!(p.gradient_kind(), GradientKind::Automatic);
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(g[(i, j)], -(x[(i, j)] - p.mean()[j]) / 0.5, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_isotropic_capabilities_and_datasource() {
        let p = IsotropicNormal::new(DVector::zeros(2), 1.0);
        let caps = p.capabilities();
        assert!(caps.normalized && caps.datasource && !caps.analytic_gradient);
        let ds = p.datasource().unwrap();
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.sample(4, 0).unwrap().shape(), (4, 2));
    }

    #[test]
    fn test_normal_singular_cov_rejected() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let err = Normal::new(DVector::zeros(2), cov).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("full rank"));
    }

    #[test]
    fn test_normal_shape_checks() {
        let r = Normal::new(DVector::zeros(3), DMatrix::identity(2, 2));
        assert!(matches!(r, Err(Error::Validation(_))));
        let r = Normal::new(DVector::zeros(2), DMatrix::zeros(2, 3));
        assert!(matches!(r, Err(Error::Validation(_))));
        let r = Normal::new(DVector::zeros(2), DMatrix::from_row_slice(2, 2, &[1.0, 0.3, 0.0, 1.0]));
        assert!(matches!(r, Err(Error::Validation(_))));
    }

    #[test]
    fn test_normal_precision_inverts_cov() {
        let cov = DMatrix::from_row_slice(3, 3, &[2.0, 0.5, 0.1, 0.5, 1.5, -0.3, 0.1, -0.3, 1.0]);
        let p = Normal::new(DVector::zeros(3), cov.clone()).unwrap();
        let id = &cov * p.precision();
        for i in 0..3 {
            for j in 0..3 {
                let e = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(id[(i, j)], e, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_normal_matches_isotropic_for_scaled_identity() {
        let mean = DVector::from_vec(vec![0.5, -1.0]);
        let full = Normal::new(mean.clone(), DMatrix::identity(2, 2) * 3.0).unwrap();
        let iso = IsotropicNormal::new(mean, 3.0);
        let x = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 2.0, -3.0, 0.25]);

        let (a, b) = (full.log_den(&x).unwrap(), iso.log_den(&x).unwrap());
        let (na, nb) = (full.log_normalized_den(&x).unwrap(), iso.log_normalized_den(&x).unwrap());
        let (ga, gb) = (full.grad_log(&x).unwrap(), iso.grad_log(&x).unwrap());
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = 1e-10);
            assert_relative_eq!(na[i], nb[i], epsilon = 1e-10);
            for j in 0..2 {
                assert_relative_eq!(ga[(i, j)], gb[(i, j)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_normal_score_is_minus_precision_times_offset() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.6, 0.6, 2.0]);
        let mean = DVector::from_vec(vec![1.0, -1.0]);
        let p = Normal::new(mean.clone(), cov).unwrap();
        let x = DMatrix::from_row_slice(1, 2, &[0.3, 0.7]);
        let g = p.grad_log(&x).unwrap();

        let x0 = DVector::from_vec(vec![0.3 - 1.0, 0.7 + 1.0]);
        let expected = -(p.precision() * x0);
        assert_relative_eq!(g[(0, 0)], expected[0], epsilon = 1e-10);
        assert_relative_eq!(g[(0, 1)], expected[1], epsilon = 1e-10);
    }

    #[test]
    fn test_indefinite_cov_has_no_normalizer_or_sampler() {
        // Full rank but not positive definite: constructs, but cannot normalize.
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let p = Normal::new(DVector::zeros(2), cov).unwrap();
        let caps = p.capabilities();
        assert!(!caps.normalized && !caps.datasource);
        assert!(matches!(p.log_normalized_den(&DMatrix::zeros(1, 2)), Err(Error::NotImplemented(_))));
    }

    #[test]
    fn test_indefinite_cov_datasource_reports_cholesky_failure() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let p = Normal::new(DVector::zeros(2), cov).unwrap();
        assert!(matches!(p.datasource(), Err(Error::Computation(_))));
    }

    #[test]
    fn test_nonpositive_isotropic_variance_datasource_is_validation_error() {
        let p = IsotropicNormal::new(DVector::zeros(2), -1.0);
        assert!(!p.capabilities().datasource);
        assert!(matches!(p.datasource(), Err(Error::Validation(_))));
    }
}
