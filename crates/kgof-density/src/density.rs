//! The unnormalized-density contract.
//!
//! A variant implements [`LogDensity`]: its input width and a per-row
//! log-density written once against [`Scalar`]. Everything callers use,
//! batch evaluation, score functions and the optional capabilities, comes
//! from the blanket [`UnnormalizedDensity`] impl, which is object-safe.

use kgof_ad::grad::eval_rows;
use kgof_ad::{AdMode, RowFunction, Scalar, elementwise_grad};
use kgof_core::{Capabilities, DataSource, Error, GradientKind, Result};
use nalgebra::{DMatrix, DVector};

/// Closed-form score over a batch: `n x d` points in, `n x d` gradients out.
pub type ScoreFn<D> = fn(&D, &DMatrix<f64>) -> DMatrix<f64>;

/// Score strategy recorded by a density.
pub enum Gradient<D> {
    /// Differentiate [`LogDensity::log_den_row`] with the AD engine.
    Automatic,
    /// Use the given closed form. Must agree with the automatic score.
    Analytic(ScoreFn<D>),
}

/// A density defined by its unnormalized log-density.
pub trait LogDensity: Send + Sync + Sized {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    /// Expected input width `d`.
    fn dimension(&self) -> usize;

    /// Unnormalized log-density at one point `x` (length `d`).
    fn log_den_row<S: Scalar>(&self, x: &[S]) -> S;

    /// How the score is computed.
    fn score(&self) -> Gradient<Self> {
        Gradient::Automatic
    }

    /// Constant that turns `log_den` into the exact normalized log-density.
    fn log_normalizer(&self) -> Option<f64> {
        None
    }

    /// Whether [`sampler`](Self::sampler) succeeds for these parameters.
    ///
    /// Decided from the parameters alone; never builds a sampler.
    fn has_sampler(&self) -> bool {
        false
    }

    /// Sampler for the normalized counterpart.
    ///
    /// Densities without one keep the default [`Error::NotImplemented`].
    /// Construction failures (e.g. a covariance with no Cholesky factor)
    /// surface as the sampler's own error.
    fn sampler(&self) -> Result<Box<dyn DataSource>> {
        Err(Error::NotImplemented(format!("data source for {}", self.name())))
    }
}

/// Object-safe evaluation interface, implemented for every [`LogDensity`].
pub trait UnnormalizedDensity: Send + Sync {
    /// Expected input width `d`.
    fn dim(&self) -> usize;

    /// Unnormalized log-density of each row of `x` (`n x d`), length `n`.
    fn log_den(&self, x: &DMatrix<f64>) -> Result<DVector<f64>>;

    /// Score (gradient of the log-density w.r.t. the input) of each row.
    ///
    /// Uses the density's closed form when it has one, otherwise
    /// reverse-mode AD of the log-density.
    fn grad_log(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Score through the AD engine in the given mode, ignoring any closed form.
    fn grad_log_with(&self, x: &DMatrix<f64>, mode: AdMode) -> Result<DMatrix<f64>>;

    /// Exact normalized log-density of each row.
    ///
    /// Fails with [`Error::NotImplemented`] when no normalizer is known.
    fn log_normalized_den(&self, x: &DMatrix<f64>) -> Result<DVector<f64>>;

    /// Sampler for the normalized counterpart.
    ///
    /// Fails with [`Error::NotImplemented`] when the density has none, or
    /// with the sampler's construction error when its parameters admit none.
    fn datasource(&self) -> Result<Box<dyn DataSource>>;

    /// Which optional capabilities this density provides.
    fn capabilities(&self) -> Capabilities;

    /// Automatic or analytic score.
    fn gradient_kind(&self) -> GradientKind;
}

/// Adapts a density to the engine's [`RowFunction`].
struct LogDenRow<'a, D>(&'a D);

impl<D: LogDensity> RowFunction for LogDenRow<'_, D> {
    fn eval<S: Scalar>(&self, row: &[S]) -> S {
        self.0.log_den_row(row)
    }
}

fn check_width<D: LogDensity>(density: &D, x: &DMatrix<f64>) -> Result<()> {
    let d = density.dimension();
    if x.ncols() != d {
        return Err(Error::Validation(format!(
            "{} expects input of width {d}, got {}",
            density.name(),
            x.ncols()
        )));
    }
    Ok(())
}

impl<D: LogDensity> UnnormalizedDensity for D {
    fn dim(&self) -> usize {
        self.dimension()
    }

    fn log_den(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        check_width(self, x)?;
        Ok(DVector::from_vec(eval_rows(&LogDenRow(self), x)))
    }

    fn grad_log(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        match self.score() {
            Gradient::Analytic(score) => {
                check_width(self, x)?;
                Ok(score(self, x))
            }
            Gradient::Automatic => self.grad_log_with(x, AdMode::Reverse),
        }
    }

    fn grad_log_with(&self, x: &DMatrix<f64>, mode: AdMode) -> Result<DMatrix<f64>> {
        check_width(self, x)?;
        Ok(elementwise_grad(&LogDenRow(self), x, mode))
    }

    fn log_normalized_den(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let log_z = self.log_normalizer().ok_or_else(|| {
            Error::NotImplemented(format!("normalized log-density for {}", self.name()))
        })?;
        Ok(self.log_den(x)?.add_scalar(log_z))
    }

    fn datasource(&self) -> Result<Box<dyn DataSource>> {
        self.sampler()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            analytic_gradient: self.gradient_kind() == GradientKind::Analytic,
            normalized: self.log_normalizer().is_some(),
            datasource: self.has_sampler(),
        }
    }

    fn gradient_kind(&self) -> GradientKind {
        match self.score() {
            Gradient::Analytic(_) => GradientKind::Analytic,
            Gradient::Automatic => GradientKind::Automatic,
        }
    }
}
