//! Row-wise gradients of scalar functions over a batch of points.
//!
//! This is the differentiation engine behind automatic score functions:
//! given `f: R^d -> R` written against [`Scalar`], it returns the `n x d`
//! matrix whose row `i` is `∇f(X[i, :])`. Rows are independent; there is no
//! cross-row Jacobian.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::dual::Dual;
use crate::scalar::Scalar;
use crate::tape::record_gradient;

/// A scalar function of one input row, generic over the scalar type.
pub trait RowFunction {
    /// Evaluate at `row`.
    fn eval<S: Scalar>(&self, row: &[S]) -> S;
}

/// Differentiation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdMode {
    /// One dual-number pass per input coordinate.
    Forward,
    /// One traced pass plus one backward sweep per row.
    #[default]
    Reverse,
}

/// Gradient of `f` at a single `row`, written into `out`. Returns `f(row)`.
///
/// # Panics
/// Panics if `out.len() != row.len()`.
pub fn grad_row<F: RowFunction>(f: &F, row: &[f64], mode: AdMode, out: &mut [f64]) -> f64 {
    assert_eq!(row.len(), out.len(), "gradient buffer length must match row length");
    match mode {
        AdMode::Reverse => record_gradient(row, out, |v| f.eval(v)),
        AdMode::Forward => {
            let mut seeded: Vec<Dual> = row.iter().copied().map(Dual::constant).collect();
            let mut value = None;
            for j in 0..row.len() {
                seeded[j].dot = 1.0;
                let y = f.eval(&seeded);
                seeded[j].dot = 0.0;
                out[j] = y.dot;
                value.get_or_insert(y.val);
            }
            value.unwrap_or_else(|| f.eval::<f64>(row))
        }
    }
}

/// Per-row gradient of `f` over every row of `x` (`n x d` in, `n x d` out).
pub fn elementwise_grad<F: RowFunction>(f: &F, x: &DMatrix<f64>, mode: AdMode) -> DMatrix<f64> {
    let (n, d) = x.shape();
    let mut grad = DMatrix::<f64>::zeros(n, d);
    let mut row = vec![0.0; d];
    let mut g = vec![0.0; d];
    for i in 0..n {
        for (j, r) in row.iter_mut().enumerate() {
            *r = x[(i, j)];
        }
        grad_row(f, &row, mode, &mut g);
        for (j, &gj) in g.iter().enumerate() {
            grad[(i, j)] = gj;
        }
    }
    grad
}

/// Plain `f64` evaluation of `f` over every row of `x`.
pub fn eval_rows<F: RowFunction>(f: &F, x: &DMatrix<f64>) -> Vec<f64> {
    let d = x.ncols();
    let mut row = vec![0.0; d];
    (0..x.nrows())
        .map(|i| {
            for (j, r) in row.iter_mut().enumerate() {
                *r = x[(i, j)];
            }
            f.eval::<f64>(&row)
        })
        .collect()
}
