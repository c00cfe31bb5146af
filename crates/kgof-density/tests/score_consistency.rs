//! Score functions against independent references.
//!
//! 1. Automatic scores match central finite differences of `log_den`.
//! 2. Forward- and reverse-mode AD agree.
//! 3. The RBM's closed-form score matches AD of its own `log_den` over random
//!    parameter sets.

use approx::assert_relative_eq;
use kgof_density::{
    AdMode, Gamma, GaussBernRBM, IsotropicNormal, LogGamma, LogPoissonLinear, NonHomPoissonLinear,
    NonHomPoissonSine, Normal, UnnormalizedDensity,
};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

fn boxed<D: UnnormalizedDensity + 'static>(density: D) -> Box<dyn UnnormalizedDensity> {
    Box::new(density)
}

/// Central finite-difference gradient of `log_den`, row by row.
fn finite_difference_grad(p: &dyn UnnormalizedDensity, x: &DMatrix<f64>) -> DMatrix<f64> {
    let h = 1e-5;
    let mut g = DMatrix::zeros(x.nrows(), x.ncols());
    for j in 0..x.ncols() {
        let mut xp = x.clone();
        let mut xm = x.clone();
        xp.column_mut(j).add_scalar_mut(h);
        xm.column_mut(j).add_scalar_mut(-h);
        let lp = p.log_den(&xp).unwrap();
        let lm = p.log_den(&xm).unwrap();
        for i in 0..x.nrows() {
            g[(i, j)] = (lp[i] - lm[i]) / (2.0 * h);
        }
    }
    g
}

fn assert_matches_finite_difference(p: &dyn UnnormalizedDensity, x: &DMatrix<f64>) {
    let fd = finite_difference_grad(p, x);
    let ad = p.grad_log(x).unwrap();
    assert_eq!(ad.shape(), x.shape());
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            let tol = 1e-5 * ad[(i, j)].abs().max(1.0);
            assert!(
                (ad[(i, j)] - fd[(i, j)]).abs() <= tol,
                "row {i} col {j}: ad={} fd={}",
                ad[(i, j)],
                fd[(i, j)]
            );
        }
    }
}

fn assert_modes_agree(p: &dyn UnnormalizedDensity, x: &DMatrix<f64>) {
    let fwd = p.grad_log_with(x, AdMode::Forward).unwrap();
    let rev = p.grad_log_with(x, AdMode::Reverse).unwrap();
    for (a, b) in fwd.iter().zip(rev.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-12, max_relative = 1e-12);
    }
}

fn random_matrix(rng: &mut StdRng, n: usize, d: usize, scale: f64) -> DMatrix<f64> {
    DMatrix::from_fn(n, d, |_, _| {
        let z: f64 = StandardNormal.sample(rng);
        scale * z
    })
}

fn positive_column(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(values.len(), 1, values)
}

#[test]
fn test_every_variant_matches_finite_differences() {
    let mut rng = StdRng::seed_from_u64(2024);
    let x3 = random_matrix(&mut rng, 6, 3, 1.0);
    let x_line = random_matrix(&mut rng, 6, 1, 1.0);
    let t = positive_column(&[0.1, 0.25, 0.9, 1.7, 3.0]);

    let cov = DMatrix::from_row_slice(3, 3, &[2.0, 0.5, 0.1, 0.5, 1.5, -0.3, 0.1, -0.3, 1.0]);
    let rbm = GaussBernRBM::new(
        random_matrix(&mut rng, 3, 2, 1.0),
        DVector::from_vec(vec![0.1, -0.2, 0.3]),
        DVector::from_vec(vec![0.5, -1.0]),
    )
    .unwrap();

    let cases: Vec<(Box<dyn UnnormalizedDensity>, &DMatrix<f64>)> = vec![
        (boxed(IsotropicNormal::new(DVector::from_vec(vec![1.0, 0.0, -1.0]), 0.7)), &x3),
        (boxed(Normal::new(DVector::from_vec(vec![0.5, 0.0, -0.5]), cov).unwrap()), &x3),
        (boxed(rbm), &x3),
        (boxed(NonHomPoissonLinear::new(1.5)), &t),
        (boxed(NonHomPoissonSine::default()), &t),
        (boxed(Gamma::new(2.5, 1.2)), &t),
        (boxed(LogGamma::new(2.5, 1.2)), &x_line),
        (boxed(LogPoissonLinear::new(0.8)), &x_line),
    ];

    for (p, x) in &cases {
        assert_eq!(p.dim(), x.ncols());
        assert_matches_finite_difference(p.as_ref(), x);
        assert_modes_agree(p.as_ref(), x);
    }
}

#[test]
fn test_rbm_analytic_score_matches_autodiff_random_parameters() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let dx = rng.random_range(1..=5);
        let dh = rng.random_range(1..=5);
        let rbm = GaussBernRBM::new(
            random_matrix(&mut rng, dx, dh, 1.0),
            DVector::from_iterator(dx, (0..dx).map(|_| StandardNormal.sample(&mut rng))),
            DVector::from_iterator(dh, (0..dh).map(|_| StandardNormal.sample(&mut rng))),
        )
        .unwrap();
        let x = random_matrix(&mut rng, 8, dx, 2.0);

        let analytic = rbm.grad_log(&x).unwrap();
        let auto = rbm.grad_log_with(&x, AdMode::Reverse).unwrap();
        for (a, b) in analytic.iter().zip(auto.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-6, max_relative = 1e-6);
        }
    }
}

#[test]
fn test_rbm_log_den_finite_for_large_preactivations() {
    let mut rng = StdRng::seed_from_u64(99);
    let rbm = GaussBernRBM::new(
        random_matrix(&mut rng, 4, 3, 10.0),
        DVector::zeros(4),
        DVector::from_vec(vec![50.0, -50.0, 0.0]),
    )
    .unwrap();
    let x = random_matrix(&mut rng, 20, 4, 3.0);
    let pre = &x * rbm.weights();
    assert!(pre.amax() > 20.0);

    let ld = rbm.log_den(&x).unwrap();
    let g = rbm.grad_log(&x).unwrap();
    assert!(ld.iter().all(|v| v.is_finite()));
    assert!(g.iter().all(|v| v.is_finite()));
}
