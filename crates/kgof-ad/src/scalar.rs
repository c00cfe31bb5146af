//! [`Scalar`] trait: abstraction over `f64`, [`Dual`] and [`TapeVar`]
//! that lets a log-density be written once, then evaluated plainly **and**
//! differentiated in forward or reverse mode.

use crate::dual::Dual;
use crate::tape::TapeVar;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A scalar type suitable for log-density computation.
///
/// Implemented for `f64` (plain evaluation), `Dual` (forward-mode AD) and
/// `TapeVar` (reverse-mode AD on the thread-local tape).
pub trait Scalar:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Sum
    + Sized
{
    /// Wrap an `f64` constant (derivative = 0 for AD types).
    fn from_f64(v: f64) -> Self;

    /// Natural logarithm.
    fn ln(self) -> Self;

    /// `ln(1 + x)`, accurate near zero.
    fn ln_1p(self) -> Self;

    /// Exponential.
    fn exp(self) -> Self;

    /// Sine.
    fn sin(self) -> Self;

    /// Cosine.
    fn cos(self) -> Self;

    /// Integer power.
    fn powi(self, n: i32) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;
}

// --- f64 implementation ---

impl Scalar for f64 {
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }

    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }

    #[inline]
    fn sin(self) -> Self {
        f64::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        f64::cos(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

// --- Dual implementation ---

impl Scalar for Dual {
    #[inline]
    fn from_f64(v: f64) -> Self {
        Dual::constant(v)
    }

    #[inline]
    fn ln(self) -> Self {
        Dual::ln(self)
    }

    #[inline]
    fn ln_1p(self) -> Self {
        Dual::ln_1p(self)
    }

    #[inline]
    fn exp(self) -> Self {
        Dual::exp(self)
    }

    #[inline]
    fn sin(self) -> Self {
        Dual::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        Dual::cos(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        Dual::powi(self, n)
    }

    #[inline]
    fn abs(self) -> Self {
        Dual::abs(self)
    }
}

// --- TapeVar implementation ---

impl Scalar for TapeVar {
    #[inline]
    fn from_f64(v: f64) -> Self {
        TapeVar::constant(v)
    }

    #[inline]
    fn ln(self) -> Self {
        TapeVar::ln(self)
    }

    #[inline]
    fn ln_1p(self) -> Self {
        TapeVar::ln_1p(self)
    }

    #[inline]
    fn exp(self) -> Self {
        TapeVar::exp(self)
    }

    #[inline]
    fn sin(self) -> Self {
        TapeVar::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        TapeVar::cos(self)
    }

    #[inline]
    fn powi(self, n: i32) -> Self {
        TapeVar::powi(self, n)
    }

    #[inline]
    fn abs(self) -> Self {
        TapeVar::abs(self)
    }
}
