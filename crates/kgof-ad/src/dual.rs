//! Forward-mode automatic differentiation via dual numbers.
//!
//! A [`Dual`] carries a value and one tangent, so a full gradient of an
//! `R^d -> R` function takes `d` evaluations, each seeding one coordinate.

use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// An f64 dual number for forward-mode AD.
///
/// `val` holds the primal value, `dot` holds the derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    /// Primal (function) value.
    pub val: f64,
    /// Tangent (derivative) value.
    pub dot: f64,
}

impl Dual {
    /// Create a constant (derivative = 0).
    #[inline]
    pub fn constant(val: f64) -> Self {
        Self { val, dot: 0.0 }
    }

    /// Create an independent variable (derivative = 1).
    #[inline]
    pub fn var(val: f64) -> Self {
        Self { val, dot: 1.0 }
    }

    /// Natural logarithm: d/dx ln(x) = 1/x.
    #[inline]
    pub fn ln(self) -> Self {
        Self { val: self.val.ln(), dot: self.dot / self.val }
    }

    /// `ln(1 + x)`: d/dx = 1/(1+x). Accurate for tiny `x`.
    #[inline]
    pub fn ln_1p(self) -> Self {
        Self { val: self.val.ln_1p(), dot: self.dot / (1.0 + self.val) }
    }

    /// Exponential: d/dx exp(x) = exp(x).
    #[inline]
    pub fn exp(self) -> Self {
        let e = self.val.exp();
        Self { val: e, dot: self.dot * e }
    }

    /// Sine: d/dx sin(x) = cos(x).
    #[inline]
    pub fn sin(self) -> Self {
        let (s, c) = self.val.sin_cos();
        Self { val: s, dot: self.dot * c }
    }

    /// Cosine: d/dx cos(x) = -sin(x).
    #[inline]
    pub fn cos(self) -> Self {
        let (s, c) = self.val.sin_cos();
        Self { val: c, dot: -self.dot * s }
    }

    /// Integer power: d/dx x^n = n * x^(n-1).
    #[inline]
    pub fn powi(self, n: i32) -> Self {
        Self { val: self.val.powi(n), dot: self.dot * (n as f64) * self.val.powi(n - 1) }
    }

    /// Absolute value: d/dx |x| = sign(x).
    #[inline]
    pub fn abs(self) -> Self {
        Self { val: self.val.abs(), dot: self.dot * self.val.signum() }
    }
}

// --- Arithmetic: Dual op Dual ---

impl Add for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self { val: self.val + rhs.val, dot: self.dot + rhs.dot }
    }
}

impl Sub for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self { val: self.val - rhs.val, dot: self.dot - rhs.dot }
    }
}

impl Mul for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self { val: self.val * rhs.val, dot: self.dot * rhs.val + self.val * rhs.dot }
    }
}

impl Div for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self {
            val: self.val / rhs.val,
            dot: (self.dot * rhs.val - self.val * rhs.dot) / (rhs.val * rhs.val),
        }
    }
}

impl Neg for Dual {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self { val: -self.val, dot: -self.dot }
    }
}

// --- Arithmetic: Dual op f64 ---

impl Add<f64> for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self { val: self.val + rhs, dot: self.dot }
    }
}

impl Sub<f64> for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self { val: self.val - rhs, dot: self.dot }
    }
}

impl Mul<f64> for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self { val: self.val * rhs, dot: self.dot * rhs }
    }
}

impl Div<f64> for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self { val: self.val / rhs, dot: self.dot / rhs }
    }
}

// --- Sum ---

impl Sum for Dual {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Dual::constant(0.0), |acc, x| acc + x)
    }
}
