//! Tape-based reverse-mode automatic differentiation.
//!
//! A [`Tape`] is an append-only list of nodes. One backward sweep from an
//! output yields the adjoint of every node before it, so a score row costs a
//! single trace however wide the input is.
//!
//! Densities written against [`Scalar`](crate::scalar::Scalar) record onto a
//! per-thread tape through [`TapeVar`]; see [`record_gradient`].
//!
//! # Example
//! ```
//! use kgof_ad::tape::Tape;
//!
//! let mut tape = Tape::new();
//! let x = tape.var(3.0);
//! let y = tape.var(5.0);
//! let z = tape.mul(x, y);       // z = x * y = 15
//! let w = tape.add(z, x);       // w = z + x = 18
//! tape.backward(w);
//! assert_eq!(tape.adjoint(x), 6.0);  // dw/dx = y + 1 = 6
//! assert_eq!(tape.adjoint(y), 3.0);  // dw/dy = x = 3
//! ```

use std::cell::RefCell;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Handle to a node on the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var(pub(crate) usize);

/// Operation recorded on the tape.
#[derive(Debug, Clone, Copy)]
enum Op {
    /// Input variable (leaf).
    Input,
    /// Constant (adjoint never propagated).
    Const,
    // Binary ops
    Add(usize, usize),
    Sub(usize, usize),
    Mul(usize, usize),
    Div(usize, usize),
    // Unary ops
    Neg(usize),
    Ln(usize),
    Ln1p(usize),
    Exp(usize),
    Sin(usize),
    Cos(usize),
    Abs(usize),
    Powi(usize, i32),
}

/// Node on the tape: value + operation that produced it.
#[derive(Debug, Clone)]
struct Node {
    val: f64,
    op: Op,
}

/// Reverse-mode AD tape.
///
/// Nodes are appended by the recording methods and never rewritten, so a
/// [`Var`] stays valid until the tape is truncated below it.
#[derive(Debug)]
pub struct Tape {
    nodes: Vec<Node>,
    adjoints: Vec<f64>,
}

impl Tape {
    /// Create an empty tape.
    pub fn new() -> Self {
        Self { nodes: Vec::new(), adjoints: Vec::new() }
    }

    /// Create a tape pre-allocated for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity), adjoints: Vec::with_capacity(capacity) }
    }

    /// Number of nodes on the tape.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tape is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clear the tape for reuse (avoids reallocation).
    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.adjoints.clear();
    }

    /// Drop every node recorded after the first `len`.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        self.adjoints.truncate(len);
    }

    #[inline]
    fn push(&mut self, val: f64, op: Op) -> Var {
        let idx = self.nodes.len();
        self.nodes.push(Node { val, op });
        Var(idx)
    }

    // --- Leaf constructors ---

    /// Record an input variable.
    #[inline]
    pub fn var(&mut self, val: f64) -> Var {
        self.push(val, Op::Input)
    }

    /// Record a constant (gradient never flows through it).
    #[inline]
    pub fn constant(&mut self, val: f64) -> Var {
        self.push(val, Op::Const)
    }

    // --- Value access ---

    /// Get the primal value of a node.
    #[inline]
    pub fn val(&self, v: Var) -> f64 {
        self.nodes[v.0].val
    }

    // --- Binary operations ---

    /// `a + b`
    #[inline]
    pub fn add(&mut self, a: Var, b: Var) -> Var {
        let val = self.nodes[a.0].val + self.nodes[b.0].val;
        self.push(val, Op::Add(a.0, b.0))
    }

    /// `a - b`
    #[inline]
    pub fn sub(&mut self, a: Var, b: Var) -> Var {
        let val = self.nodes[a.0].val - self.nodes[b.0].val;
        self.push(val, Op::Sub(a.0, b.0))
    }

    /// `a * b`
    #[inline]
    pub fn mul(&mut self, a: Var, b: Var) -> Var {
        let val = self.nodes[a.0].val * self.nodes[b.0].val;
        self.push(val, Op::Mul(a.0, b.0))
    }

    /// `a / b`
    #[inline]
    pub fn div(&mut self, a: Var, b: Var) -> Var {
        let val = self.nodes[a.0].val / self.nodes[b.0].val;
        self.push(val, Op::Div(a.0, b.0))
    }

    // --- Unary operations ---

    /// `-a`
    #[inline]
    pub fn neg(&mut self, a: Var) -> Var {
        let val = -self.nodes[a.0].val;
        self.push(val, Op::Neg(a.0))
    }

    /// `ln(a)`
    #[inline]
    pub fn ln(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.ln();
        self.push(val, Op::Ln(a.0))
    }

    /// `ln(1 + a)`
    #[inline]
    pub fn ln_1p(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.ln_1p();
        self.push(val, Op::Ln1p(a.0))
    }

    /// `exp(a)`
    #[inline]
    pub fn exp(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.exp();
        self.push(val, Op::Exp(a.0))
    }

    /// `sin(a)`
    #[inline]
    pub fn sin(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.sin();
        self.push(val, Op::Sin(a.0))
    }

    /// `cos(a)`
    #[inline]
    pub fn cos(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.cos();
        self.push(val, Op::Cos(a.0))
    }

    /// `|a|`; the adjoint follows `signum(a)`.
    #[inline]
    pub fn abs(&mut self, a: Var) -> Var {
        let val = self.nodes[a.0].val.abs();
        self.push(val, Op::Abs(a.0))
    }

    /// `a^n` (integer exponent)
    pub fn powi(&mut self, a: Var, n: i32) -> Var {
        let val = self.nodes[a.0].val.powi(n);
        self.push(val, Op::Powi(a.0, n))
    }

    // --- Backward pass ---

    /// Run reverse-mode AD from output node `out`.
    ///
    /// After calling this, use [`adjoint`](Tape::adjoint) to read ∂out/∂x
    /// for any input `x`.
    pub fn backward(&mut self, out: Var) {
        let n = self.nodes.len();
        self.adjoints.resize(n, 0.0);
        self.adjoints.fill(0.0);
        self.adjoints[out.0] = 1.0;

        // Nodes recorded after `out` cannot feed into it.
        for i in (0..=out.0).rev() {
            let adj = self.adjoints[i];
            if adj == 0.0 {
                continue;
            }

            match self.nodes[i].op {
                Op::Input | Op::Const => {}
                Op::Add(a, b) => {
                    self.adjoints[a] += adj;
                    self.adjoints[b] += adj;
                }
                Op::Sub(a, b) => {
                    self.adjoints[a] += adj;
                    self.adjoints[b] -= adj;
                }
                Op::Mul(a, b) => {
                    let va = self.nodes[a].val;
                    let vb = self.nodes[b].val;
                    self.adjoints[a] += adj * vb;
                    self.adjoints[b] += adj * va;
                }
                Op::Div(a, b) => {
                    let va = self.nodes[a].val;
                    let vb = self.nodes[b].val;
                    self.adjoints[a] += adj / vb;
                    self.adjoints[b] -= adj * va / (vb * vb);
                }
                Op::Neg(a) => {
                    self.adjoints[a] -= adj;
                }
                Op::Ln(a) => {
                    self.adjoints[a] += adj / self.nodes[a].val;
                }
                Op::Ln1p(a) => {
                    self.adjoints[a] += adj / (1.0 + self.nodes[a].val);
                }
                Op::Exp(a) => {
                    self.adjoints[a] += adj * self.nodes[i].val;
                }
                Op::Sin(a) => {
                    self.adjoints[a] += adj * self.nodes[a].val.cos();
                }
                Op::Cos(a) => {
                    self.adjoints[a] -= adj * self.nodes[a].val.sin();
                }
                Op::Abs(a) => {
                    self.adjoints[a] += adj * self.nodes[a].val.signum();
                }
                Op::Powi(a, n) => {
                    self.adjoints[a] += adj * (n as f64) * self.nodes[a].val.powi(n - 1);
                }
            }
        }
    }

    /// Read ∂output/∂v after calling [`backward`](Tape::backward).
    #[inline]
    pub fn adjoint(&self, v: Var) -> f64 {
        self.adjoints.get(v.0).copied().unwrap_or(0.0)
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

// --- Thread-local recording ---

thread_local! {
    static TAPE: RefCell<Tape> = RefCell::new(Tape::with_capacity(256));
}

/// Scalar handle onto the current thread's tape.
///
/// Arithmetic on `TapeVar`s records nodes, so any code generic over
/// [`Scalar`](crate::scalar::Scalar) can be traced for reverse-mode AD.
/// Handles are only meaningful inside [`record_gradient`] on the thread
/// that created them.
#[derive(Debug, Clone, Copy)]
pub struct TapeVar(Var);

impl TapeVar {
    #[inline]
    fn record(f: impl FnOnce(&mut Tape) -> Var) -> Self {
        TAPE.with(|t| TapeVar(f(&mut t.borrow_mut())))
    }

    #[inline]
    fn unary(self, f: impl FnOnce(&mut Tape, Var) -> Var) -> Self {
        Self::record(|t| f(t, self.0))
    }

    #[inline]
    fn binary(self, rhs: Self, f: impl FnOnce(&mut Tape, Var, Var) -> Var) -> Self {
        Self::record(|t| f(t, self.0, rhs.0))
    }

    /// Record a constant on the thread-local tape.
    #[inline]
    pub fn constant(val: f64) -> Self {
        Self::record(|t| t.constant(val))
    }


    /// `ln(self)`
    pub fn ln(self) -> Self {
        self.unary(Tape::ln)
    }

    /// `ln(1 + self)`
    pub fn ln_1p(self) -> Self {
        self.unary(Tape::ln_1p)
    }

    /// `exp(self)`
    pub fn exp(self) -> Self {
        self.unary(Tape::exp)
    }

    /// `sin(self)`
    pub fn sin(self) -> Self {
        self.unary(Tape::sin)
    }

    /// `cos(self)`
    pub fn cos(self) -> Self {
        self.unary(Tape::cos)
    }

    /// `|self|`
    pub fn abs(self) -> Self {
        self.unary(Tape::abs)
    }

    /// `self^n` (integer exponent)
    pub fn powi(self, n: i32) -> Self {
        self.unary(|t, a| t.powi(a, n))
    }
}

impl Add for TapeVar {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.binary(rhs, Tape::add)
    }
}

impl Sub for TapeVar {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.binary(rhs, Tape::sub)
    }
}

impl Mul for TapeVar {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.binary(rhs, Tape::mul)
    }
}

impl Div for TapeVar {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.binary(rhs, Tape::div)
    }
}

impl Neg for TapeVar {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.unary(Tape::neg)
    }
}

impl Sum for TapeVar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut iter = iter;
        match iter.next() {
            Some(first) => iter.fold(first, |acc, x| acc + x),
            None => TapeVar::constant(0.0),
        }
    }
}

/// Trace `f` at `x` on the thread-local tape and write `∇f(x)` into `grad`.
///
/// Returns `f(x)`. The recorded nodes are dropped before returning, so calls
/// may nest and may run concurrently on different threads.
///
/// # Panics
/// Panics if `grad.len() != x.len()`.
pub fn record_gradient<F>(x: &[f64], grad: &mut [f64], f: F) -> f64
where
    F: FnOnce(&[TapeVar]) -> TapeVar,
{
    assert_eq!(x.len(), grad.len(), "gradient buffer length must match input length");

    let base = TAPE.with(|t| t.borrow().len());
    let inputs: Vec<TapeVar> = x.iter().map(|&v| TapeVar::record(|t| t.var(v))).collect();
    let out = f(&inputs);

    TAPE.with(|t| {
        let mut t = t.borrow_mut();
        t.backward(out.0);
        for (g, v) in grad.iter_mut().zip(&inputs) {
            *g = t.adjoint(v.0);
        }
        let value = t.val(out.0);
        t.truncate(base);
        value
    })
}
