//! # kgof-ad
//!
//! Automatic differentiation (AD) primitives for kgof.
//!
//! Provides:
//! - **Forward-mode AD** via [`dual::Dual`] numbers (efficient for few inputs)
//! - **Reverse-mode AD** via a computation [`tape::Tape`], usable from generic
//!   code through the thread-local [`tape::TapeVar`]
//! - [`Scalar`](scalar::Scalar) trait for writing generic code over `f64`, `Dual` and `TapeVar`
//! - [`grad`]: row-wise gradients over a batch of points

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dual;
pub mod grad;
pub mod scalar;
pub mod tape;

pub use grad::{AdMode, RowFunction, elementwise_grad, grad_row};
pub use scalar::Scalar;
