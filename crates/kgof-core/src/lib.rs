//! # kgof-core
//!
//! Shared vocabulary for the kgof crates: the error taxonomy, common data
//! types, and the capability traits that let density code hand out samplers
//! without depending on how they sample.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::DataSource;
pub use types::{Capabilities, GradientKind};
