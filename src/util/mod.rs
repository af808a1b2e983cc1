//! Utility types for b3dm.
//!
//! - [`Error`] / [`Result`] - Error handling

mod error;

pub use error::*;
