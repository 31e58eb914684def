//! # Error Types
//!
//! This module defines the error type shared by every part of the runtime.
//! Each variant corresponds to one failure class of the ask/tell loop:
//! inconsistent decision spaces, values outside their bounds, lifecycle
//! violations on an individual, missing properties, exhausted candidate
//! generation and evaluator malfunctions.
//!
//! Note that an *illegal* candidate is not an error. Illegality is reported
//! through [`Individual::legal`](crate::individual::Individual::legal) and scored
//! with a penalty.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use optirun::error::{OptimisationError, Result};
//!
//! fn checked_bound(lower: f64, upper: f64) -> Result<()> {
//!     if upper <= lower {
//!         return Err(OptimisationError::OutOfRange(format!(
//!             "upper bound {} must exceed lower bound {}",
//!             upper, lower
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(checked_bound(0.0, 1.0).is_ok());
//! assert!(checked_bound(1.0, 1.0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use optirun::error::{OptimisationError, OptionExt};
//!
//! fn lowest(values: &[f64]) -> optirun::error::Result<f64> {
//!     values
//!         .iter()
//!         .copied()
//!         .reduce(f64::min)
//!         .ok_or_else_opt(|| OptimisationError::EmptyPopulation)
//! }
//! ```

use thiserror::Error;

/// Represents errors that can occur while running an optimisation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimisationError {
    /// Decision vectors or spaces that must agree do not.
    #[error("Domain mismatch: {0}")]
    DomainMismatch(String),

    /// A variable, vector element or coefficient lies outside its legal bounds.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// An operation was attempted on an individual in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A property was read before anything set it.
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// The optimiser could not produce enough acceptable candidates.
    #[error(
        "Generation timeout: accepted {accepted} of {desired} candidates after {attempts} attempts"
    )]
    GenerationTimeout {
        desired: usize,
        accepted: usize,
        attempts: usize,
    },

    /// User evaluation code failed on a candidate.
    #[error("Evaluation of candidate {index} failed: {message}")]
    Evaluation { index: usize, message: String },

    /// An operation that needs at least one member was called on an empty population.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// A plain insertion was attempted on a population that already reached its target size.
    #[error("Population is full: target size {0} already reached")]
    PopulationFull(usize),

    /// Error that occurs when an invalid configuration is provided.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A specialized Result type for optimisation operations.
pub type Result<T> = std::result::Result<T, OptimisationError>;

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, OptimisationError>` using
    /// a closure to generate the error.
    fn ok_or_else_opt<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimisationError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_opt<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimisationError,
    {
        self.ok_or_else(err_fn)
    }
}
