//! # Evaluation
//!
//! The boundary between the runtime and user code.
//!
//! - A [`Model`] turns a decision vector into the "reality" an evaluator
//!   understands and moves the individual from `New` to `Evaluating`.
//! - An [`Evaluator`] decides whether a reality is legal and, if so, computes
//!   its solution vector.
//! - The [`EvaluationStage`] drives an evaluator over one individual and
//!   guarantees it leaves in state `Evaluated`, whatever the evaluator does.
//!
//! ## Example
//!
//! ```rust
//! use optirun::evaluation::{EvaluationFailure, Evaluator};
//!
//! struct Sphere;
//!
//! impl Evaluator<Vec<f64>> for Sphere {
//!     fn legality(&self, x: &Vec<f64>) -> bool {
//!         x.iter().all(|v| v.is_finite())
//!     }
//!
//!     fn evaluate(&self, x: &Vec<f64>) -> Result<Vec<f64>, EvaluationFailure> {
//!         Ok(vec![x.iter().map(|v| v * v).sum()])
//!     }
//! }
//! ```
pub mod cache;
pub mod stage;

use crate::error::Result;
use crate::individual::Individual;
use crate::space::DecisionVector;

pub use cache::{CacheKey, CachedEvaluator, ThreadLocalCachedEvaluator};
pub use stage::EvaluationStage;

/// Error type user evaluation code may return.
pub type EvaluationFailure = Box<dyn std::error::Error + Send + Sync>;

/// Solution key used when an evaluator does not declare its own.
pub const DEFAULT_SOLUTION_KEY: &str = "solution";

/// Scores candidate realities.
///
/// Implementations should not depend on global mutable state: the parallel
/// runner calls them from several threads at once.
pub trait Evaluator<R> {
    /// Whether `reality` satisfies the domain constraints. Illegal candidates
    /// are not evaluated and receive a penalty fitness instead.
    fn legality(&self, _reality: &R) -> bool {
        true
    }

    /// Computes the solution vector of a legal reality.
    fn evaluate(&self, reality: &R) -> std::result::Result<Vec<f64>, EvaluationFailure>;

    /// Names under which the solution is stored in the individual's property
    /// bag. One key stores the whole vector; several keys store one
    /// component each and must match the solution length.
    fn solution_keys(&self) -> Vec<String> {
        vec![DEFAULT_SOLUTION_KEY.to_string()]
    }
}

/// Builds the reality an evaluator consumes from a decision vector.
pub trait Model<R> {
    fn convert_to_reality(&self, decision_vector: &DecisionVector) -> Result<R>;

    /// Attaches the reality to `individual`, moving it from `New` to `Evaluating`.
    fn prepare_for_evaluation(&self, individual: &mut Individual<R>) -> Result<()> {
        let reality = self.convert_to_reality(individual.decision_vector())?;
        individual.prepare(reality)
    }
}

impl<R, F> Model<R> for F
where
    F: Fn(&DecisionVector) -> Result<R>,
{
    fn convert_to_reality(&self, decision_vector: &DecisionVector) -> Result<R> {
        self(decision_vector)
    }
}

/// A model whose reality is the plain list of decision values.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityModel;

impl Model<Vec<f64>> for IdentityModel {
    fn convert_to_reality(&self, decision_vector: &DecisionVector) -> Result<Vec<f64>> {
        Ok(decision_vector.values().to_vec())
    }
}
