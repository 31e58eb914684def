//! # Individual
//!
//! An [`Individual`] is one candidate solution moving through the ask/tell loop.
//! It wraps a [`DecisionVector`] that never changes and walks a one-way
//! lifecycle:
//!
//! ```text
//! New --prepare(reality)--> Evaluating --set_solution / mark_illegal--> Evaluated
//! ```
//!
//! Fitness can only be assigned once the individual is `Evaluated`, and only once.
//! Every accessor for a value that is filled in later (reality, legality,
//! solution, fitness) fails with [`OptimisationError::MissingProperty`] until
//! the stage responsible for it has run.
//!
//! The type parameter `R` is the "reality" a model builds from the decision
//! vector, i.e. whatever the evaluator actually consumes.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use optirun::individual::{Individual, IndividualState};
//! use optirun::space::{DecisionSpace, DecisionVector};
//!
//! let space = Arc::new(DecisionSpace::uniform(1, 0.0, 10.0).unwrap());
//! let dv = DecisionVector::new(space, vec![2.0]).unwrap();
//!
//! let mut ind: Individual<Vec<f64>> = Individual::new(dv);
//! ind.prepare(vec![2.0]).unwrap();
//! ind.set_solution(vec![4.0]).unwrap();
//! ind.set_fitness(4.0).unwrap();
//!
//! assert_eq!(ind.state(), IndividualState::Evaluated);
//! assert!(ind.set_fitness(1.0).is_err());
//! ```
pub mod properties;

use std::fmt;

use crate::error::{OptimisationError, Result};
use crate::space::DecisionVector;

pub use properties::{PropertyBag, PropertyKey, PropertyValue};

/// Lifecycle state of an [`Individual`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndividualState {
    New,
    Evaluating,
    Evaluated,
}

impl fmt::Display for IndividualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndividualState::New => write!(f, "New"),
            IndividualState::Evaluating => write!(f, "Evaluating"),
            IndividualState::Evaluated => write!(f, "Evaluated"),
        }
    }
}

/// One candidate solution and everything learnt about it.
#[derive(Debug, Clone)]
pub struct Individual<R> {
    decision_vector: DecisionVector,
    state: IndividualState,
    reality: Option<R>,
    legal: Option<bool>,
    solution: Option<Vec<f64>>,
    fitness: Option<f64>,
    properties: PropertyBag,
}

impl<R> Individual<R> {
    /// Creates an individual in state `New`.
    pub fn new(decision_vector: DecisionVector) -> Self {
        Self {
            decision_vector,
            state: IndividualState::New,
            reality: None,
            legal: None,
            solution: None,
            fitness: None,
            properties: PropertyBag::new(),
        }
    }

    pub fn decision_vector(&self) -> &DecisionVector {
        &self.decision_vector
    }

    pub fn state(&self) -> IndividualState {
        self.state
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// Attaches the reality definition and moves `New -> Evaluating`.
    pub fn prepare(&mut self, reality: R) -> Result<()> {
        self.require_state(IndividualState::New, "prepare for evaluation")?;
        self.reality = Some(reality);
        self.state = IndividualState::Evaluating;
        Ok(())
    }

    pub fn reality(&self) -> Result<&R> {
        self.reality
            .as_ref()
            .ok_or_else(|| OptimisationError::MissingProperty("reality definition".to_string()))
    }

    /// Records a legal evaluation and moves `Evaluating -> Evaluated`.
    pub fn set_solution(&mut self, solution: Vec<f64>) -> Result<()> {
        self.require_state(IndividualState::Evaluating, "assign a solution")?;
        self.solution = Some(solution);
        self.legal = Some(true);
        self.state = IndividualState::Evaluated;
        Ok(())
    }

    /// Records an illegal evaluation and moves `Evaluating -> Evaluated`.
    /// No solution is attached.
    pub fn mark_illegal(&mut self) -> Result<()> {
        self.require_state(IndividualState::Evaluating, "mark as illegal")?;
        self.legal = Some(false);
        self.state = IndividualState::Evaluated;
        Ok(())
    }

    /// Records a failure of the evaluation code. The individual ends up
    /// `Evaluated` and illegal, with the message kept under
    /// [`PropertyKey::EvaluationError`].
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<()> {
        self.mark_illegal()?;
        self.properties.set(
            PropertyKey::EvaluationError,
            PropertyValue::Text(message.into()),
        );
        Ok(())
    }

    pub fn legal(&self) -> Result<bool> {
        self.legal
            .ok_or_else(|| OptimisationError::MissingProperty("legality".to_string()))
    }

    pub fn solution(&self) -> Result<&[f64]> {
        self.solution
            .as_deref()
            .ok_or_else(|| OptimisationError::MissingProperty("solution".to_string()))
    }

    /// Assigns fitness. Only allowed once, and only on an `Evaluated` individual.
    pub fn set_fitness(&mut self, fitness: f64) -> Result<()> {
        self.require_state(IndividualState::Evaluated, "assign fitness")?;
        if self.fitness.is_some() {
            return Err(OptimisationError::InvalidState(
                "fitness has already been assigned".to_string(),
            ));
        }
        self.fitness = Some(fitness);
        Ok(())
    }

    pub fn fitness(&self) -> Result<f64> {
        self.fitness
            .ok_or_else(|| OptimisationError::MissingProperty("fitness".to_string()))
    }

    pub fn has_fitness(&self) -> bool {
        self.fitness.is_some()
    }

    /// The captured evaluation failure, if the evaluation code failed.
    pub fn evaluation_error(&self) -> Option<&str> {
        self.properties.text(&PropertyKey::EvaluationError).ok()
    }

    pub fn creation_index(&self) -> Result<usize> {
        self.properties.index(&PropertyKey::CreationIndex)
    }

    pub fn reinsertion_index(&self) -> Result<usize> {
        self.properties.index(&PropertyKey::ReinsertionIndex)
    }

    // Population keeps only individuals with fitness assigned.
    pub(crate) fn sort_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::NAN)
    }

    fn require_state(&self, expected: IndividualState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(OptimisationError::InvalidState(format!(
                "cannot {} on an individual in state {} (expected {})",
                action, self.state, expected
            )));
        }
        Ok(())
    }
}
