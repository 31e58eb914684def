//! # Fitness
//!
//! A [`FitnessCalculator`] turns an evaluated individual into the scalar the
//! population is ordered by. Lower is better.
//!
//! [`PenaltyFitness`] is the usual calculator: legal individuals are scored
//! from their solution vector, illegal ones by a [`Penalty`] on their decision
//! vector. Any closure `Fn(&Individual<R>) -> Result<f64>` is a calculator too.
//!
//! ```rust
//! use optirun::fitness::{ConstantPenalty, PenaltyFitness};
//!
//! // Minimise the first solution component, score illegal candidates at 1e9.
//! let fitness = PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1e9));
//! # let _ = fitness;
//! ```

use crate::error::Result;
use crate::individual::Individual;
use crate::space::DecisionVector;

/// Converts an evaluated individual into its fitness.
pub trait FitnessCalculator<R> {
    /// Computes the fitness of an `Evaluated` individual.
    fn calculate(&self, individual: &Individual<R>) -> Result<f64>;
}

impl<R, F> FitnessCalculator<R> for F
where
    F: Fn(&Individual<R>) -> Result<f64>,
{
    fn calculate(&self, individual: &Individual<R>) -> Result<f64> {
        self(individual)
    }
}

/// Fitness substituted for candidates that violate the domain constraints.
pub trait Penalty {
    fn penalty(&self, decision_vector: &DecisionVector) -> f64;
}

/// The same penalty for every illegal candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPenalty(pub f64);

impl Penalty for ConstantPenalty {
    fn penalty(&self, _decision_vector: &DecisionVector) -> f64 {
        self.0
    }
}

/// A penalty computed from the decision vector, e.g. its distance to the feasible region.
pub struct PenaltyFn<F>(pub F);

impl<F> Penalty for PenaltyFn<F>
where
    F: Fn(&DecisionVector) -> f64,
{
    fn penalty(&self, decision_vector: &DecisionVector) -> f64 {
        (self.0)(decision_vector)
    }
}

/// Scores legal individuals with `solution_to_fitness` and illegal ones with `penalty`.
#[derive(Debug, Clone)]
pub struct PenaltyFitness<S, P> {
    solution_to_fitness: S,
    penalty: P,
}

impl<S, P> PenaltyFitness<S, P>
where
    S: Fn(&[f64]) -> f64,
    P: Penalty,
{
    pub fn new(solution_to_fitness: S, penalty: P) -> Self {
        Self {
            solution_to_fitness,
            penalty,
        }
    }
}

impl<R, S, P> FitnessCalculator<R> for PenaltyFitness<S, P>
where
    S: Fn(&[f64]) -> f64,
    P: Penalty,
{
    fn calculate(&self, individual: &Individual<R>) -> Result<f64> {
        if individual.legal()? {
            Ok((self.solution_to_fitness)(individual.solution()?))
        } else {
            Ok(self.penalty.penalty(individual.decision_vector()))
        }
    }
}
