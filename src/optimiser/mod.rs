//! # Optimiser
//!
//! The ask/tell core. An [`Optimiser`] owns a [`Population`] and exposes two
//! operations:
//!
//! - **ask**: [`get_next_to_evaluate`](Optimiser::get_next_to_evaluate) hands out
//!   new, stamped candidates;
//! - **tell**: [`reinsert`](Optimiser::reinsert) scores evaluated candidates and
//!   offers them to the population.
//!
//! The algorithm-specific parts (how a decision vector is proposed, which
//! proposals are acceptable, whether a scored candidate joins the population)
//! come from a [`CandidateSource`]. Scoring comes from a
//! [`FitnessCalculator`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use optirun::fitness::{ConstantPenalty, PenaltyFitness};
//! use optirun::optimiser::{OptimiserBuilder, RandomSearch};
//! use optirun::space::DecisionSpace;
//!
//! let space = Arc::new(DecisionSpace::uniform(2, -1.0, 1.0).unwrap());
//! let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
//!     .with_candidate_source(RandomSearch::from_seed(space, 1))
//!     .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1e6)))
//!     .with_target_size(10)
//!     .build()
//!     .unwrap();
//!
//! let mut batch = optimiser.get_next_to_evaluate(3).unwrap();
//! for ind in &mut batch {
//!     let values = ind.decision_vector().values().to_vec();
//!     ind.prepare(values.clone()).unwrap();
//!     ind.set_solution(vec![values.iter().map(|x| x * x).sum()]).unwrap();
//! }
//! assert_eq!(optimiser.reinsert(batch).unwrap(), 3);
//! ```
pub mod builder;
pub mod evolutionary;
pub mod random_search;
pub mod reinsertion;

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::error::{OptimisationError, Result};
use crate::fitness::FitnessCalculator;
use crate::individual::{Individual, IndividualState, PropertyKey, PropertyValue};
use crate::population::Population;
use crate::space::DecisionVector;

pub use builder::OptimiserBuilder;
pub use evolutionary::EvolutionarySearch;
pub use random_search::RandomSearch;
pub use reinsertion::{insert_until_full, replace_worst_if_better};

/// Extra attempts `get_next_to_evaluate` may spend on rejected candidates
/// before giving up with a generation timeout.
pub const GENERATION_RETRY_MARGIN: usize = 20;

/// The algorithm-specific hooks of an optimiser.
///
/// All three are called from a single thread, the one that owns the
/// [`Optimiser`], so implementations can keep mutable state (an RNG, a simplex)
/// without locking.
pub trait CandidateSource<R> {
    /// Proposes the next decision vector to try.
    fn next_decision_vector(&mut self, population: &Population<R>) -> Result<DecisionVector>;

    /// Decides whether a freshly proposed candidate is worth evaluating.
    fn check_acceptable(&self, _candidate: &Individual<R>, _population: &Population<R>) -> bool {
        true
    }

    /// Offers a scored candidate to the population. Returns whether it was taken.
    /// Rejection is a normal outcome, not an error.
    fn try_reinsert(
        &mut self,
        population: &mut Population<R>,
        individual: Individual<R>,
    ) -> Result<bool>;
}

/// Ask/tell optimiser combining a population, a candidate source and a fitness calculator.
pub struct Optimiser<R, C, F> {
    population: Population<R>,
    source: C,
    fitness: F,
    started: Instant,
    created: usize,
}

impl<R, C, F> Optimiser<R, C, F>
where
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
{
    pub fn new(population: Population<R>, source: C, fitness: F) -> Self {
        Self {
            population,
            source,
            fitness,
            started: Instant::now(),
            created: 0,
        }
    }

    pub fn population(&self) -> &Population<R> {
        &self.population
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Number of candidates handed out so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Produces `num_desired` acceptable candidates in state `New`, each
    /// stamped with its creation time and index.
    ///
    /// # Errors
    ///
    /// Fails with `GenerationTimeout` once `num_desired + GENERATION_RETRY_MARGIN`
    /// proposals have been made without enough of them being acceptable, and
    /// propagates any error from the candidate source.
    pub fn get_next_to_evaluate(&mut self, num_desired: usize) -> Result<Vec<Individual<R>>> {
        let max_attempts = num_desired + GENERATION_RETRY_MARGIN;
        let mut accepted = Vec::with_capacity(num_desired);
        let mut attempts = 0;

        while accepted.len() < num_desired {
            if attempts >= max_attempts {
                warn!(
                    desired = num_desired,
                    accepted = accepted.len(),
                    attempts,
                    "candidate generation exhausted its retry budget"
                );
                return Err(OptimisationError::GenerationTimeout {
                    desired: num_desired,
                    accepted: accepted.len(),
                    attempts,
                });
            }
            attempts += 1;

            let decision_vector = self.source.next_decision_vector(&self.population)?;
            let mut candidate = Individual::new(decision_vector);
            if !self.source.check_acceptable(&candidate, &self.population) {
                trace!(attempts, "candidate rejected");
                continue;
            }

            let properties = candidate.properties_mut();
            properties.set(
                PropertyKey::CreationTime,
                PropertyValue::Elapsed(self.started.elapsed()),
            );
            properties.set(PropertyKey::CreationIndex, PropertyValue::Index(self.created));
            self.created += 1;
            accepted.push(candidate);
        }

        Ok(accepted)
    }

    /// Scores each evaluated individual and offers it to the population.
    /// Returns how many were taken.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidState`, before touching anything, if any individual
    /// is not `Evaluated`.
    pub fn reinsert(&mut self, individuals: Vec<Individual<R>>) -> Result<usize> {
        if let Some(bad) = individuals
            .iter()
            .find(|ind| ind.state() != IndividualState::Evaluated)
        {
            return Err(OptimisationError::InvalidState(format!(
                "only Evaluated individuals can be reinserted, found one in state {}",
                bad.state()
            )));
        }

        let mut inserted = 0;
        for mut individual in individuals {
            self.assign_fitness(&mut individual)?;
            if self.reinsert_scored(individual)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// First half of [`reinsert`](Self::reinsert): computes and assigns fitness
    /// (penalty for illegal individuals) and stamps the reinsertion time.
    pub fn assign_fitness(&mut self, individual: &mut Individual<R>) -> Result<()> {
        if individual.state() != IndividualState::Evaluated {
            return Err(OptimisationError::InvalidState(format!(
                "only Evaluated individuals can be reinserted, found one in state {}",
                individual.state()
            )));
        }
        let fitness = self.fitness.calculate(individual)?;
        individual.set_fitness(fitness)?;
        individual.properties_mut().set(
            PropertyKey::ReinsertionTime,
            PropertyValue::Elapsed(self.started.elapsed()),
        );
        Ok(())
    }

    /// Second half of [`reinsert`](Self::reinsert): hands a scored individual
    /// to the candidate source's reinsertion policy.
    pub fn reinsert_scored(&mut self, individual: Individual<R>) -> Result<bool> {
        if !individual.has_fitness() {
            return Err(OptimisationError::InvalidState(
                "fitness must be assigned before reinsertion".to_string(),
            ));
        }
        self.source.try_reinsert(&mut self.population, individual)
    }

    /// Consumes the optimiser and returns its population.
    pub fn into_population(self) -> Population<R> {
        self.population
    }
}
