use std::sync::Arc;

use crate::error::Result;
use crate::individual::Individual;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;
use crate::space::{DecisionSpace, DecisionVector};

use super::{reinsertion::replace_worst_if_better, CandidateSource};

/// Samples candidates uniformly from the decision space and keeps the best
/// ones seen so far.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: Arc<DecisionSpace>,
    rng: RandomNumberGenerator,
}

impl RandomSearch {
    pub fn new(space: Arc<DecisionSpace>) -> Self {
        Self {
            space,
            rng: RandomNumberGenerator::new(),
        }
    }

    pub fn from_seed(space: Arc<DecisionSpace>, seed: u64) -> Self {
        Self {
            space,
            rng: RandomNumberGenerator::from_seed(seed),
        }
    }

    pub fn space(&self) -> &Arc<DecisionSpace> {
        &self.space
    }
}

impl<R> CandidateSource<R> for RandomSearch {
    fn next_decision_vector(&mut self, _population: &Population<R>) -> Result<DecisionVector> {
        Ok(DecisionVector::sample(&self.space, &mut self.rng))
    }

    fn try_reinsert(
        &mut self,
        population: &mut Population<R>,
        individual: Individual<R>,
    ) -> Result<bool> {
        replace_worst_if_better(population, individual)
    }
}
