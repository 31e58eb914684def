use std::sync::Arc;

use crate::error::{OptimisationError, Result};
use crate::individual::Individual;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;
use crate::space::{DecisionSpace, DecisionVector, VariableKind};

use super::{reinsertion::replace_worst_if_better, CandidateSource};

/// A steady-state evolutionary candidate source.
///
/// Until the population is full it samples uniformly from the space. After
/// that every candidate is bred from two tournament-selected parents with
/// uniform crossover followed by bounded uniform mutation, and reinsertion
/// replaces the worst member when the child beats it.
///
/// Tournament selection works by drawing `tournament_size` members at random
/// and keeping the fittest. Smaller tournaments explore more, larger ones
/// exploit the best members harder.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct EvolutionarySearch {
    space: Arc<DecisionSpace>,
    #[cfg_attr(feature = "serde", serde(skip, default))]
    rng: RandomNumberGenerator,
    tournament_size: usize,
    mutation_probability: f64,
    mutation_scale: f64,
    reject_duplicates: bool,
}

impl EvolutionarySearch {
    /// Creates a search with a tournament of 2, a mutation probability of
    /// `1 / dimensions`, mutation steps of up to 10% of each dimension's width,
    /// and duplicate rejection switched on.
    pub fn new(space: Arc<DecisionSpace>) -> Self {
        let mutation_probability = 1.0 / space.dimensions() as f64;
        Self {
            space,
            rng: RandomNumberGenerator::new(),
            tournament_size: 2,
            mutation_probability,
            mutation_scale: 0.1,
            reject_duplicates: true,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RandomNumberGenerator::from_seed(seed);
        self
    }

    pub fn with_tournament_size(mut self, tournament_size: usize) -> Result<Self> {
        if tournament_size < 1 {
            return Err(OptimisationError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        self.tournament_size = tournament_size;
        Ok(self)
    }

    pub fn with_mutation(mut self, probability: f64, scale: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(OptimisationError::OutOfRange(format!(
                "mutation probability {} is not in [0, 1]",
                probability
            )));
        }
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(OptimisationError::OutOfRange(format!(
                "mutation scale {} is not in (0, 1]",
                scale
            )));
        }
        self.mutation_probability = probability;
        self.mutation_scale = scale;
        Ok(self)
    }

    /// Accept candidates identical to a current member.
    pub fn allow_duplicates(mut self) -> Self {
        self.reject_duplicates = false;
        self
    }

    /// Runs a single tournament over a population sorted best first, so the
    /// lowest drawn index wins.
    fn run_tournament(&mut self, population_size: usize) -> usize {
        (0..self.tournament_size)
            .map(|_| self.rng.index(population_size))
            .min()
            .unwrap_or(0)
    }

    fn breed(&mut self, mother: &[f64], father: &[f64]) -> Vec<f64> {
        let mut child: Vec<f64> = mother
            .iter()
            .zip(father)
            .map(|(m, f)| if self.rng.chance(0.5) { *m } else { *f })
            .collect();

        for (value, variable) in child.iter_mut().zip(self.space.variables()) {
            if !self.rng.chance(self.mutation_probability) {
                continue;
            }
            let width = match *variable.kind() {
                VariableKind::Continuous { lower, upper } => upper - lower,
                VariableKind::Discrete { lower, upper } => (upper - lower) as f64,
            };
            let step = width * self.mutation_scale;
            *value = variable.nearest_legal(*value + self.rng.uniform(-step, step));
        }
        child
    }
}

impl<R> CandidateSource<R> for EvolutionarySearch {
    fn next_decision_vector(&mut self, population: &Population<R>) -> Result<DecisionVector> {
        if !population.is_target_size_reached() || population.len() < 2 {
            return Ok(DecisionVector::sample(&self.space, &mut self.rng));
        }

        let mother = self.run_tournament(population.len());
        let father = self.run_tournament(population.len());
        let child = {
            let m = population.members()[mother].decision_vector().values();
            let f = population.members()[father].decision_vector().values();
            self.breed(m, f)
        };
        DecisionVector::new(Arc::clone(&self.space), child)
    }

    fn check_acceptable(&self, candidate: &Individual<R>, population: &Population<R>) -> bool {
        !self.reject_duplicates
            || population
                .iter()
                .all(|member| member.decision_vector() != candidate.decision_vector())
    }

    fn try_reinsert(
        &mut self,
        population: &mut Population<R>,
        individual: Individual<R>,
    ) -> Result<bool> {
        replace_worst_if_better(population, individual)
    }
}
