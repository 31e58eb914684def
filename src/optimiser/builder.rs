use std::marker::PhantomData;

use crate::{
    error::{OptimisationError, Result},
    fitness::FitnessCalculator,
    population::Population,
};

use super::{CandidateSource, Optimiser};

/// Fluent assembly of an [`Optimiser`].
pub struct OptimiserBuilder<R, C, F>
where
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
{
    candidate_source: Option<C>,
    fitness: Option<F>,
    target_size: Option<usize>,
    heterogeneous: bool,
    _marker: PhantomData<R>,
}

impl<R, C, F> OptimiserBuilder<R, C, F>
where
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
{
    pub fn new() -> Self {
        Self {
            candidate_source: None,
            fitness: None,
            target_size: None,
            heterogeneous: false,
            _marker: PhantomData,
        }
    }

    pub fn with_candidate_source(mut self, candidate_source: C) -> Self {
        self.candidate_source = Some(candidate_source);
        self
    }

    pub fn with_fitness(mut self, fitness: F) -> Self {
        self.fitness = Some(fitness);
        self
    }

    /// Bounds the population. Without a target size it grows without limit
    /// and never counts as full.
    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = Some(target_size);
        self
    }

    /// Lets the population hold decision vectors from different spaces.
    pub fn allow_heterogeneous(mut self) -> Self {
        self.heterogeneous = true;
        self
    }

    /// Builds the optimiser with an empty population.
    ///
    /// # Returns
    ///
    /// The assembled `Optimiser`, or a `Configuration` error if the candidate
    /// source or the fitness calculator was never set.
    pub fn build(self) -> Result<Optimiser<R, C, F>> {
        let candidate_source = self.candidate_source.ok_or_else(|| {
            OptimisationError::Configuration("Candidate source not specified".to_string())
        })?;

        let fitness = self.fitness.ok_or_else(|| {
            OptimisationError::Configuration("Fitness calculator not specified".to_string())
        })?;

        if self.target_size == Some(0) {
            return Err(OptimisationError::Configuration(
                "Population target size cannot be zero".to_string(),
            ));
        }

        let mut population = Population::new(self.target_size);
        if self.heterogeneous {
            population = population.allow_heterogeneous();
        }

        Ok(Optimiser::new(population, candidate_source, fitness))
    }
}

impl<R, C, F> Default for OptimiserBuilder<R, C, F>
where
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
{
    fn default() -> Self {
        Self::new()
    }
}
