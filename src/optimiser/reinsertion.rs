//! Reinsertion policies shared by candidate sources.

use std::cmp::Ordering;

use crate::error::Result;
use crate::individual::Individual;
use crate::population::{compare_fitness, Population};

/// Adds `individual` while the population is below its target size and
/// rejects it afterwards.
pub fn insert_until_full<R>(population: &mut Population<R>, individual: Individual<R>) -> Result<bool> {
    if population.is_target_size_reached() {
        return Ok(false);
    }
    population.add(individual)?;
    Ok(true)
}

/// Adds `individual` while the population is below its target size, then
/// only lets it in if it beats the current worst member, which it replaces.
pub fn replace_worst_if_better<R>(
    population: &mut Population<R>,
    individual: Individual<R>,
) -> Result<bool> {
    if !population.is_target_size_reached() {
        population.add(individual)?;
        return Ok(true);
    }
    let worst = population.worst()?.fitness()?;
    if compare_fitness(individual.fitness()?, worst) == Ordering::Less {
        population.replace_worst(individual)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
