//! # Population
//!
//! A [`Population`] holds evaluated individuals with fitness assigned, always
//! sorted by ascending fitness. Lower fitness is better, so `best()` is the
//! first member and `worst()` the last.
//!
//! ## Ordering
//!
//! Members are compared with `f64::total_cmp`, with NaN treated like positive
//! infinity. Ties keep insertion order: a newcomer is placed after every
//! existing member with equal fitness. Replacing a member removes it first and
//! then inserts the newcomer by the same rule, so a replacement with equal
//! fitness goes to the back of its tie group.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use optirun::individual::Individual;
//! use optirun::population::Population;
//! use optirun::space::{DecisionSpace, DecisionVector};
//!
//! let space = Arc::new(DecisionSpace::uniform(1, 0.0, 10.0).unwrap());
//! let mut population: Population<()> = Population::new(Some(2));
//!
//! for x in [3.0, 1.0] {
//!     let mut ind = Individual::new(DecisionVector::new(Arc::clone(&space), vec![x]).unwrap());
//!     ind.prepare(()).unwrap();
//!     ind.set_solution(vec![x]).unwrap();
//!     ind.set_fitness(x).unwrap();
//!     population.add(ind).unwrap();
//! }
//!
//! assert!(population.is_target_size_reached());
//! assert_eq!(population.best().unwrap().fitness().unwrap(), 1.0);
//! assert_eq!(population.worst().unwrap().fitness().unwrap(), 3.0);
//! ```

use std::cmp::Ordering;

use crate::error::{OptimisationError, OptionExt, Result};
use crate::individual::Individual;
use crate::space::DecisionVector;

/// A fitness-ordered collection of evaluated individuals.
#[derive(Debug, Clone)]
pub struct Population<R> {
    members: Vec<Individual<R>>,
    target_size: Option<usize>,
    constant_length: bool,
}

impl<R> Population<R> {
    /// Creates an empty population. `target_size` defines when the population
    /// counts as full; `None` makes it unbounded.
    pub fn new(target_size: Option<usize>) -> Self {
        Self {
            members: Vec::new(),
            target_size,
            constant_length: true,
        }
    }

    /// Allows members whose decision vectors live in different spaces.
    pub fn allow_heterogeneous(mut self) -> Self {
        self.constant_length = false;
        self
    }

    pub fn target_size(&self) -> Option<usize> {
        self.target_size
    }

    pub fn is_constant_length(&self) -> bool {
        self.constant_length
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `true` once a bounded population holds at least its target size.
    /// Always `false` for an unbounded population.
    pub fn is_target_size_reached(&self) -> bool {
        self.target_size
            .map_or(false, |target| self.members.len() >= target)
    }

    pub fn get(&self, index: usize) -> Option<&Individual<R>> {
        self.members.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual<R>> {
        self.members.iter()
    }

    pub fn members(&self) -> &[Individual<R>] {
        &self.members
    }

    pub fn best(&self) -> Result<&Individual<R>> {
        self.members
            .first()
            .ok_or_else_opt(|| OptimisationError::EmptyPopulation)
    }

    pub fn worst(&self) -> Result<&Individual<R>> {
        self.members
            .last()
            .ok_or_else_opt(|| OptimisationError::EmptyPopulation)
    }

    /// Fitness of every member, best first.
    pub fn fitness_values(&self) -> Vec<f64> {
        self.members.iter().map(|m| m.sort_key()).collect()
    }

    pub fn decision_vectors(&self) -> Vec<&DecisionVector> {
        self.members.iter().map(|m| m.decision_vector()).collect()
    }

    /// Inserts `individual` at its fitness position.
    ///
    /// Fails with `PopulationFull` if the target size is already reached;
    /// use [`replace_worst`](Self::replace_worst) or [`replace`](Self::replace)
    /// on a full population.
    pub fn add(&mut self, individual: Individual<R>) -> Result<()> {
        self.check_member(&individual)?;
        if let Some(target) = self.target_size {
            if self.members.len() >= target {
                return Err(OptimisationError::PopulationFull(target));
            }
        }
        self.insert_sorted(individual);
        Ok(())
    }

    /// Swaps out the worst member for `individual` and returns the removed one.
    pub fn replace_worst(&mut self, individual: Individual<R>) -> Result<Individual<R>> {
        let last = self
            .members
            .len()
            .checked_sub(1)
            .ok_or_else_opt(|| OptimisationError::EmptyPopulation)?;
        self.replace(last, individual)
    }

    /// Swaps out the member at `index` for `individual` and returns the removed one.
    pub fn replace(&mut self, index: usize, individual: Individual<R>) -> Result<Individual<R>> {
        if index >= self.members.len() {
            return Err(OptimisationError::OutOfRange(format!(
                "member index {} in a population of {}",
                index,
                self.members.len()
            )));
        }
        self.check_member(&individual)?;
        let removed = self.members.remove(index);
        self.insert_sorted(individual);
        Ok(removed)
    }

    fn check_member(&self, individual: &Individual<R>) -> Result<()> {
        if !individual.has_fitness() {
            return Err(OptimisationError::InvalidState(
                "only individuals with fitness assigned can join a population".to_string(),
            ));
        }
        if self.constant_length {
            if let Some(first) = self.members.first() {
                if !first.decision_vector().same_space(individual.decision_vector()) {
                    return Err(OptimisationError::DomainMismatch(
                        "decision space differs from the existing members".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert_sorted(&mut self, individual: Individual<R>) {
        let fitness = individual.sort_key();
        let position = self
            .members
            .partition_point(|m| compare_fitness(m.sort_key(), fitness) != Ordering::Greater);
        self.members.insert(position, individual);
    }
}

impl<'a, R> IntoIterator for &'a Population<R> {
    type Item = &'a Individual<R>;
    type IntoIter = std::slice::Iter<'a, Individual<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Orders two fitness values, ranking NaN after every number.
pub(crate) fn compare_fitness(a: f64, b: f64) -> Ordering {
    let rank = |x: f64| if x.is_nan() { f64::INFINITY } else { x };
    rank(a).total_cmp(&rank(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::PropertyKey;
    use crate::individual::PropertyValue;
    use crate::space::DecisionSpace;
    use std::sync::Arc;

    fn evaluated(space: &Arc<DecisionSpace>, x: f64, fitness: f64, tag: usize) -> Individual<()> {
        let mut ind = Individual::new(DecisionVector::new(Arc::clone(space), vec![x]).unwrap());
        ind.prepare(()).unwrap();
        ind.set_solution(vec![fitness]).unwrap();
        ind.set_fitness(fitness).unwrap();
        ind.properties_mut()
            .set(PropertyKey::Custom("tag".into()), PropertyValue::Index(tag));
        ind
    }

    fn tag(ind: &Individual<()>) -> usize {
        ind.properties()
            .index(&PropertyKey::Custom("tag".into()))
            .unwrap()
    }

    fn space() -> Arc<DecisionSpace> {
        Arc::new(DecisionSpace::uniform(1, -100.0, 100.0).unwrap())
    }

    #[test]
    fn test_best_worst_on_empty() {
        let population: Population<()> = Population::new(None);
        assert_eq!(population.best().unwrap_err(), OptimisationError::EmptyPopulation);
        assert_eq!(population.worst().unwrap_err(), OptimisationError::EmptyPopulation);
    }

    #[test]
    fn test_add_keeps_ascending_order() {
        let s = space();
        let mut population = Population::new(None);
        for (i, f) in [5.0, -1.0, 3.0, 3.0, 10.0, 0.0].into_iter().enumerate() {
            population.add(evaluated(&s, 0.0, f, i)).unwrap();
        }
        assert_eq!(population.fitness_values(), vec![-1.0, 0.0, 3.0, 3.0, 5.0, 10.0]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let s = space();
        let mut population = Population::new(None);
        population.add(evaluated(&s, 0.0, 1.0, 0)).unwrap();
        population.add(evaluated(&s, 0.0, 1.0, 1)).unwrap();
        population.add(evaluated(&s, 0.0, 1.0, 2)).unwrap();
        let tags: Vec<usize> = population.iter().map(tag).collect();
        assert_eq!(tags, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_to_full_population_fails() {
        let s = space();
        let mut population = Population::new(Some(1));
        population.add(evaluated(&s, 0.0, 1.0, 0)).unwrap();
        assert!(population.is_target_size_reached());
        assert_eq!(
            population.add(evaluated(&s, 0.0, 0.5, 1)).unwrap_err(),
            OptimisationError::PopulationFull(1)
        );
    }

    #[test]
    fn test_add_requires_fitness() {
        let s = space();
        let mut ind: Individual<()> =
            Individual::new(DecisionVector::new(Arc::clone(&s), vec![0.0]).unwrap());
        ind.prepare(()).unwrap();
        ind.mark_illegal().unwrap();
        let mut population = Population::new(None);
        assert!(matches!(
            population.add(ind),
            Err(OptimisationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_add_rejects_other_space() {
        let mut population = Population::new(None);
        population.add(evaluated(&space(), 0.0, 1.0, 0)).unwrap();
        let other = Arc::new(DecisionSpace::uniform(1, 0.0, 1.0).unwrap());
        assert!(matches!(
            population.add(evaluated(&other, 0.5, 1.0, 1)),
            Err(OptimisationError::DomainMismatch(_))
        ));

        let mut mixed = Population::new(None).allow_heterogeneous();
        mixed.add(evaluated(&space(), 0.0, 1.0, 0)).unwrap();
        mixed.add(evaluated(&other, 0.5, 1.0, 1)).unwrap();
        assert_eq!(mixed.len(), 2);
    }

    #[test]
    fn test_replace_worst_resorts() {
        let s = space();
        let mut population = Population::new(Some(3));
        for (i, f) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            population.add(evaluated(&s, 0.0, f, i)).unwrap();
        }
        let removed = population.replace_worst(evaluated(&s, 0.0, 0.5, 9)).unwrap();
        assert_eq!(removed.fitness().unwrap(), 3.0);
        assert_eq!(population.fitness_values(), vec![0.5, 1.0, 2.0]);
        assert_eq!(tag(population.best().unwrap()), 9);
    }

    #[test]
    fn test_replace_specific() {
        let s = space();
        let mut population = Population::new(None);
        for (i, f) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            population.add(evaluated(&s, 0.0, f, i)).unwrap();
        }
        let removed = population.replace(0, evaluated(&s, 0.0, 2.5, 7)).unwrap();
        assert_eq!(tag(&removed), 0);
        assert_eq!(population.fitness_values(), vec![2.0, 2.5, 3.0]);
        assert!(matches!(
            population.replace(3, evaluated(&s, 0.0, 1.0, 8)),
            Err(OptimisationError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_failed_replace_leaves_population_intact() {
        let s = space();
        let mut population = Population::new(None);
        population.add(evaluated(&s, 0.0, 1.0, 0)).unwrap();
        let other = Arc::new(DecisionSpace::uniform(2, 0.0, 1.0).unwrap());
        let mut stranger: Individual<()> =
            Individual::new(DecisionVector::new(other, vec![0.1, 0.1]).unwrap());
        stranger.prepare(()).unwrap();
        stranger.set_solution(vec![0.0]).unwrap();
        stranger.set_fitness(0.0).unwrap();
        assert!(population.replace_worst(stranger).is_err());
        assert_eq!(population.len(), 1);
        assert_eq!(tag(population.best().unwrap()), 0);
    }

    #[test]
    fn test_nan_fitness_sorts_last() {
        let s = space();
        let mut population = Population::new(None);
        population.add(evaluated(&s, 0.0, f64::NAN, 0)).unwrap();
        population.add(evaluated(&s, 0.0, f64::INFINITY, 1)).unwrap();
        population.add(evaluated(&s, 0.0, 7.0, 2)).unwrap();
        let tags: Vec<usize> = population.iter().map(tag).collect();
        assert_eq!(tags, vec![2, 0, 1]);
    }

    #[test]
    fn test_clone_is_independent() {
        let s = space();
        let mut population = Population::new(None);
        population.add(evaluated(&s, 0.0, 1.0, 0)).unwrap();
        let snapshot = population.clone();
        population.add(evaluated(&s, 0.0, 0.0, 1)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(population.len(), 2);
    }
}
