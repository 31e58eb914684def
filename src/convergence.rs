//! # Convergence
//!
//! Predicates over a [`Population`] that the reinsertion stage consults once
//! the population is full. When one returns `true` the run stops.
//!
//! Every built-in check uses a strict comparison: a spread exactly equal to
//! the tolerance does not count as converged. All of them report `false` on an
//! empty population.
//!
//! Any closure `Fn(&Population<R>) -> bool` can be used as well.
//!
//! ```rust
//! use optirun::convergence::{AnyOf, Convergence, FitnessDivergence};
//! use optirun::population::Population;
//!
//! let check: AnyOf<()> = AnyOf::new()
//!     .with(FitnessDivergence::new(1e-6))
//!     .with(|p: &Population<()>| p.len() > 1000);
//! assert!(!check.converged(&Population::new(Some(10))));
//! ```

use crate::population::Population;

/// Decides whether a population has converged.
pub trait Convergence<R> {
    fn converged(&self, population: &Population<R>) -> bool;
}

impl<R, F> Convergence<R> for F
where
    F: Fn(&Population<R>) -> bool,
{
    fn converged(&self, population: &Population<R>) -> bool {
        self(population)
    }
}

fn best_and_worst_fitness<R>(population: &Population<R>) -> Option<(f64, f64)> {
    let best = population.best().ok()?.fitness().ok()?;
    let worst = population.worst().ok()?.fitness().ok()?;
    Some((best, worst))
}

/// Converged when the fitness spread between best and worst is below `tolerance`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessDivergence {
    pub tolerance: f64,
}

impl FitnessDivergence {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl<R> Convergence<R> for FitnessDivergence {
    fn converged(&self, population: &Population<R>) -> bool {
        best_and_worst_fitness(population)
            .map_or(false, |(best, worst)| (worst - best).abs() < self.tolerance)
    }
}

/// Converged when every coordinate of the best and worst decision vectors
/// differs by less than `tolerance`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionVectorDivergence {
    pub tolerance: f64,
}

impl DecisionVectorDivergence {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl<R> Convergence<R> for DecisionVectorDivergence {
    fn converged(&self, population: &Population<R>) -> bool {
        let (Ok(best), Ok(worst)) = (population.best(), population.worst()) else {
            return false;
        };
        // vectors from different spaces cannot have converged onto each other
        match worst.decision_vector().subtract(best.decision_vector()) {
            Ok(difference) => difference.iter().all(|d| d.abs() < self.tolerance),
            Err(_) => false,
        }
    }
}

/// Converged when the best fitness lies within `tolerance` of a known `target`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsoluteTolerance {
    pub target: f64,
    pub tolerance: f64,
}

impl AbsoluteTolerance {
    pub fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }
}

impl<R> Convergence<R> for AbsoluteTolerance {
    fn converged(&self, population: &Population<R>) -> bool {
        best_and_worst_fitness(population)
            .map_or(false, |(best, _)| (best - self.target).abs() < self.tolerance)
    }
}

/// Converged when the fitness spread, relative to the magnitude of the best
/// fitness, is below `tolerance`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeTolerance {
    pub tolerance: f64,
}

impl RelativeTolerance {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl<R> Convergence<R> for RelativeTolerance {
    fn converged(&self, population: &Population<R>) -> bool {
        best_and_worst_fitness(population).map_or(false, |(best, worst)| {
            let scale = best.abs().max(f64::EPSILON);
            (worst - best).abs() / scale < self.tolerance
        })
    }
}

/// Never converges; the run only stops on its timeout or on cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Never;

impl<R> Convergence<R> for Never {
    fn converged(&self, _population: &Population<R>) -> bool {
        false
    }
}

/// Converged as soon as any of its checks is.
pub struct AnyOf<R> {
    checks: Vec<Box<dyn Convergence<R> + Send>>,
}

impl<R> AnyOf<R> {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn with(mut self, check: impl Convergence<R> + Send + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }
}

impl<R> Default for AnyOf<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Convergence<R> for AnyOf<R> {
    fn converged(&self, population: &Population<R>) -> bool {
        self.checks.iter().any(|c| c.converged(population))
    }
}
