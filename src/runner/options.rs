//! # RunnerOptions
//!
//! The `RunnerOptions` struct holds the scalar configuration of an
//! optimisation run: how many candidates may be processed, how often progress
//! is reported, how many evaluation workers run in parallel and how many
//! candidates are requested per credit.
//!
//! ## Example
//!
//! ```rust
//! use optirun::runner::RunnerOptions;
//!
//! // Defaults: 1000 candidates, a snapshot every 100, one worker per core
//! let default_options = RunnerOptions::default();
//! assert_eq!(default_options.get_timeout_count(), 1000);
//!
//! let options = RunnerOptions::builder()
//!     .timeout_count(500)
//!     .report_frequency(50)
//!     .num_workers(4)
//!     .keep_history(false)
//!     .build();
//! assert!(options.validate().is_ok());
//! ```
//!
//! ## Fields
//!
//! - `timeout_count`: the run stops once this many candidates have been processed.
//! - `report_frequency`: a population snapshot is reported every this many candidates.
//! - `num_workers`: evaluation workers in parallel mode.
//! - `batch_size`: candidates requested each time that many have been processed.
//! - `initial_candidates`: candidates dispatched before the first result arrives.
//!   Unset means one per worker in parallel mode and `batch_size` in basic mode.
//! - `keep_history`: whether every processed individual is kept for the outcome.

use crate::error::{OptimisationError, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOptions {
    timeout_count: usize,
    report_frequency: usize,
    num_workers: usize,
    batch_size: usize,
    initial_candidates: Option<usize>,
    keep_history: bool,
}

impl RunnerOptions {
    /// Creates a new `RunnerOptions` instance with the given budget, reporting
    /// cadence and worker count. The other fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `timeout_count` - The number of processed candidates after which the run stops.
    /// * `report_frequency` - How many processed candidates pass between progress snapshots.
    /// * `num_workers` - The number of evaluation threads used by the parallel runner.
    pub fn new(timeout_count: usize, report_frequency: usize, num_workers: usize) -> Self {
        Self {
            timeout_count,
            report_frequency,
            num_workers,
            ..Self::default()
        }
    }

    pub fn get_timeout_count(&self) -> usize {
        self.timeout_count
    }

    pub fn get_report_frequency(&self) -> usize {
        self.report_frequency
    }

    pub fn get_num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn get_initial_candidates(&self) -> Option<usize> {
        self.initial_candidates
    }

    pub fn get_keep_history(&self) -> bool {
        self.keep_history
    }

    /// Sets the processed-candidate budget.
    pub fn set_timeout_count(&mut self, timeout_count: usize) {
        self.timeout_count = timeout_count;
    }

    pub fn set_report_frequency(&mut self, report_frequency: usize) {
        self.report_frequency = report_frequency;
    }

    pub fn set_num_workers(&mut self, num_workers: usize) {
        self.num_workers = num_workers;
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    pub fn set_initial_candidates(&mut self, initial_candidates: Option<usize>) {
        self.initial_candidates = initial_candidates;
    }

    pub fn set_keep_history(&mut self, keep_history: bool) {
        self.keep_history = keep_history;
    }

    /// Checks that every count is non-zero.
    ///
    /// # Errors
    ///
    /// Returns `OptimisationError::Configuration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("Timeout count", self.timeout_count),
            ("Report frequency", self.report_frequency),
            ("Number of workers", self.num_workers),
            ("Batch size", self.batch_size),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(OptimisationError::Configuration(format!(
                "{} cannot be zero",
                name
            )));
        }
        if self.initial_candidates == Some(0) {
            return Err(OptimisationError::Configuration(
                "Initial candidates cannot be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of candidates dispatched up front. Never below `batch_size`, so
    /// the in-flight count cannot drain to zero while credits are pending.
    pub(crate) fn effective_initial_candidates(&self, fallback: usize) -> usize {
        self.initial_candidates
            .unwrap_or(fallback)
            .max(self.batch_size)
    }

    /// Returns a builder for creating a `RunnerOptions` instance.
    pub fn builder() -> RunnerOptionsBuilder {
        RunnerOptionsBuilder::default()
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            timeout_count: 1000,
            report_frequency: 100,
            num_workers: rayon::current_num_threads(),
            batch_size: 1,
            initial_candidates: None,
            keep_history: true,
        }
    }
}

/// Builder for `RunnerOptions`. Unset fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptionsBuilder {
    timeout_count: Option<usize>,
    report_frequency: Option<usize>,
    num_workers: Option<usize>,
    batch_size: Option<usize>,
    initial_candidates: Option<usize>,
    keep_history: Option<bool>,
}

impl RunnerOptionsBuilder {
    pub fn timeout_count(mut self, value: usize) -> Self {
        self.timeout_count = Some(value);
        self
    }

    pub fn report_frequency(mut self, value: usize) -> Self {
        self.report_frequency = Some(value);
        self
    }

    pub fn num_workers(mut self, value: usize) -> Self {
        self.num_workers = Some(value);
        self
    }

    pub fn batch_size(mut self, value: usize) -> Self {
        self.batch_size = Some(value);
        self
    }

    pub fn initial_candidates(mut self, value: usize) -> Self {
        self.initial_candidates = Some(value);
        self
    }

    pub fn keep_history(mut self, value: bool) -> Self {
        self.keep_history = Some(value);
        self
    }

    pub fn build(self) -> RunnerOptions {
        let defaults = RunnerOptions::default();
        RunnerOptions {
            timeout_count: self.timeout_count.unwrap_or(defaults.timeout_count),
            report_frequency: self.report_frequency.unwrap_or(defaults.report_frequency),
            num_workers: self.num_workers.unwrap_or(defaults.num_workers),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            initial_candidates: self.initial_candidates,
            keep_history: self.keep_history.unwrap_or(defaults.keep_history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunnerOptions::default();
        assert_eq!(options.get_timeout_count(), 1000);
        assert_eq!(options.get_report_frequency(), 100);
        assert_eq!(options.get_batch_size(), 1);
        assert!(options.get_num_workers() >= 1);
        assert_eq!(options.get_initial_candidates(), None);
        assert!(options.get_keep_history());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let options = RunnerOptions::builder()
            .timeout_count(10)
            .batch_size(3)
            .initial_candidates(2)
            .keep_history(false)
            .build();
        assert_eq!(options.get_timeout_count(), 10);
        assert_eq!(options.get_report_frequency(), 100);
        assert_eq!(options.get_batch_size(), 3);
        assert!(!options.get_keep_history());
        // never fewer up front than one batch
        assert_eq!(options.effective_initial_candidates(8), 3);
    }

    #[test]
    fn test_initial_candidates_fallback() {
        let options = RunnerOptions::builder().batch_size(2).build();
        assert_eq!(options.effective_initial_candidates(6), 6);
        assert_eq!(options.effective_initial_candidates(1), 2);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let mut options = RunnerOptions::default();
        options.set_timeout_count(0);
        assert_eq!(
            options.validate(),
            Err(OptimisationError::Configuration(
                "Timeout count cannot be zero".to_string()
            ))
        );

        let options = RunnerOptions::builder().num_workers(0).build();
        assert!(options.validate().is_err());

        let options = RunnerOptions::builder().initial_candidates(0).build();
        assert!(options.validate().is_err());
    }
}
