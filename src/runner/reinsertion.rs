use std::cmp::Ordering;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use super::{
    CancellationToken, ProgressReport, ProgressSink, RunOutcome, RunnerOptions, TerminationReason,
};
use crate::convergence::Convergence;
use crate::error::{OptimisationError, Result};
use crate::evaluation::Model;
use crate::fitness::FitnessCalculator;
use crate::individual::{Individual, PropertyKey, PropertyValue};
use crate::optimiser::{CandidateSource, Optimiser};
use crate::population::{compare_fitness, Population};

/// The single writer of a run.
///
/// Every evaluated individual passes through [`process`](Self::process), which
/// is the only place the optimiser, and therefore the population, is touched.
/// The stage also owns the run's bookkeeping: the processed count, the best
/// individual seen, the history, the first evaluation failure and the
/// termination decision.
///
/// New candidates are handed out on a credit basis: every `batch_size`
/// processed individuals buy `batch_size` new ones, which keeps the number in
/// flight constant.
pub struct ReinsertionStage<R, C, F, M, V> {
    optimiser: Optimiser<R, C, F>,
    model: M,
    convergence: V,
    cancel: CancellationToken,
    timeout_count: usize,
    report_frequency: usize,
    batch_size: usize,
    keep_history: bool,
    processed: usize,
    credits: usize,
    best: Option<Individual<R>>,
    history: Vec<Individual<R>>,
    failure: Option<OptimisationError>,
    termination: Option<TerminationReason>,
    started: Instant,
}

impl<R, C, F, M, V> ReinsertionStage<R, C, F, M, V>
where
    R: Clone,
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
    M: Model<R>,
    V: Convergence<R>,
{
    pub fn new(
        optimiser: Optimiser<R, C, F>,
        model: M,
        convergence: V,
        options: &RunnerOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            optimiser,
            model,
            convergence,
            cancel,
            timeout_count: options.get_timeout_count(),
            report_frequency: options.get_report_frequency(),
            batch_size: options.get_batch_size(),
            keep_history: options.get_keep_history(),
            processed: 0,
            credits: 0,
            best: None,
            history: Vec::new(),
            failure: None,
            termination: None,
            started: Instant::now(),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn population(&self) -> &Population<R> {
        self.optimiser.population()
    }

    pub fn best(&self) -> Option<&Individual<R>> {
        self.best.as_ref()
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Whether no more individuals should be processed.
    pub fn is_terminated(&self) -> bool {
        self.termination.is_some() || self.failure.is_some()
    }

    /// Asks the optimiser for `count` candidates and prepares each for
    /// evaluation, leaving them `Evaluating`.
    pub fn request(&mut self, count: usize) -> Result<Vec<Individual<R>>> {
        let mut batch = self.optimiser.get_next_to_evaluate(count)?;
        for individual in &mut batch {
            self.model.prepare_for_evaluation(individual)?;
        }
        Ok(batch)
    }

    /// Scores and reinserts one evaluated individual, then decides whether the
    /// run is over. Returns the candidates to dispatch next, which is empty
    /// once the run has terminated or while credits are still accumulating.
    pub fn process<S>(
        &mut self,
        mut individual: Individual<R>,
        sink: &mut S,
    ) -> Result<Vec<Individual<R>>>
    where
        S: ProgressSink<R> + ?Sized,
    {
        if self.is_terminated() {
            return Err(OptimisationError::InvalidState(
                "the run has already terminated".to_string(),
            ));
        }

        let index = self.processed;
        self.processed += 1;
        individual
            .properties_mut()
            .set(PropertyKey::ReinsertionIndex, PropertyValue::Index(index));

        if let Some(message) = individual.evaluation_error() {
            let creation = individual.creation_index().unwrap_or(index);
            warn!(candidate = creation, error = %message, "evaluation failure ends the run");
            self.failure = Some(OptimisationError::Evaluation {
                index: creation,
                message: message.to_string(),
            });
        }

        self.optimiser.assign_fitness(&mut individual)?;
        let fitness = individual.fitness()?;
        if self
            .best
            .as_ref()
            .map_or(true, |best| compare_fitness(fitness, best.sort_key()) == Ordering::Less)
        {
            debug!(index, fitness, "new best");
            self.best = Some(individual.clone());
        }
        if self.keep_history {
            self.history.push(individual.clone());
        }

        let inserted = self.optimiser.reinsert_scored(individual)?;
        trace!(index, fitness, inserted, "candidate reinserted");

        if self.failure.is_none() {
            self.termination = self.check_termination();
        }

        if self.is_terminated() {
            self.snapshot(sink);
            self.cancel.cancel();
            if let Some(reason) = self.termination {
                info!(processed = self.processed, %reason, "run terminated");
            }
            return Ok(Vec::new());
        }
        if self.processed % self.report_frequency == 0 {
            self.snapshot(sink);
        }

        self.credits += 1;
        if self.credits < self.batch_size {
            return Ok(Vec::new());
        }
        self.credits = 0;
        self.request(self.batch_size)
    }

    /// Ends the run for `reason` unless it has already ended.
    pub fn halt<S>(&mut self, reason: TerminationReason, sink: &mut S)
    where
        S: ProgressSink<R> + ?Sized,
    {
        if self.is_terminated() {
            return;
        }
        self.termination = Some(reason);
        self.cancel.cancel();
        self.snapshot(sink);
        info!(processed = self.processed, %reason, "run terminated");
    }

    /// Turns the stage into the run's outcome, or into the first evaluation
    /// failure if one was observed.
    pub fn finish(self) -> Result<RunOutcome<R>> {
        let elapsed = self.started.elapsed();
        if let Some(failure) = self.failure {
            return Err(failure);
        }

        // a run that ends without a decision was cancelled before processing anything
        let termination = self.termination.unwrap_or(TerminationReason::Cancelled);
        let best_fitness = self.best.as_ref().and_then(|b| b.fitness().ok());
        info!(
            processed = self.processed,
            elapsed_ms = elapsed.as_millis() as u64,
            best_fitness,
            %termination,
            "optimisation finished"
        );

        Ok(RunOutcome {
            best: self.best,
            history: self.history,
            final_population: self.optimiser.into_population(),
            processed: self.processed,
            elapsed,
            termination,
        })
    }

    fn check_termination(&self) -> Option<TerminationReason> {
        let population = self.optimiser.population();
        if self.cancel.is_cancelled() {
            Some(TerminationReason::Cancelled)
        } else if self.processed >= self.timeout_count {
            Some(TerminationReason::Timeout)
        } else if population.is_target_size_reached() && self.convergence.converged(population) {
            Some(TerminationReason::Converged)
        } else {
            None
        }
    }

    fn snapshot<S>(&self, sink: &mut S)
    where
        S: ProgressSink<R> + ?Sized,
    {
        let population = self.optimiser.population();
        debug!(
            index = self.processed,
            size = population.len(),
            best = population.best().ok().and_then(|b| b.fitness().ok()),
            worst = population.worst().ok().and_then(|w| w.fitness().ok()),
            "progress"
        );
        sink.report(ProgressReport {
            index: self.processed,
            population: population.clone(),
        });
    }
}
