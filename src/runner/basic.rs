use std::collections::VecDeque;

use tracing::{info, info_span, trace};

use super::{
    CancellationToken, ProgressSink, ReinsertionStage, RunOutcome, RunnerOptions,
    TerminationReason,
};
use crate::convergence::Convergence;
use crate::error::Result;
use crate::evaluation::{EvaluationStage, Evaluator, Model};
use crate::fitness::FitnessCalculator;
use crate::optimiser::{CandidateSource, Optimiser};

/// Runs evaluation and reinsertion on the calling thread.
///
/// Candidates are evaluated one after another in the order the optimiser
/// produced them; with the default batch size of 1 there is exactly one
/// candidate in flight at any time.
pub struct BasicRunner<R, C, F, M, E, V> {
    optimiser: Optimiser<R, C, F>,
    model: M,
    evaluation: EvaluationStage<E>,
    convergence: V,
    options: RunnerOptions,
    cancel: CancellationToken,
}

impl<R, C, F, M, E, V> BasicRunner<R, C, F, M, E, V>
where
    R: Clone,
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
    M: Model<R>,
    E: Evaluator<R>,
    V: Convergence<R>,
{
    /// # Errors
    ///
    /// Returns `Configuration` if `options` fail validation.
    pub fn new(
        optimiser: Optimiser<R, C, F>,
        model: M,
        evaluator: E,
        convergence: V,
        options: RunnerOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            optimiser,
            model,
            evaluation: EvaluationStage::new(evaluator),
            convergence,
            options,
            cancel: CancellationToken::new(),
        })
    }

    /// Makes the run observe `token` instead of its own, so the caller can
    /// share it before the runner is built.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that stops the run when cancelled, from any thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs until timeout, convergence, cancellation or the first evaluation
    /// failure.
    ///
    /// # Errors
    ///
    /// Fails with `Evaluation` if the evaluator failed on any candidate, and
    /// propagates candidate-generation and fitness errors.
    pub fn run<S>(self, mut sink: S) -> Result<RunOutcome<R>>
    where
        S: ProgressSink<R>,
    {
        let span = info_span!("optimise", mode = "basic");
        let _entered = span.enter();
        info!(
            timeout = self.options.get_timeout_count(),
            batch_size = self.options.get_batch_size(),
            "starting optimisation"
        );

        let Self {
            optimiser,
            model,
            evaluation,
            convergence,
            options,
            cancel,
        } = self;
        let initial = options.effective_initial_candidates(options.get_batch_size());
        let mut stage = ReinsertionStage::new(optimiser, model, convergence, &options, cancel.clone());

        let mut queue: VecDeque<_> = stage.request(initial)?.into();
        while let Some(mut individual) = queue.pop_front() {
            if cancel.is_cancelled() {
                stage.halt(TerminationReason::Cancelled, &mut sink);
                break;
            }
            trace!(queued = queue.len(), "evaluating candidate");
            evaluation.evaluate(&mut individual)?;
            let next = stage.process(individual, &mut sink)?;
            if stage.is_terminated() {
                break;
            }
            queue.extend(next);
        }

        stage.finish()
    }
}
