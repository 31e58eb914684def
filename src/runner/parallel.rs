use std::sync::mpsc::{self, Sender};

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use tracing::{info, info_span, trace, Span};

use super::{
    CancellationToken, ProgressSink, ReinsertionStage, RunOutcome, RunnerOptions,
    TerminationReason,
};
use crate::convergence::Convergence;
use crate::error::{OptimisationError, Result};
use crate::evaluation::{EvaluationStage, Evaluator, Model};
use crate::fitness::FitnessCalculator;
use crate::individual::Individual;
use crate::optimiser::{CandidateSource, Optimiser};

/// What a worker sends back for each candidate it was given. Every dispatched
/// candidate produces exactly one message.
enum Message<R> {
    Evaluated(Individual<R>),
    Skipped,
    Rejected(OptimisationError),
}

/// Evaluates candidates on a dedicated rayon pool while the calling thread
/// performs all reinsertion.
///
/// Workers finish in any order; results are reinserted in arrival order, so
/// reinsertion indices follow processing order rather than creation order.
/// Once the run terminates, results still in flight are drained and discarded.
pub struct ParallelRunner<R, C, F, M, E, V> {
    optimiser: Optimiser<R, C, F>,
    model: M,
    evaluation: EvaluationStage<E>,
    convergence: V,
    options: RunnerOptions,
    cancel: CancellationToken,
    pool: ThreadPool,
}

impl<R, C, F, M, E, V> ParallelRunner<R, C, F, M, E, V>
where
    R: Clone + Send,
    C: CandidateSource<R>,
    F: FitnessCalculator<R>,
    M: Model<R>,
    E: Evaluator<R> + Sync,
    V: Convergence<R>,
{
    /// Builds a pool of `options.get_num_workers()` evaluation threads.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `options` fail validation or the pool cannot
    /// be created.
    pub fn new(
        optimiser: Optimiser<R, C, F>,
        model: M,
        evaluator: E,
        convergence: V,
        options: RunnerOptions,
    ) -> Result<Self> {
        options.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.get_num_workers())
            .thread_name(|i| format!("optirun-worker-{}", i))
            .build()
            .map_err(|e| {
                OptimisationError::Configuration(format!("Failed to build worker pool: {}", e))
            })?;

        Ok(Self {
            optimiser,
            model,
            evaluation: EvaluationStage::new(evaluator),
            convergence,
            options,
            cancel: CancellationToken::new(),
            pool,
        })
    }

    /// Makes the run observe `token` instead of its own, so the caller can
    /// share it before the runner is built.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs until timeout, convergence, cancellation or the first evaluation
    /// failure. Returns only after every dispatched candidate has come back.
    ///
    /// # Errors
    ///
    /// Fails with `Evaluation` if the evaluator failed on any candidate, and
    /// propagates candidate-generation and fitness errors.
    pub fn run<S>(self, mut sink: S) -> Result<RunOutcome<R>>
    where
        S: ProgressSink<R>,
    {
        let workers = self.options.get_num_workers();
        let span = info_span!("optimise", mode = "parallel", workers);
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
            pool,
        } = self;
        let initial = options.effective_initial_candidates(workers);
        let mut stage = ReinsertionStage::new(optimiser, model, convergence, &options, cancel.clone());
        let evaluation = &evaluation;

        let (tx, rx) = mpsc::channel::<Message<R>>();
        let result: Result<()> = pool.in_place_scope(|scope| {
            let mut in_flight = 0usize;
            for individual in stage.request(initial)? {
                dispatch(scope, evaluation, &tx, &cancel, &span, individual);
                in_flight += 1;
            }

            let mut fatal = None;
            while in_flight > 0 {
                // we hold a sender ourselves, so this only fails if that invariant breaks
                let Ok(message) = rx.recv() else { break };
                in_flight -= 1;

                let individual = match message {
                    Message::Evaluated(individual) => individual,
                    Message::Skipped => continue,
                    Message::Rejected(err) => {
                        cancel.cancel();
                        fatal.get_or_insert(err);
                        continue;
                    }
                };
                if fatal.is_some() || stage.is_terminated() {
                    trace!(in_flight, "discarding result after termination");
                    continue;
                }
                if cancel.is_cancelled() {
                    stage.halt(TerminationReason::Cancelled, &mut sink);
                    continue;
                }

                match stage.process(individual, &mut sink) {
                    Ok(next) => {
                        for individual in next {
                            dispatch(scope, evaluation, &tx, &cancel, &span, individual);
                            in_flight += 1;
                        }
                    }
                    Err(err) => {
                        cancel.cancel();
                        fatal = Some(err);
                    }
                }
            }

            fatal.map_or(Ok(()), Err)
        });
        result?;

        stage.finish()
    }
}

fn dispatch<'scope, R, E>(
    scope: &Scope<'scope>,
    evaluation: &'scope EvaluationStage<E>,
    tx: &Sender<Message<R>>,
    cancel: &CancellationToken,
    span: &Span,
    mut individual: Individual<R>,
) where
    R: Send + 'scope,
    E: Evaluator<R> + Sync,
{
    let tx = tx.clone();
    let cancel = cancel.clone();
    let span = span.clone();
    trace!("dispatching candidate");
    scope.spawn(move |_| {
        let _entered = span.enter();
        let message = if cancel.is_cancelled() {
            Message::Skipped
        } else {
            match evaluation.evaluate(&mut individual) {
                Ok(()) => Message::Evaluated(individual),
                Err(err) => Message::Rejected(err),
            }
        };
        // the receiver outlives every worker
        let _ = tx.send(message);
    });
}
