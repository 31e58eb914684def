//! # Runner
//!
//! Drives an [`Optimiser`](crate::optimiser::Optimiser) to completion.
//!
//! Both runners share the same pipeline: candidates leave a
//! [`ReinsertionStage`], are evaluated by an
//! [`EvaluationStage`](crate::evaluation::EvaluationStage) and come back to the
//! reinsertion stage, which is the only code that touches the population.
//!
//! - [`BasicRunner`] evaluates on the calling thread.
//! - [`ParallelRunner`] evaluates on a rayon pool of `num_workers` threads.
//!
//! A run ends when the processed-candidate budget is used up, when the
//! population is full and the convergence check passes, when its
//! [`CancellationToken`] is cancelled, or when the evaluator fails. The last
//! case is reported as an error; the others produce a [`RunOutcome`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use optirun::convergence::FitnessDivergence;
//! use optirun::evaluation::{EvaluationFailure, Evaluator, IdentityModel};
//! use optirun::fitness::{ConstantPenalty, PenaltyFitness};
//! use optirun::optimiser::{OptimiserBuilder, RandomSearch};
//! use optirun::runner::{BasicRunner, NoProgress, RunnerOptions};
//! use optirun::space::DecisionSpace;
//!
//! struct Sphere;
//!
//! impl Evaluator<Vec<f64>> for Sphere {
//!     fn evaluate(&self, x: &Vec<f64>) -> Result<Vec<f64>, EvaluationFailure> {
//!         Ok(vec![x.iter().map(|v| v * v).sum()])
//!     }
//! }
//!
//! let space = Arc::new(DecisionSpace::uniform(2, -5.0, 5.0).unwrap());
//! let optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
//!     .with_candidate_source(RandomSearch::from_seed(space, 42))
//!     .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1e9)))
//!     .with_target_size(10)
//!     .build()
//!     .unwrap();
//!
//! let options = RunnerOptions::builder().timeout_count(200).build();
//! let runner = BasicRunner::new(
//!     optimiser,
//!     IdentityModel,
//!     Sphere,
//!     FitnessDivergence::new(1e-9),
//!     options,
//! )
//! .unwrap();
//!
//! let outcome = runner.run(NoProgress).unwrap();
//! assert!(outcome.processed <= 200);
//! assert_eq!(outcome.final_population.len(), 10);
//! ```
pub mod basic;
pub mod cancel;
pub mod options;
pub mod parallel;
pub mod reinsertion;
pub mod report;

pub use basic::BasicRunner;
pub use cancel::CancellationToken;
pub use options::{RunnerOptions, RunnerOptionsBuilder};
pub use parallel::ParallelRunner;
pub use reinsertion::ReinsertionStage;
pub use report::{NoProgress, ProgressReport, ProgressSink, RunOutcome, TerminationReason};
