pub mod convergence;
pub mod error;
pub mod evaluation;
pub mod fitness;
pub mod individual;
pub mod optimiser;
pub mod population;
pub mod rng;
pub mod runner;
pub mod space;

// Re-export commonly used types for convenience
pub use error::{OptimisationError, OptionExt, Result};
pub use individual::{Individual, IndividualState};
pub use optimiser::{CandidateSource, Optimiser, OptimiserBuilder};
pub use population::Population;
pub use runner::{BasicRunner, ParallelRunner, RunOutcome, RunnerOptions};
pub use space::{DecisionSpace, DecisionVector, Variable};
