use std::fmt;
use std::time::Duration;

use crate::individual::Individual;
use crate::population::Population;

/// A snapshot of the population taken after `index` candidates were processed.
#[derive(Debug, Clone)]
pub struct ProgressReport<R> {
    pub index: usize,
    pub population: Population<R>,
}

/// Receives progress snapshots during a run.
///
/// Any `FnMut(ProgressReport<R>)` is a sink, so forwarding to a channel is a
/// one-line closure:
///
/// ```rust
/// use std::sync::mpsc;
/// use optirun::population::Population;
/// use optirun::runner::{ProgressReport, ProgressSink};
///
/// let (tx, rx) = mpsc::channel::<ProgressReport<Vec<f64>>>();
/// let mut sink = move |report: ProgressReport<Vec<f64>>| {
///     let _ = tx.send(report);
/// };
/// sink.report(ProgressReport { index: 1, population: Population::new(None) });
/// assert_eq!(rx.recv().unwrap().index, 1);
/// ```
pub trait ProgressSink<R> {
    fn report(&mut self, report: ProgressReport<R>);
}

impl<R, F> ProgressSink<R> for F
where
    F: FnMut(ProgressReport<R>),
{
    fn report(&mut self, report: ProgressReport<R>) {
        self(report)
    }
}

/// A sink that drops every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl<R> ProgressSink<R> for NoProgress {
    fn report(&mut self, _report: ProgressReport<R>) {}
}

/// Why a run stopped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// The processed-candidate budget was used up.
    Timeout,
    /// The population was full and the convergence check passed.
    Converged,
    /// The cancellation token was triggered from outside the run.
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Timeout => "timeout",
            Self::Converged => "converged",
            Self::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// Everything a successful run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome<R> {
    /// The lowest-fitness individual ever processed, whether or not the
    /// population kept it.
    pub best: Option<Individual<R>>,
    /// Every processed individual in processing order; empty when history is off.
    pub history: Vec<Individual<R>>,
    pub final_population: Population<R>,
    pub processed: usize,
    pub elapsed: Duration,
    pub termination: TerminationReason,
}

impl<R> RunOutcome<R> {
    /// Fitness of the best individual, if anything was processed.
    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().and_then(|b| b.fitness().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink_collects() {
        let mut seen = Vec::new();
        {
            let mut sink = |report: ProgressReport<()>| seen.push(report.index);
            sink.report(ProgressReport {
                index: 3,
                population: Population::new(Some(2)),
            });
            sink.report(ProgressReport {
                index: 6,
                population: Population::new(Some(2)),
            });
        }
        assert_eq!(seen, vec![3, 6]);
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(TerminationReason::Timeout.to_string(), "timeout");
        assert_eq!(TerminationReason::Converged.to_string(), "converged");
        assert_eq!(TerminationReason::Cancelled.to_string(), "cancelled");
    }
}
