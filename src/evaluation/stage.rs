use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

use super::Evaluator;
use crate::error::{OptimisationError, Result};
use crate::individual::{Individual, IndividualState, PropertyKey, PropertyValue};

enum Outcome {
    Illegal,
    Solved(Vec<f64>),
    Failed(String),
}

/// Drives an [`Evaluator`] over individuals.
///
/// The stage holds no mutable state, so one instance can serve any number of
/// worker threads. Evaluator failures never escape it: a returned error or a
/// panic leaves the individual `Evaluated`, illegal, and carrying the failure
/// message under [`PropertyKey::EvaluationError`].
#[derive(Debug, Clone)]
pub struct EvaluationStage<E> {
    evaluator: E,
}

impl<E> EvaluationStage<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Moves an `Evaluating` individual to `Evaluated`.
    ///
    /// # Errors
    ///
    /// Only lifecycle violations are reported: an individual that is not
    /// `Evaluating` yields `InvalidState`. Evaluator failures are captured on
    /// the individual instead.
    pub fn evaluate<R>(&self, individual: &mut Individual<R>) -> Result<()>
    where
        E: Evaluator<R>,
    {
        if individual.state() != IndividualState::Evaluating {
            return Err(OptimisationError::InvalidState(format!(
                "cannot evaluate an individual in state {} (expected {})",
                individual.state(),
                IndividualState::Evaluating
            )));
        }

        let outcome = {
            let reality = individual.reality()?;
            match panic::catch_unwind(AssertUnwindSafe(|| self.evaluator.legality(reality))) {
                Err(payload) => Outcome::Failed(panic_message(payload)),
                Ok(false) => Outcome::Illegal,
                Ok(true) => {
                    match panic::catch_unwind(AssertUnwindSafe(|| self.evaluator.evaluate(reality)))
                    {
                        Ok(Ok(solution)) => Outcome::Solved(solution),
                        Ok(Err(err)) => Outcome::Failed(err.to_string()),
                        Err(payload) => Outcome::Failed(panic_message(payload)),
                    }
                }
            }
        };

        match outcome {
            Outcome::Illegal => {
                trace!("candidate is illegal");
                individual.mark_illegal()
            }
            Outcome::Failed(message) => {
                warn!(error = %message, "evaluation failed");
                individual.mark_failed(message)
            }
            Outcome::Solved(solution) => {
                let keys = self.evaluator.solution_keys();
                match store_solution(individual, &keys, &solution) {
                    Ok(()) => individual.set_solution(solution),
                    Err(message) => {
                        warn!(error = %message, "evaluation failed");
                        individual.mark_failed(message)
                    }
                }
            }
        }
    }
}

fn store_solution<R>(
    individual: &mut Individual<R>,
    keys: &[String],
    solution: &[f64],
) -> std::result::Result<(), String> {
    match keys {
        [key] => {
            individual.properties_mut().set(
                PropertyKey::Solution(key.clone()),
                PropertyValue::Vector(solution.to_vec()),
            );
            Ok(())
        }
        _ if keys.len() == solution.len() => {
            let properties = individual.properties_mut();
            for (key, value) in keys.iter().zip(solution) {
                properties.set(PropertyKey::Solution(key.clone()), PropertyValue::Real(*value));
            }
            Ok(())
        }
        _ => Err(format!(
            "evaluator declared {} solution keys but returned {} values",
            keys.len(),
            solution.len()
        )),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("evaluator panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("evaluator panicked: {}", s)
    } else {
        "evaluator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{EvaluationFailure, IdentityModel, Model};
    use crate::space::{DecisionSpace, DecisionVector};
    use std::sync::Arc;

    struct Sphere;

    impl Evaluator<Vec<f64>> for Sphere {
        fn evaluate(&self, x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
            Ok(vec![x.iter().map(|v| v * v).sum()])
        }
    }

    struct NeverLegal;

    impl Evaluator<Vec<f64>> for NeverLegal {
        fn legality(&self, _x: &Vec<f64>) -> bool {
            false
        }

        fn evaluate(&self, _x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
            panic!("illegal candidates must not be evaluated")
        }
    }

    struct Failing;

    impl Evaluator<Vec<f64>> for Failing {
        fn evaluate(&self, _x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
            Err("solver diverged".into())
        }
    }

    struct Panicking;

    impl Evaluator<Vec<f64>> for Panicking {
        fn evaluate(&self, _x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
            panic!("index out of bounds")
        }
    }

    struct TwoObjectives {
        keys: Vec<String>,
    }

    impl Evaluator<Vec<f64>> for TwoObjectives {
        fn evaluate(&self, x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
            Ok(vec![x[0], -x[0]])
        }

        fn solution_keys(&self) -> Vec<String> {
            self.keys.clone()
        }
    }

    fn prepared(x: f64) -> Individual<Vec<f64>> {
        let space = Arc::new(DecisionSpace::uniform(1, -5.0, 5.0).unwrap());
        let mut ind = Individual::new(DecisionVector::new(space, vec![x]).unwrap());
        IdentityModel.prepare_for_evaluation(&mut ind).unwrap();
        ind
    }

    #[test]
    fn test_legal_evaluation() {
        let stage = EvaluationStage::new(Sphere);
        let mut ind = prepared(2.0);
        stage.evaluate(&mut ind).unwrap();
        assert_eq!(ind.state(), IndividualState::Evaluated);
        assert!(ind.legal().unwrap());
        assert_eq!(ind.solution().unwrap(), &[4.0]);
        assert_eq!(
            ind.properties()
                .vector(&PropertyKey::Solution("solution".into()))
                .unwrap(),
            &[4.0]
        );
    }

    #[test]
    fn test_illegal_is_not_an_error() {
        let stage = EvaluationStage::new(NeverLegal);
        let mut ind = prepared(1.0);
        stage.evaluate(&mut ind).unwrap();
        assert_eq!(ind.state(), IndividualState::Evaluated);
        assert!(!ind.legal().unwrap());
        assert!(ind.solution().is_err());
        assert!(ind.evaluation_error().is_none());
    }

    #[test]
    fn test_returned_error_is_captured() {
        let stage = EvaluationStage::new(Failing);
        let mut ind = prepared(1.0);
        stage.evaluate(&mut ind).unwrap();
        assert_eq!(ind.state(), IndividualState::Evaluated);
        assert!(!ind.legal().unwrap());
        assert_eq!(ind.evaluation_error(), Some("solver diverged"));
    }

    #[test]
    fn test_panic_is_captured() {
        let stage = EvaluationStage::new(Panicking);
        let mut ind = prepared(1.0);
        stage.evaluate(&mut ind).unwrap();
        assert_eq!(ind.state(), IndividualState::Evaluated);
        assert!(!ind.legal().unwrap());
        assert!(ind
            .evaluation_error()
            .unwrap()
            .contains("index out of bounds"));
    }

    #[test]
    fn test_components_under_their_keys() {
        let stage = EvaluationStage::new(TwoObjectives {
            keys: vec!["cost".into(), "gain".into()],
        });
        let mut ind = prepared(3.0);
        stage.evaluate(&mut ind).unwrap();
        let props = ind.properties();
        assert_eq!(props.real(&PropertyKey::Solution("cost".into())).unwrap(), 3.0);
        assert_eq!(props.real(&PropertyKey::Solution("gain".into())).unwrap(), -3.0);
        assert_eq!(ind.solution().unwrap(), &[3.0, -3.0]);
    }

    #[test]
    fn test_key_mismatch_is_a_failure() {
        let stage = EvaluationStage::new(TwoObjectives {
            keys: vec!["a".into(), "b".into(), "c".into()],
        });
        let mut ind = prepared(3.0);
        stage.evaluate(&mut ind).unwrap();
        assert!(!ind.legal().unwrap());
        assert!(ind.evaluation_error().unwrap().contains("3 solution keys"));
    }

    #[test]
    fn test_wrong_state() {
        let stage = EvaluationStage::new(Sphere);
        let space = Arc::new(DecisionSpace::uniform(1, -5.0, 5.0).unwrap());
        let mut ind: Individual<Vec<f64>> =
            Individual::new(DecisionVector::new(space, vec![1.0]).unwrap());
        assert!(matches!(
            stage.evaluate(&mut ind),
            Err(OptimisationError::InvalidState(_))
        ));

        let mut done = prepared(1.0);
        stage.evaluate(&mut done).unwrap();
        assert!(matches!(
            stage.evaluate(&mut done),
            Err(OptimisationError::InvalidState(_))
        ));
    }
}
