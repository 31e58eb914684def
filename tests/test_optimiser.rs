use optirun::{
    error::{OptimisationError, Result},
    evaluation::{EvaluationFailure, EvaluationStage, Evaluator, IdentityModel, Model},
    fitness::{ConstantPenalty, PenaltyFitness, PenaltyFn},
    individual::{Individual, IndividualState, PropertyKey},
    optimiser::{
        replace_worst_if_better, CandidateSource, EvolutionarySearch, OptimiserBuilder,
        RandomSearch, GENERATION_RETRY_MARGIN,
    },
    population::Population,
    space::{DecisionSpace, DecisionVector},
};
use std::sync::Arc;

struct Sphere;

impl Evaluator<Vec<f64>> for Sphere {
    fn evaluate(&self, x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
        Ok(vec![x.iter().map(|v| v * v).sum()])
    }
}

// Legal only inside the unit ball
struct UnitBall;

impl Evaluator<Vec<f64>> for UnitBall {
    fn legality(&self, x: &Vec<f64>) -> bool {
        x.iter().map(|v| v * v).sum::<f64>() <= 1.0
    }

    fn evaluate(&self, x: &Vec<f64>) -> std::result::Result<Vec<f64>, EvaluationFailure> {
        Ok(vec![x[0]])
    }
}

struct NeverAcceptable {
    space: Arc<DecisionSpace>,
    proposals: usize,
}

impl CandidateSource<Vec<f64>> for NeverAcceptable {
    fn next_decision_vector(&mut self, _population: &Population<Vec<f64>>) -> Result<DecisionVector> {
        self.proposals += 1;
        DecisionVector::new(Arc::clone(&self.space), vec![0.0])
    }

    fn check_acceptable(&self, _candidate: &Individual<Vec<f64>>, _population: &Population<Vec<f64>>) -> bool {
        false
    }

    fn try_reinsert(
        &mut self,
        population: &mut Population<Vec<f64>>,
        individual: Individual<Vec<f64>>,
    ) -> Result<bool> {
        replace_worst_if_better(population, individual)
    }
}

fn evaluate_all<E: Evaluator<Vec<f64>>>(stage: &EvaluationStage<E>, batch: &mut [Individual<Vec<f64>>]) {
    for ind in batch.iter_mut() {
        IdentityModel.prepare_for_evaluation(ind).unwrap();
        stage.evaluate(ind).unwrap();
    }
}

#[test]
fn test_retry_bound_never_hangs() {
    let space = Arc::new(DecisionSpace::uniform(1, -1.0, 1.0).unwrap());
    for desired in [1, 5, 40] {
        let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
            .with_candidate_source(NeverAcceptable {
                space: Arc::clone(&space),
                proposals: 0,
            })
            .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1.0)))
            .build()
            .unwrap();
        let err = optimiser.get_next_to_evaluate(desired).unwrap_err();
        assert!(matches!(err, OptimisationError::GenerationTimeout { .. }));
        assert!(optimiser.source().proposals <= desired + GENERATION_RETRY_MARGIN);
    }
}

#[test]
fn test_reinsert_requires_evaluated_state() {
    let space = Arc::new(DecisionSpace::uniform(2, -1.0, 1.0).unwrap());
    let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
        .with_candidate_source(RandomSearch::from_seed(space, 4))
        .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1.0)))
        .build()
        .unwrap();

    let fresh = optimiser.get_next_to_evaluate(1).unwrap();
    assert_eq!(fresh[0].state(), IndividualState::New);
    assert!(matches!(
        optimiser.reinsert(fresh.clone()),
        Err(OptimisationError::InvalidState(_))
    ));

    let mut evaluating = fresh;
    IdentityModel.prepare_for_evaluation(&mut evaluating[0]).unwrap();
    assert!(matches!(
        optimiser.reinsert(evaluating),
        Err(OptimisationError::InvalidState(_))
    ));
    assert!(optimiser.population().is_empty());
}

#[test]
fn test_penalty_from_decision_vector() {
    let space = Arc::new(DecisionSpace::uniform(2, -2.0, 2.0).unwrap());
    let distance_outside = |dv: &DecisionVector| {
        let norm = dv.values().iter().map(|v| v * v).sum::<f64>().sqrt();
        100.0 + (norm - 1.0).max(0.0)
    };
    let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
        .with_candidate_source(RandomSearch::from_seed(space, 5))
        .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], PenaltyFn(distance_outside)))
        .build()
        .unwrap();
    let stage = EvaluationStage::new(UnitBall);

    let mut batch = optimiser.get_next_to_evaluate(50).unwrap();
    evaluate_all(&stage, &mut batch);
    let illegal = batch.iter().filter(|i| !i.legal().unwrap()).count();
    assert!(illegal > 0);

    assert_eq!(optimiser.reinsert(batch).unwrap(), 50);
    for member in optimiser.population() {
        let fitness = member.fitness().unwrap();
        if member.legal().unwrap() {
            assert!(fitness.abs() <= 1.0);
        } else {
            assert!(fitness >= 100.0);
        }
        assert!(member.properties().contains(&PropertyKey::ReinsertionTime));
    }
}

#[test]
fn test_evolutionary_ask_tell_improves() {
    let space = Arc::new(DecisionSpace::uniform(3, -5.0, 5.0).unwrap());
    let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
        .with_candidate_source(EvolutionarySearch::new(space).with_seed(7))
        .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1e9)))
        .with_target_size(20)
        .build()
        .unwrap();
    let stage = EvaluationStage::new(Sphere);

    let mut batch = optimiser.get_next_to_evaluate(20).unwrap();
    evaluate_all(&stage, &mut batch);
    optimiser.reinsert(batch).unwrap();
    let initial_best = optimiser.population().best().unwrap().fitness().unwrap();

    for _ in 0..300 {
        let mut batch = optimiser.get_next_to_evaluate(4).unwrap();
        evaluate_all(&stage, &mut batch);
        optimiser.reinsert(batch).unwrap();
    }

    let population = optimiser.population();
    assert_eq!(population.len(), 20);
    let final_best = population.best().unwrap().fitness().unwrap();
    assert!(final_best <= initial_best);
    assert!(final_best < 1.0, "best fitness {}", final_best);
    assert_eq!(optimiser.created(), 20 + 300 * 4);
}

#[test]
fn test_creation_indices_are_unique_and_increasing() {
    let space = Arc::new(DecisionSpace::uniform(1, 0.0, 1.0).unwrap());
    let mut optimiser = OptimiserBuilder::<Vec<f64>, _, _>::new()
        .with_candidate_source(RandomSearch::from_seed(space, 8))
        .with_fitness(PenaltyFitness::new(|s: &[f64]| s[0], ConstantPenalty(1.0)))
        .build()
        .unwrap();
    let mut indices = Vec::new();
    for n in [3, 1, 4] {
        for ind in optimiser.get_next_to_evaluate(n).unwrap() {
            indices.push(ind.creation_index().unwrap());
        }
    }
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
}
