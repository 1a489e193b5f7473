//! End-to-end checks of the planner against ground truth.

use super::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

const TIGER_H2: Utility = -4.0;
const TIGER_H3: Utility = 5.1908;

fn plan<P: Problem>(problem: P, settings: Settings) -> Outcome {
    let mut planner = Planner::new(problem, settings).unwrap();
    let heuristic = Qpomdp::new(planner.problem(), planner.horizon()).unwrap();
    planner.inject(heuristic).unwrap();
    planner.plan().cloned().unwrap()
}

fn exact(horizon: usize, solver: &str, expansion: Expansion, pruning: Pruning) -> Settings {
    Settings {
        horizon,
        variant: Variant::Exact,
        expansion,
        pruning,
        solver: solver.parse().unwrap(),
        ..Settings::default()
    }
}

macro_rules! exact_matches_exhaustive {
    ($($name:ident: $solver:literal, $expansion:expr, $pruning:expr),* $(,)?) => {
        $(
            paste::paste! {
                #[test]
                fn [<exact_ $name _matches_exhaustive_enumeration>]() {
                    for seed in 0..6 {
                        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), 1.0, seed).unwrap();
                        let (_, truth) = exhaustive(&problem, 2, Deadline::none()).unwrap();
                        let outcome = plan(problem.clone(), exact(2, $solver, $expansion, $pruning));
                        assert!((outcome.value - truth).abs() < 1e-6, "seed {}: {} vs {}", seed, outcome.value, truth);
                        let policy = outcome.policy.as_ref().unwrap();
                        assert!((evaluate(&problem, policy, 2).unwrap() - outcome.value).abs() < 1e-6);
                    }
                }
            }
        )*
    };
}

#[rustfmt::skip]
exact_matches_exhaustive!(
    brute_force:             "bf",  Expansion::Full,        Pruning::Lazy,
    brute_force_eager:       "bf",  Expansion::Full,        Pruning::Eager,
    branch_and_bound:        "bnb", Expansion::Full,        Pruning::Lazy,
    incremental:             "bf",  Expansion::Incremental, Pruning::Lazy,
    incremental_bnb_eager:   "bnb", Expansion::Incremental, Pruning::Eager,
);

#[test]
fn discounted_exact_search_matches_exhaustive_enumeration() {
    for seed in 0..4 {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), 0.9, seed).unwrap();
        let (_, truth) = exhaustive(&problem, 3, Deadline::none()).unwrap();
        let outcome = plan(problem, exact(3, "bnb", Expansion::Full, Pruning::Eager));
        assert!((outcome.value - truth).abs() < 1e-6, "seed {}: {} vs {}", seed, outcome.value, truth);
    }
}

#[test]
fn clustered_exact_search_matches_exhaustive_enumeration() {
    for (seed, discount) in (0..4).zip([1.0, 1.0, 0.9, 0.9]) {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), discount, seed).unwrap();
        let (_, truth) = exhaustive(&problem, 3, Deadline::none()).unwrap();
        let settings = Settings {
            cluster: true,
            ..exact(3, "bnb", Expansion::Incremental, Pruning::Eager)
        };
        let outcome = plan(problem.clone(), settings);
        assert!((outcome.value - truth).abs() < 1e-6, "seed {}: {} vs {}", seed, outcome.value, truth);
        let policy = outcome.policy.as_ref().unwrap();
        assert!((evaluate(&problem, policy, 3).unwrap() - outcome.value).abs() < 1e-6);
    }
}

#[test]
fn clustering_keeps_the_tiger_optimum() {
    let plain = plan(DecPomdp::tiger(), exact(3, "bf", Expansion::Full, Pruning::Lazy));
    let settings = Settings {
        cluster: true,
        ..exact(3, "bf", Expansion::Full, Pruning::Lazy)
    };
    let clustered = plan(DecPomdp::tiger(), settings);
    assert!((clustered.value - TIGER_H3).abs() < 1e-3);
    assert!((clustered.value - plain.value).abs() < 1e-9);
    let policy = clustered.policy.as_ref().unwrap();
    assert!((evaluate(&DecPomdp::tiger(), policy, 3).unwrap() - clustered.value).abs() < 1e-9);
}

#[test]
fn tighter_heuristics_find_the_same_optimum() {
    let settings = exact(3, "bnb", Expansion::Incremental, Pruning::Eager);
    let mut planner = Planner::new(DecPomdp::tiger(), settings.clone()).unwrap();
    let heuristic = Qbg::new(planner.problem(), planner.horizon()).unwrap();
    planner.inject(heuristic).unwrap();
    let qbg = planner.plan().cloned().unwrap();
    let qpomdp = plan(DecPomdp::tiger(), settings.clone());
    assert!((qbg.value - TIGER_H3).abs() < 1e-3);
    assert!((qbg.value - qpomdp.value).abs() < 1e-9);
    let mut planner = Planner::new(DecPomdp::tiger(), settings).unwrap();
    let heuristic = Qbg::hybrid(planner.problem(), planner.horizon(), 2).unwrap();
    planner.inject(heuristic).unwrap();
    assert!((planner.plan().unwrap().value - TIGER_H3).abs() < 1e-3);
}

#[test]
fn tiger_horizon_two() {
    let outcome = plan(DecPomdp::tiger(), exact(2, "bf", Expansion::Full, Pruning::Lazy));
    assert!((outcome.value - TIGER_H2).abs() < 1e-9);
}

#[test]
fn tiger_horizon_three() {
    let outcome = plan(DecPomdp::tiger(), exact(3, "bnb", Expansion::Incremental, Pruning::Eager));
    assert!((outcome.value - TIGER_H3).abs() < 1e-3);
    let policy = outcome.policy.as_ref().unwrap();
    assert!((evaluate(&DecPomdp::tiger(), policy, 3).unwrap() - outcome.value).abs() < 1e-9);
}

#[test]
fn tiger_simulation_is_consistent_with_the_plan() {
    let outcome = plan(DecPomdp::tiger(), exact(2, "bf", Expansion::Full, Pruning::Lazy));
    let policy = outcome.policy.as_ref().unwrap();
    let ref mut rng = SmallRng::seed_from_u64(7);
    let simulation = simulate(&DecPomdp::tiger(), policy, 2, 20_000, rng).unwrap();
    assert!(simulation.consistent(outcome.value, 4.0), "{} vs {}", simulation, outcome.value);
}

#[test]
fn approximate_search_never_beats_the_optimum() {
    for solver in ["am", "ce", "mp", "random"] {
        let settings = Settings {
            horizon: 3,
            variant: Variant::KBest { k: 2 },
            solver: solver.parse().unwrap(),
            restarts: 2,
            ..Settings::default()
        };
        let outcome = plan(DecPomdp::tiger(), settings);
        assert!(outcome.value <= TIGER_H3 + 1e-3, "{} found {}", solver, outcome.value);
        assert_eq!(outcome.restarts_completed, 2);
        let policy = outcome.policy.as_ref().unwrap();
        assert!((evaluate(&DecPomdp::tiger(), policy, 3).unwrap() - outcome.value).abs() < 1e-9);
    }
}

#[test]
fn greedy_search_never_backtracks() {
    let settings = Settings {
        horizon: 3,
        variant: Variant::KBest { k: 1 },
        ..Settings::default()
    };
    let outcome = plan(DecPomdp::tiger(), settings);
    assert_eq!(outcome.max_pool, 1);
    assert_eq!(outcome.games, 3);
    assert!(outcome.found());
}

#[test]
fn restarts_keep_the_best_policy() {
    let settings = Settings {
        horizon: 2,
        variant: Variant::KBest { k: 1 },
        solver: "random".parse().unwrap(),
        restarts: 8,
        seed: 3,
        ..Settings::default()
    };
    let outcome = plan(DecPomdp::tiger(), settings.clone());
    let single = (0..8)
        .map(|r| Settings {
            restarts: 1,
            seed: 3 + r,
            ..settings.clone()
        })
        .map(|s| plan(DecPomdp::tiger(), s).value)
        .fold(Utility::NEG_INFINITY, f64::max);
    assert_eq!(outcome.value, single);
}

#[test]
fn slack_trades_optimality_for_a_bounded_loss() {
    for slack in [0.5, 2.0, 10.0] {
        let settings = Settings {
            slack,
            ..exact(3, "bnb", Expansion::Full, Pruning::Eager)
        };
        let outcome = plan(DecPomdp::tiger(), settings);
        assert!(outcome.value >= TIGER_H3 - slack - 1e-3, "slack {} found {}", slack, outcome.value);
        assert!(outcome.value <= TIGER_H3 + 1e-3);
        let policy = outcome.policy.as_ref().unwrap();
        assert!((evaluate(&DecPomdp::tiger(), policy, 3).unwrap() - outcome.value).abs() < 1e-9);
    }
    for seed in 0..4 {
        let problem = DecPomdp::random(Shape::uniform(2, 2, 2, 2), 1.0, seed).unwrap();
        let (_, truth) = exhaustive(&problem, 2, Deadline::none()).unwrap();
        let settings = Settings {
            slack: 1.0,
            ..exact(2, "bf", Expansion::Incremental, Pruning::Lazy)
        };
        let outcome = plan(problem, settings);
        assert!(outcome.value >= truth - 1.0 - 1e-6, "seed {}: {} vs {}", seed, outcome.value, truth);
        assert!(outcome.value <= truth + 1e-6);
    }
}

#[test]
fn crowded_pools_exhaust_the_search() {
    let settings = Settings {
        pool_limit: Some(1),
        restarts: 3,
        ..exact(3, "bf", Expansion::Full, Pruning::Lazy)
    };
    let mut planner = Planner::new(DecPomdp::tiger(), settings).unwrap();
    let heuristic = Qpomdp::new(planner.problem(), planner.horizon()).unwrap();
    planner.inject(heuristic).unwrap();
    let result = planner.plan().map(|o| o.value);
    assert!(matches!(result, Err(PlanError::ResourceExhausted(_))));
    assert_eq!(planner.phase(), Phase::Terminated);
    let roomy = Settings {
        pool_limit: Some(100_000),
        ..exact(3, "bf", Expansion::Full, Pruning::Lazy)
    };
    let outcome = plan(DecPomdp::tiger(), roomy);
    assert!((outcome.value - TIGER_H3).abs() < 1e-3);
}

#[test]
fn deadlines_interrupt_a_running_search() {
    let settings = Settings {
        deadline: Some(0.05),
        restarts: 2,
        ..exact(4, "bf", Expansion::Full, Pruning::Lazy)
    };
    let mut planner = Planner::new(DecPomdp::tiger(), settings).unwrap();
    let heuristic = Qmdp::new(planner.problem(), planner.horizon()).unwrap();
    planner.inject(heuristic).unwrap();
    let result = planner.plan().map(|o| o.value);
    match result {
        Err(PlanError::DeadlineExceeded { lower_bound, .. }) => {
            assert!(lower_bound.is_none_or(|lb| lb <= 4.81));
        }
        other => panic!("expected an abandoned search, got {:?}", other),
    }
    let outcome = planner.outcome().unwrap();
    assert_eq!(outcome.restarts_aborted, 2);
    assert_eq!(outcome.restarts_completed, 0);
    assert!(outcome.games >= 2);
    assert!(outcome.policy.is_none());
}
