// tests/property_scheduler.rs

mod common;
use crate::common::builders::{PipelineBuilder, StepBuilder};

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use proptest::prelude::*;

use cascade::dag::{CompiledGraph, Scheduler, SchedulerOptions, StepId, StepRunState};
use cascade::engine::StepOutcome;
use cascade::types::FailurePolicy;

// Acyclic by construction: step N may only depend on steps 0..N-1.
fn dag_strategy(max_steps: usize) -> impl Strategy<Value = CompiledGraph> {
    (1..=max_steps).prop_flat_map(|num_steps| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_steps),
            num_steps,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut builder = PipelineBuilder::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("step_{i:02}");
                let mut step = StepBuilder::new(&format!("echo {name}"));

                let valid: HashSet<usize> = if i > 0 {
                    potential_deps.into_iter().map(|d| d % i).collect()
                } else {
                    HashSet::new()
                };
                for dep in valid {
                    step = step.after(&format!("step_{dep:02}"));
                }
                builder = builder.with_step(&name, step.build());
            }
            builder.compile()
        })
    })
}

struct Simulation {
    /// Steps in the order they were dispatched.
    dispatched: Vec<StepId>,
    iterations: usize,
}

/// Drive the scheduler to completion, completing running steps in the order
/// chosen by `picks`. Steps whose index is in `failing` report failure.
fn simulate(
    scheduler: &mut Scheduler,
    picks: &[usize],
    failing: &HashSet<usize>,
) -> Simulation {
    let mut running: Vec<StepId> = Vec::new();
    let mut dispatched = Vec::new();

    let start = scheduler.start();
    for s in start.newly_scheduled {
        dispatched.push(s.id);
        running.push(s.id);
    }

    let mut iterations = 0;
    while !running.is_empty() {
        let pick = picks.get(iterations).copied().unwrap_or(0) % running.len();
        let id = running.swap_remove(pick);
        let outcome = if failing.contains(&id.index()) {
            StepOutcome::Failed(1)
        } else {
            StepOutcome::Success
        };

        let step = scheduler.handle_completion(id, outcome);
        for s in step.newly_scheduled {
            dispatched.push(s.id);
            running.push(s.id);
        }
        iterations += 1;
    }

    Simulation {
        dispatched,
        iterations,
    }
}

proptest! {
    #[test]
    fn every_step_runs_once_after_its_predecessors(
        graph in dag_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 0..40),
    ) {
        let graph = Arc::new(graph);
        let mut scheduler = Scheduler::new(Arc::clone(&graph), SchedulerOptions::default());

        let sim = simulate(&mut scheduler, &picks, &HashSet::new());

        prop_assert!(scheduler.is_finished());
        prop_assert_eq!(sim.dispatched.len(), graph.len());
        prop_assert_eq!(sim.iterations, graph.len());

        let unique: HashSet<StepId> = sim.dispatched.iter().copied().collect();
        prop_assert_eq!(unique.len(), graph.len());

        // Every predecessor is dispatched strictly before its successor.
        for (pos, id) in sim.dispatched.iter().enumerate() {
            for pred in graph.predecessors_of(*id) {
                let pred_pos = sim.dispatched.iter().position(|d| d == pred);
                prop_assert!(matches!(pred_pos, Some(p) if p < pos));
            }
        }

        prop_assert!(scheduler.report().is_success());
    }

    #[test]
    fn failures_never_let_dependents_start(
        graph in dag_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 0..40),
        failing in proptest::collection::hash_set(0..12usize, 0..4),
        keep_going in any::<bool>(),
        max_parallel in proptest::option::of(1..4usize),
    ) {
        let graph = Arc::new(graph);
        let options = SchedulerOptions {
            failure_policy: if keep_going { FailurePolicy::KeepGoing } else { FailurePolicy::FailFast },
            max_parallel: max_parallel.and_then(NonZeroUsize::new),
        };
        let mut scheduler = Scheduler::new(Arc::clone(&graph), options);

        let sim = simulate(&mut scheduler, &picks, &failing);

        prop_assert!(scheduler.is_finished());
        prop_assert!(sim.iterations <= graph.len());

        let report = scheduler.report();
        for step in graph.steps() {
            let state = scheduler.state_of(step.id);
            prop_assert!(state.is_some_and(StepRunState::is_terminal));

            if state == Some(StepRunState::Succeeded) || state == Some(StepRunState::Failed) {
                for pred in &step.predecessors {
                    prop_assert_eq!(scheduler.state_of(*pred), Some(StepRunState::Succeeded));
                }
            }
        }

        let any_failed = graph.steps().iter().any(|s| scheduler.state_of(s.id) == Some(StepRunState::Failed));
        prop_assert_eq!(report.is_success(), !any_failed);
    }
}
