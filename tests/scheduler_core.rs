// tests/scheduler_core.rs

mod common;
use crate::common::builders::{diamond, graph_from_edges};

use std::num::NonZeroUsize;
use std::sync::Arc;

use cascade::dag::{
    CompiledGraph, HaltReason, RunStatus, Scheduler, SchedulerOptions, StepRunState,
};
use cascade::engine::{CoreCommand, CoreRuntime, RunOptions, RuntimeEvent, StepOutcome};
use cascade::types::FailurePolicy;

fn scheduler(graph: CompiledGraph, options: SchedulerOptions) -> Scheduler {
    Scheduler::new(Arc::new(graph), options)
}

fn complete(s: &mut Scheduler, name: &str, outcome: StepOutcome) -> Vec<String> {
    let id = s.graph().id_of(name).expect("unknown step");
    s.handle_completion(id, outcome)
        .scheduled_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[test]
fn diamond_runs_in_dependency_order() {
    let mut s = scheduler(diamond(), SchedulerOptions::default());

    assert_eq!(s.start().scheduled_names(), vec!["A"]);
    assert_eq!(s.run_state_of("B"), Some(StepRunState::Pending));

    assert_eq!(complete(&mut s, "A", StepOutcome::Success), vec!["B", "C"]);
    assert_eq!(s.running_steps(), vec!["B", "C"]);

    assert!(complete(&mut s, "B", StepOutcome::Success).is_empty());
    assert_eq!(s.deps_satisfied("D"), Some(false));

    assert_eq!(complete(&mut s, "C", StepOutcome::Success), vec!["D"]);

    let id = s.graph().id_of("D").unwrap();
    let last = s.handle_completion(id, StepOutcome::Success);
    assert!(last.run_just_finished);
    assert!(s.is_finished());

    let report = s.report();
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.succeeded(), vec!["A", "B", "C", "D"]);
}

#[test]
fn all_roots_start_together() {
    let graph = graph_from_edges(&[("a", &[]), ("b", &[]), ("c", &["a", "b"])]);
    let mut s = scheduler(graph, SchedulerOptions::default());

    assert_eq!(s.start().scheduled_names(), vec!["a", "b"]);
    assert!(complete(&mut s, "b", StepOutcome::Success).is_empty());
    assert_eq!(complete(&mut s, "a", StepOutcome::Success), vec!["c"]);
}

#[test]
fn fail_fast_stops_dispatch_but_lets_running_steps_finish() {
    let mut s = scheduler(diamond(), SchedulerOptions::default());
    s.start();
    complete(&mut s, "A", StepOutcome::Success);

    let id = s.graph().id_of("B").unwrap();
    let step = s.handle_completion(id, StepOutcome::Failed(2));
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(s.graph().names_of(&step.newly_skipped), vec!["D"]);
    assert_eq!(s.halt_reason(), Some(HaltReason::StepFailed));
    assert!(!s.is_finished());
    assert_eq!(s.running_steps(), vec!["C"]);

    assert!(complete(&mut s, "C", StepOutcome::Success).is_empty());
    assert!(s.is_finished());

    let report = s.report();
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failed(), vec!["B"]);
    assert_eq!(report.state_of("C"), Some(StepRunState::Succeeded));
    assert_eq!(report.skipped(), vec!["D"]);
}

#[test]
fn keep_going_only_skips_dependents_of_the_failure() {
    let graph = graph_from_edges(&[
        ("root", &[]),
        ("a", &["root"]),
        ("a2", &["a"]),
        ("b", &["root"]),
        ("b2", &["b"]),
    ]);
    let options = SchedulerOptions {
        failure_policy: FailurePolicy::KeepGoing,
        max_parallel: None,
    };
    let mut s = scheduler(graph, options);

    s.start();
    assert_eq!(complete(&mut s, "root", StepOutcome::Success), vec!["a", "b"]);
    assert!(complete(&mut s, "a", StepOutcome::Failed(1)).is_empty());
    assert_eq!(s.run_state_of("a2"), Some(StepRunState::Skipped));
    assert_eq!(s.halt_reason(), None);

    assert_eq!(complete(&mut s, "b", StepOutcome::Success), vec!["b2"]);
    complete(&mut s, "b2", StepOutcome::Success);

    assert!(s.is_finished());
    let report = s.report();
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.succeeded(), vec!["b", "b2", "root"]);
    assert_eq!(report.skipped(), vec!["a2"]);
}

#[test]
fn failure_of_the_last_running_step_finishes_the_run() {
    let graph = graph_from_edges(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
    let mut s = scheduler(
        graph,
        SchedulerOptions {
            failure_policy: FailurePolicy::KeepGoing,
            max_parallel: None,
        },
    );

    s.start();
    let id = s.graph().id_of("a").unwrap();
    let step = s.handle_completion(id, StepOutcome::Failed(1));

    assert!(step.run_just_finished);
    assert_eq!(s.report().skipped(), vec!["b", "c"]);
}

#[test]
fn max_parallel_caps_running_steps() {
    let graph = graph_from_edges(&[("X", &[]), ("Y", &["X"]), ("Z", &["X"])]);
    let mut s = scheduler(
        graph,
        SchedulerOptions {
            failure_policy: FailurePolicy::FailFast,
            max_parallel: NonZeroUsize::new(1),
        },
    );

    assert_eq!(s.start().scheduled_names(), vec!["X"]);
    assert_eq!(complete(&mut s, "X", StepOutcome::Success), vec!["Y"]);
    assert_eq!(s.running_count(), 1);
    assert_eq!(s.run_state_of("Z"), Some(StepRunState::Pending));
    assert_eq!(s.deps_satisfied("Z"), Some(true));
    assert_eq!(complete(&mut s, "Y", StepOutcome::Success), vec!["Z"]);
}

#[test]
fn smallest_cap_still_dispatches_and_finishes() {
    let mut s = scheduler(
        diamond(),
        SchedulerOptions {
            failure_policy: FailurePolicy::FailFast,
            max_parallel: Some(NonZeroUsize::MIN),
        },
    );

    let start = s.start();
    assert_eq!(start.scheduled_names(), vec!["A"]);
    assert_eq!(s.running_count(), 1);

    assert_eq!(complete(&mut s, "A", StepOutcome::Success), vec!["B"]);
    assert_eq!(complete(&mut s, "B", StepOutcome::Success), vec!["C"]);
    assert_eq!(complete(&mut s, "C", StepOutcome::Success), vec!["D"]);
    complete(&mut s, "D", StepOutcome::Success);

    assert!(s.is_finished());
    assert_eq!(s.report().status, RunStatus::Succeeded);
}

#[test]
fn zero_cap_is_not_representable() {
    assert_eq!(NonZeroUsize::new(0), None);
    assert!("0".parse::<NonZeroUsize>().is_err());
}

#[test]
fn completion_for_a_step_that_is_not_running_is_ignored() {
    let mut s = scheduler(diamond(), SchedulerOptions::default());
    s.start();

    // D never ran.
    assert!(complete(&mut s, "D", StepOutcome::Success).is_empty());
    assert_eq!(s.run_state_of("D"), Some(StepRunState::Pending));

    complete(&mut s, "A", StepOutcome::Success);
    // A already completed; a second report changes nothing.
    assert!(complete(&mut s, "A", StepOutcome::Success).is_empty());
    assert_eq!(s.running_steps(), vec!["B", "C"]);
}

#[test]
fn start_twice_dispatches_nothing_new() {
    let mut s = scheduler(diamond(), SchedulerOptions::default());
    assert_eq!(s.start().scheduled_names(), vec!["A"]);
    assert!(s.start().newly_scheduled.is_empty());
    assert_eq!(s.running_count(), 1);
}

#[test]
fn shutdown_skips_pending_and_reports_cancelled() {
    let mut s = scheduler(diamond(), SchedulerOptions::default());
    s.start();

    let step = s.halt(HaltReason::Shutdown);
    assert_eq!(s.graph().names_of(&step.newly_skipped), vec!["B", "C", "D"]);
    assert!(!step.run_just_finished);

    complete(&mut s, "A", StepOutcome::Cancelled);
    assert!(s.is_finished());

    let report = s.report();
    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.state_of("A"), Some(StepRunState::Cancelled));
}

#[test]
fn cancelled_step_skips_its_dependents() {
    let graph = graph_from_edges(&[("a", &[]), ("b", &["a"])]);
    let mut s = scheduler(graph, SchedulerOptions::default());
    s.start();

    let id = s.graph().id_of("a").unwrap();
    let step = s.handle_completion(id, StepOutcome::Cancelled);
    assert!(step.run_just_finished);
    assert_eq!(s.report().status, RunStatus::Failed);
    assert_eq!(s.report().skipped(), vec!["b"]);
}

#[test]
fn core_start_dispatches_roots() {
    let mut core = CoreRuntime::new(Arc::new(diamond()), RunOptions::default());
    let step = core.start();

    assert!(step.keep_running);
    match step.commands.as_slice() {
        [CoreCommand::DispatchSteps(steps)] => {
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].name, "A");
        }
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn core_requests_exit_after_last_completion() {
    let graph = Arc::new(graph_from_edges(&[("only", &[])]));
    let id = graph.id_of("only").unwrap();
    let mut core = CoreRuntime::new(graph, RunOptions::default());
    core.start();

    let step = core.step(RuntimeEvent::StepCompleted {
        step: id,
        outcome: StepOutcome::Success,
    });

    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    assert!(core.is_finished());
}

#[test]
fn core_shutdown_cancels_running_steps_when_enabled() {
    let mut core = CoreRuntime::new(Arc::new(diamond()), RunOptions::default());
    core.start();

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::CancelRunning]);
}

#[test]
fn core_shutdown_waits_for_running_steps_when_kill_disabled() {
    let options = RunOptions {
        cancel_running_on_halt: false,
        ..RunOptions::default()
    };
    let mut core = CoreRuntime::new(Arc::new(diamond()), options);
    core.start();

    let step = core.deadline_elapsed();
    assert!(step.keep_running);
    assert!(step.commands.is_empty());
    assert_eq!(core.scheduler().halt_reason(), Some(HaltReason::Timeout));
    assert_eq!(core.report().skipped(), vec!["B", "C", "D"]);
}
