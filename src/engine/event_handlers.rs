// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::debug;

use crate::dag::{HaltReason, ScheduledStep, Scheduler, SchedulerStep, StepId};
use crate::engine::{RunOptions, StepOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these steps to the executor.
    DispatchSteps(Vec<ScheduledStep>),
    /// Kill every step that is still running.
    CancelRunning,
    /// The run is over; the shell should stop its loop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the run with the initial ready set.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.start();
    finish_step(step, Vec::new())
}

/// Handle a step completion event.
pub fn handle_step_completion(
    scheduler: &mut Scheduler,
    step: StepId,
    outcome: StepOutcome,
) -> CoreStep {
    let result = scheduler.handle_completion(step, outcome);
    finish_step(result, Vec::new())
}

/// Handle an abort (shutdown request or elapsed deadline).
///
/// Pending steps are skipped. Running steps are cancelled when the options
/// say so; otherwise the loop keeps going until they report completion.
pub fn handle_halt(scheduler: &mut Scheduler, options: &RunOptions, reason: HaltReason) -> CoreStep {
    let already_halted = scheduler.halt_reason().is_some();
    let result = scheduler.halt(reason);

    let mut commands = Vec::new();
    if options.cancel_running_on_halt && scheduler.running_count() > 0 {
        debug!(
            ?reason,
            already_halted,
            running = ?scheduler.running_steps(),
            "cancelling running steps"
        );
        commands.push(CoreCommand::CancelRunning);
    }

    finish_step(result, commands)
}

/// Translate a [`SchedulerStep`] into shell commands.
fn finish_step(step: SchedulerStep, mut commands: Vec<CoreCommand>) -> CoreStep {
    if !step.newly_scheduled.is_empty() {
        commands.insert(0, CoreCommand::DispatchSteps(step.newly_scheduled));
    }

    let mut keep_running = true;
    if step.run_just_finished {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
