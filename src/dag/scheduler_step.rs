// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::graph::StepId;
use crate::dag::step_info::ScheduledStep;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the pipeline and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Steps that became ready and were marked running by this step.
    pub newly_scheduled: Vec<ScheduledStep>,
    /// Steps that were newly marked as skipped in this step.
    pub newly_skipped: Vec<StepId>,
    /// Whether this step caused the run to finish (nothing running, nothing
    /// left to dispatch).
    pub run_just_finished: bool,
}

impl SchedulerStep {
    /// Names of the newly scheduled steps, in dispatch order.
    pub fn scheduled_names(&self) -> Vec<&str> {
        self.newly_scheduled.iter().map(|s| s.name.as_str()).collect()
    }
}
