// src/dag/step_info.rs

//! Per-step run state and the dispatch description handed to executors.

use crate::dag::graph::{CompiledStep, StepId};

/// Lifecycle of a step within one pipeline run.
///
/// Transitions are monotonic: `Pending -> Running -> {Succeeded, Failed,
/// Cancelled}`, or `Pending -> Skipped` when the step can no longer start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRunState {
    /// Waiting for predecessors (or for a free slot under `max_parallel`).
    Pending,
    /// Dispatched to the executor; waiting for its completion signal.
    Running,
    /// The unit of work finished successfully.
    Succeeded,
    /// The unit of work finished with a failure.
    Failed,
    /// The unit of work was killed because the run was aborted.
    Cancelled,
    /// Never started: an upstream failure or an abort made it unreachable.
    Skipped,
}

impl StepRunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepRunState::Pending | StepRunState::Running)
    }
}

/// Description of a step that the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    pub id: StepId,
    pub name: String,
    pub command: String,
    pub source_repo: String,
    pub source_path: String,
    pub paths: Vec<String>,
}

impl ScheduledStep {
    pub fn from_compiled(step: &CompiledStep) -> Self {
        Self {
            id: step.id,
            name: step.name.clone(),
            command: step.command.clone(),
            source_repo: step.source_repo.clone(),
            source_path: step.source_path.clone(),
            paths: step.paths.clone(),
        }
    }
}
