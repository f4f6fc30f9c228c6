// src/dag/report.rs

use std::fmt;

use crate::dag::step_info::StepRunState;

/// Overall result of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step succeeded.
    Succeeded,
    /// At least one step failed.
    Failed,
    /// The run was aborted by a shutdown request.
    Cancelled,
    /// The run was aborted because the pipeline timeout elapsed.
    TimedOut,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        self == RunStatus::Succeeded
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}

/// Final state of every step after a run, ordered by step id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub steps: Vec<(String, StepRunState)>,
}

impl RunReport {
    pub fn state_of(&self, name: &str) -> Option<StepRunState> {
        self.steps
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, state)| *state)
    }

    pub fn names_in(&self, state: StepRunState) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|(_, s)| *s == state)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.names_in(StepRunState::Succeeded)
    }

    pub fn failed(&self) -> Vec<&str> {
        self.names_in(StepRunState::Failed)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.names_in(StepRunState::Skipped)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
