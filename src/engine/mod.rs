// src/engine/mod.rs

//! Orchestration engine for cascade.
//!
//! This module ties together:
//! - the pure scheduler state machine ([`crate::dag::Scheduler`])
//! - the main control loop that reacts to:
//!   - step completion events
//!   - shutdown signals
//!   - the optional pipeline deadline
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. Only the control loop mutates scheduling
//! state; step tasks talk to it exclusively through [`RuntimeEvent`]s.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::dag::{SchedulerOptions, StepId};
use crate::types::FailurePolicy;

/// Outcome of a step's unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failed(i32),
    /// Killed before it could finish because the run was aborted.
    Cancelled,
}

/// Knobs for a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub failure_policy: FailurePolicy,
    /// Upper bound on concurrently running steps; `None` is unbounded.
    pub max_parallel: Option<NonZeroUsize>,
    /// Abort the run once this much time has passed.
    pub timeout: Option<Duration>,
    /// On abort (timeout or shutdown), kill running steps instead of
    /// waiting for them.
    pub cancel_running_on_halt: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            max_parallel: None,
            timeout: None,
            cancel_running_on_halt: true,
        }
    }
}

impl RunOptions {
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            failure_policy: self.failure_policy,
            max_parallel: self.max_parallel,
        }
    }
}

/// Events flowing into the control loop from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A step's unit of work finished with a concrete outcome.
    StepCompleted { step: StepId, outcome: StepOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
