// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledStep`s to the executor
//! - the pipeline deadline
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use std::sync::Arc;

use crate::dag::{CompiledGraph, HaltReason, RunReport, Scheduler};
use crate::engine::event_handlers::{
    handle_halt, handle_start, handle_step_completion, CoreStep,
};
use crate::engine::{RunOptions, RuntimeEvent};

/// Pure core runtime state.
///
/// This owns the scheduler and the run options. It has **no** channels, no
/// Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RunOptions,
}

impl CoreRuntime {
    pub fn new(graph: Arc<CompiledGraph>, options: RunOptions) -> Self {
        let scheduler = Scheduler::new(graph, options.scheduler_options());
        Self { scheduler, options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Read-only access to the scheduler (for tests and diagnostics).
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Dispatch the initial ready set.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::StepCompleted { step, outcome } => {
                handle_step_completion(&mut self.scheduler, step, outcome)
            }
            RuntimeEvent::ShutdownRequested => {
                handle_halt(&mut self.scheduler, &self.options, HaltReason::Shutdown)
            }
        }
    }

    /// The pipeline deadline elapsed.
    pub fn deadline_elapsed(&mut self) -> CoreStep {
        handle_halt(&mut self.scheduler, &self.options, HaltReason::Timeout)
    }

    pub fn report(&self) -> RunReport {
        self.scheduler.report()
    }
}
