// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`super::executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by `cascade`.
//!   It wraps the `spawn_executor` loop and just forwards commands over an
//!   mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which steps were scheduled and directly emits `StepCompleted` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::ScheduledStep;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::executor_loop::{spawn_executor, ExecutorCommand};
use super::ExecContext;

/// Trait abstracting how scheduled steps are executed.
///
/// Implementations must eventually send exactly one
/// `RuntimeEvent::StepCompleted` per dispatched step, otherwise the control
/// loop waits forever.
pub trait ExecutorBackend: Send {
    /// Dispatch the given steps for execution.
    ///
    /// The implementation is free to:
    /// - spawn OS processes (production)
    /// - simulate completion and emit `RuntimeEvent`s (tests)
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop every step that is still running. Each cancelled step must still
    /// be reported, with `StepOutcome::Cancelled`.
    fn cancel_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// The runtime calls `spawn_ready_steps`, which forwards the steps to the
/// background executor loop via an mpsc channel.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ExecutorCommand>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, ctx: ExecContext) -> Self {
        let tx = spawn_executor(runtime_tx, ctx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for step in steps {
                tx.send(ExecutorCommand::Run(step))
                    .await
                    .map_err(Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(ExecutorCommand::CancelAll)
                .await
                .map_err(Error::from)?;
            Ok(())
        })
    }
}
