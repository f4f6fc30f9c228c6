// src/exec/executor_loop.rs

//! Background executor loop that manages running step processes.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::dag::{ScheduledStep, StepId};
use crate::engine::RuntimeEvent;
use crate::exec::step_runner::run_step;
use crate::exec::ExecContext;

/// Requests the control loop sends to the executor.
#[derive(Debug, Clone)]
pub enum ExecutorCommand {
    /// Start the step's process.
    Run(ScheduledStep),
    /// Kill every process that is still running.
    CancelAll,
}

/// Internal handle for a currently-running step process.
///
/// - `cancel` asks the runner to kill the process.
/// - `handle` is the Tokio task that is actually running the command.
struct ActiveStep {
    name: String,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ExecutorCommand>` is what
/// `RealExecutorBackend` uses. Each step runs in its own Tokio task and
/// reports its completion straight to `runtime_tx`; the loop itself only
/// keeps cancellation handles.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: ExecContext,
) -> mpsc::Sender<ExecutorCommand> {
    let (tx, mut rx) = mpsc::channel::<ExecutorCommand>(32);

    tokio::spawn(async move {
        info!(working_dir = %ctx.working_dir.display(), "executor loop started");

        let mut active: HashMap<StepId, ActiveStep> = HashMap::new();

        while let Some(command) = rx.recv().await {
            active.retain(|_, a| !a.handle.is_finished());

            match command {
                ExecutorCommand::Run(step) => {
                    handle_run(step, &ctx, &mut active, &runtime_tx);
                }
                ExecutorCommand::CancelAll => {
                    cancel_all(&mut active);
                }
            }
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

fn handle_run(
    step: ScheduledStep,
    ctx: &ExecContext,
    active: &mut HashMap<StepId, ActiveStep>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    if active.contains_key(&step.id) {
        warn!(
            step = %step.name,
            "step is already running; ignoring duplicate dispatch"
        );
        return;
    }

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let rt_tx = runtime_tx.clone();
    let ctx = ctx.clone();
    let id = step.id;
    let name = step.name.clone();
    let spawn_name = name.clone();

    let handle = tokio::spawn(async move {
        run_step(step, ctx, rt_tx, cancel_rx).await;
        debug!(step = %spawn_name, "step runner future finished");
    });

    active.insert(
        id,
        ActiveStep {
            name,
            cancel: Some(cancel_tx),
            handle,
        },
    );
}

fn cancel_all(active: &mut HashMap<StepId, ActiveStep>) {
    for existing in active.values_mut() {
        match existing.cancel.take() {
            Some(cancel) => {
                info!(step = %existing.name, "cancelling running step");
                if cancel.send(()).is_err() {
                    debug!(
                        step = %existing.name,
                        "step already finished while cancelling"
                    );
                }
            }
            None => {
                debug!(
                    step = %existing.name,
                    "no cancel sender present; step may already have been cancelled"
                );
            }
        }
    }
}
