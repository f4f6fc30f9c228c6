// src/exec/step_runner.rs

//! Individual step process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledStep;
use crate::engine::{RuntimeEvent, StepOutcome};
use crate::exec::ExecContext;

/// Exit code reported when the process could not be started or awaited.
pub const SPAWN_FAILURE_CODE: i32 = -1;

/// Run a single step process and emit exactly one `StepCompleted` event.
///
/// - Normal exit: `Success` or `Failed(code)`.
/// - Cancel channel fires: the child is killed and `Cancelled` is reported.
/// - The process cannot be spawned or awaited: `Failed(-1)`.
pub async fn run_step(
    step: ScheduledStep,
    ctx: ExecContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let id = step.id;
    let name = step.name.clone();

    let outcome = match run_step_inner(&step, &ctx, cancel_rx).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(step = %name, error = %err, "step execution error");
            StepOutcome::Failed(SPAWN_FAILURE_CODE)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::StepCompleted { step: id, outcome })
        .await
        .is_err()
    {
        warn!(step = %name, "runtime is gone; dropping completion event");
    }
}

/// Build a shell command appropriate for the platform.
pub fn build_command(step: &ScheduledStep, ctx: &ExecContext) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&step.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&step.command);
        c
    };

    cmd.current_dir(&ctx.working_dir)
        .env("CASCADE_STEP", &step.name)
        .env("CASCADE_SOURCE_REPO", &step.source_repo)
        .env("CASCADE_SOURCE_PATH", &step.source_path)
        .env("CASCADE_PATHS", step.paths.join(":"))
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    cmd
}

async fn run_step_inner(
    step: &ScheduledStep,
    ctx: &ExecContext,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<StepOutcome> {
    info!(
        step = %step.name,
        source_repo = %step.source_repo,
        command = %step.command,
        "starting step process"
    );

    let mut child = build_command(step, ctx)
        .spawn()
        .with_context(|| format!("spawning process for step '{}'", step.name))?;

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res.with_context(|| {
                format!("waiting for process of step '{}'", step.name)
            })?;

            let code = status.code().unwrap_or(SPAWN_FAILURE_CODE);
            info!(
                step = %step.name,
                exit_code = code,
                success = status.success(),
                "step process exited"
            );

            if status.success() {
                Ok(StepOutcome::Success)
            } else {
                Ok(StepOutcome::Failed(code))
            }
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(step = %step.name, "cancellation requested; killing process");
                    if let Err(e) = child.kill().await {
                        warn!(
                            step = %step.name,
                            error = %e,
                            "failed to kill child process on cancellation"
                        );
                    }
                    Ok(StepOutcome::Cancelled)
                }
                Err(e) => {
                    // The executor dropped the sender; let the process finish.
                    debug!(
                        step = %step.name,
                        error = %e,
                        "cancel channel closed without explicit cancellation"
                    );
                    let status = child.wait().await.with_context(|| {
                        format!("waiting for process of step '{}'", step.name)
                    })?;
                    if status.success() {
                        Ok(StepOutcome::Success)
                    } else {
                        Ok(StepOutcome::Failed(status.code().unwrap_or(SPAWN_FAILURE_CODE)))
                    }
                }
            }
        }
    }
}
