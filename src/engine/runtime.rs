// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dag::{RunReport, ScheduledStep};
use crate::errors::{CascadeError, Result};
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates
/// actual command execution to an `ExecutorBackend`.
///
/// This is the single control loop of a run: it is the only place that
/// mutates scheduling state. Step tasks report back through the event
/// channel; the loop suspends only on that channel and on the optional
/// pipeline deadline.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial ready set.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Executes commands returned by the core (spawn steps, cancel, exit).
    /// - Returns the final report once every step is terminal.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("cascade runtime started");

        let deadline = self.core.options().timeout.map(|t| Instant::now() + t);
        let mut deadline_fired = false;

        let start = self.core.start();
        let mut keep_running = start.keep_running;
        self.execute_commands(start.commands).await?;

        while keep_running {
            let step = tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(e) => {
                        debug!(?e, "runtime received event");
                        self.core.step(e)
                    }
                    None => {
                        let running = self.core.scheduler().running_count();
                        warn!(running, "runtime event channel closed before the run finished");
                        return Err(CascadeError::Other(anyhow!(
                            "event channel closed with {running} step(s) still running"
                        )));
                    }
                },
                _ = sleep_until_deadline(deadline), if !deadline_fired => {
                    deadline_fired = true;
                    warn!("pipeline timeout elapsed; aborting run");
                    self.core.deadline_elapsed()
                }
            };

            keep_running = step.keep_running;
            self.execute_commands(step.commands).await?;
        }

        let report = self.core.report();
        info!(status = %report.status, "runtime exiting");
        Ok(report)
    }

    async fn execute_commands(&mut self, commands: Vec<CoreCommand>) -> Result<()> {
        for command in commands {
            self.execute_command(command).await?;
        }
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchSteps(steps) => {
                self.spawn_ready(steps).await?;
            }
            CoreCommand::CancelRunning => {
                self.executor.cancel_running().await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, steps: Vec<ScheduledStep>) -> Result<()> {
        if steps.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
        debug!(?names, "spawning ready steps");

        self.executor.spawn_ready_steps(steps).await
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}
