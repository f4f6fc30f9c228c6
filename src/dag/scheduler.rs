// src/dag/scheduler.rs

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::{CompiledGraph, StepId};
use crate::dag::report::{RunReport, RunStatus};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::RunTable;
use crate::dag::step_info::{ScheduledStep, StepRunState};
use crate::engine::StepOutcome;
use crate::types::FailurePolicy;

/// Why the scheduler stopped dispatching new steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// A step failed under [`FailurePolicy::FailFast`].
    StepFailed,
    /// Shutdown was requested (e.g. Ctrl-C).
    Shutdown,
    /// The pipeline timeout elapsed.
    Timeout,
}

/// Scheduling knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub failure_policy: FailurePolicy,
    /// Upper bound on concurrently running steps; `None` is unbounded.
    pub max_parallel: Option<NonZeroUsize>,
}

/// Scheduler holds the immutable compiled graph plus the mutable run state.
///
/// It is responsible for:
/// - computing the initial ready set
/// - marking steps running / succeeded / failed
/// - releasing successors whose predecessors have all succeeded
/// - applying the failure policy
/// - deciding when the run is over
///
/// It performs no IO and holds no Tokio types; the async shell in
/// [`crate::engine`] feeds it completion events one at a time.
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<CompiledGraph>,
    table: RunTable,
    options: SchedulerOptions,
    started: bool,
    finished: bool,
    halted: Option<HaltReason>,
}

impl Scheduler {
    pub fn new(graph: Arc<CompiledGraph>, options: SchedulerOptions) -> Self {
        let table = RunTable::new(&graph);
        Self {
            graph,
            table,
            options,
            started: false,
            finished: false,
            halted: None,
        }
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    /// Returns `true` once nothing is running and nothing more will be
    /// dispatched.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    pub fn running_count(&self) -> usize {
        self.table.running_count()
    }

    pub fn state_of(&self, id: StepId) -> Option<StepRunState> {
        self.table.state(id)
    }

    /// Read-only view of the given step's run state.
    pub fn run_state_of(&self, name: &str) -> Option<StepRunState> {
        self.graph.id_of(name).and_then(|id| self.table.state(id))
    }

    /// Names of steps currently running.
    pub fn running_steps(&self) -> Vec<&str> {
        self.graph
            .steps()
            .iter()
            .filter(|s| self.table.state(s.id) == Some(StepRunState::Running))
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Whether every predecessor of `name` has succeeded.
    ///
    /// Returns `None` if the step is unknown.
    pub fn deps_satisfied(&self, name: &str) -> Option<bool> {
        let id = self.graph.id_of(name)?;
        Some(self.table.outstanding_of(id) == Some(0))
    }

    /// Dispatch the initial ready set: every step without predecessors.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler start requested twice; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;

        info!(steps = self.graph.len(), "starting pipeline run");

        let newly_scheduled = self.dispatch();
        let newly_skipped = self.skip_unreachable();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_just_finished,
        }
    }

    /// Handle completion of a running step with a concrete outcome.
    pub fn handle_completion(&mut self, id: StepId, outcome: StepOutcome) -> SchedulerStep {
        let name = self.graph.name_of(id).to_string();

        let terminal = match outcome {
            StepOutcome::Success => StepRunState::Succeeded,
            StepOutcome::Failed(_) => StepRunState::Failed,
            StepOutcome::Cancelled => StepRunState::Cancelled,
        };

        if !self.table.finish(id, terminal) {
            warn!(
                step = %name,
                state = ?self.table.state(id),
                "completion for a step that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        let mut newly_skipped = Vec::new();

        match outcome {
            StepOutcome::Success => {
                debug!(step = %name, "step completed successfully");
                let released = self.table.release_successors(&self.graph, id);
                if !released.is_empty() {
                    debug!(
                        step = %name,
                        released = ?self.graph.names_of(&released),
                        "successors have no outstanding predecessors"
                    );
                }
            }
            StepOutcome::Failed(code) => match self.options.failure_policy {
                FailurePolicy::FailFast => {
                    warn!(
                        step = %name,
                        exit_code = code,
                        "step failed; no further steps will be started"
                    );
                    newly_skipped.extend(self.halt_internal(HaltReason::StepFailed));
                }
                FailurePolicy::KeepGoing => {
                    warn!(
                        step = %name,
                        exit_code = code,
                        "step failed; skipping its dependents"
                    );
                    newly_skipped.extend(self.table.skip_dependents(&self.graph, id));
                }
            },
            StepOutcome::Cancelled => {
                debug!(step = %name, "step was cancelled");
                newly_skipped.extend(self.table.skip_dependents(&self.graph, id));
            }
        }

        let newly_scheduled = self.dispatch();
        newly_skipped.extend(self.skip_unreachable());
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped,
            run_just_finished,
        }
    }

    /// Stop dispatching: every pending step is skipped. Running steps keep
    /// running until their completion is reported.
    pub fn halt(&mut self, reason: HaltReason) -> SchedulerStep {
        let newly_skipped = self.halt_internal(reason);
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_skipped,
            run_just_finished,
        }
    }

    /// Summarise the run. Meaningful once [`Self::is_finished`] is `true`.
    pub fn report(&self) -> RunReport {
        let status = match self.halted {
            Some(HaltReason::Timeout) => RunStatus::TimedOut,
            Some(HaltReason::Shutdown) => RunStatus::Cancelled,
            _ if self.table.any_in(StepRunState::Failed)
                || self.table.any_in(StepRunState::Cancelled)
                || self.table.any_in(StepRunState::Skipped) =>
            {
                RunStatus::Failed
            }
            _ => RunStatus::Succeeded,
        };

        RunReport {
            status,
            steps: self
                .graph
                .steps()
                .iter()
                .map(|s| (s.name.clone(), self.table.state(s.id).unwrap_or(StepRunState::Pending)))
                .collect(),
        }
    }

    fn halt_internal(&mut self, reason: HaltReason) -> Vec<StepId> {
        if self.halted.is_none() {
            info!(?reason, running = self.table.running_count(), "halting pipeline run");
            self.halted = Some(reason);
        }
        self.table.skip_all_pending()
    }

    fn dispatch(&mut self) -> Vec<ScheduledStep> {
        if self.halted.is_some() {
            return Vec::new();
        }

        self.table
            .take_ready(self.options.max_parallel)
            .into_iter()
            .filter_map(|id| self.graph.step(id))
            .map(|step| {
                info!(step = %step.name, command = %step.command, "dispatching step");
                ScheduledStep::from_compiled(step)
            })
            .collect()
    }

    /// With nothing running and nothing ready, any pending step waits on a
    /// predecessor that can never succeed. Skip them so the run terminates.
    fn skip_unreachable(&mut self) -> Vec<StepId> {
        if self.table.running_count() > 0 || self.table.has_ready() || self.table.all_terminal() {
            return Vec::new();
        }

        let skipped = self.table.skip_all_pending();
        if !skipped.is_empty() && self.halted.is_none() {
            warn!(
                steps = ?self.graph.names_of(&skipped),
                "steps can never become ready; skipping"
            );
        }
        skipped
    }

    /// Determine whether the run is over and record it.
    ///
    /// Returns `true` if this call transitioned the scheduler to finished.
    fn maybe_finish_run(&mut self) -> bool {
        if self.finished || !self.started {
            return false;
        }

        if self.table.running_count() == 0 && self.table.all_terminal() {
            info!(
                status = %self.report().status,
                "all steps terminal; pipeline run finished"
            );
            self.finished = true;
            true
        } else {
            false
        }
    }
}
