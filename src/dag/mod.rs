// src/dag/mod.rs

//! Pipeline graph compilation, structural checks and scheduling.
//!
//! - [`graph`] compiles validated declarations into resolved step records.
//! - [`properties`] proves the graph is connected and acyclic.
//! - [`scheduler`] contains the per-run state machine that decides
//!   which steps are ready to run, and when successors can be scheduled.
//! - [`state_manager`] owns the live run table (states, outstanding
//!   predecessor counts, ready queue).
//! - [`step_info`] provides run states and scheduled step types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`report`] summarises a finished run.
//! - [`plan`] computes the static execution waves shown by `--dry-run`.

pub mod graph;
pub mod plan;
pub mod properties;
pub mod report;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod step_info;

pub use graph::{CompiledGraph, CompiledStep, StepId};
pub use plan::execution_waves;
pub use properties::{GraphChecks, StructuralError};
pub use report::{RunReport, RunStatus};
pub use scheduler::{HaltReason, Scheduler, SchedulerOptions};
pub use scheduler_step::SchedulerStep;
pub use step_info::{ScheduledStep, StepRunState};
