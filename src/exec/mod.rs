// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands defined in
//! the steps, using `tokio::process::Command`, and reporting back to the
//! control loop via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the background loop which manages step processes.
//! - [`step_runner`] handles individual step process execution.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod step_runner;

use std::path::PathBuf;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::{spawn_executor, ExecutorCommand};

/// Environment shared by every step process of a run.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Directory commands are started in (the pipeline file's directory).
    pub working_dir: PathBuf,
}

impl ExecContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}
