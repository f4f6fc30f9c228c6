// src/cli.rs

//! CLI argument parsing using `clap`.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::dag::GraphChecks;
use crate::engine::RunOptions;
use crate::types::FailurePolicy;

/// Command-line arguments for `cascade`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cascade",
    version,
    about = "Run a pipeline of dependent steps, in parallel where the dependencies allow it.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (YAML, or TOML when the extension is `.toml`).
    #[arg(value_name = "PIPELINE")]
    pub pipeline: PathBuf,

    /// Parse + validate, print the execution plan, but don't run any step.
    #[arg(long)]
    pub dry_run: bool,

    /// Only validate the pipeline and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub check: bool,

    /// Keep running independent steps after a failure instead of stopping
    /// the whole pipeline.
    #[arg(long)]
    pub keep_going: bool,

    /// What to do once a step fails: `fail-fast` (default) or `keep-going`.
    #[arg(long, value_name = "POLICY", conflicts_with = "keep_going")]
    pub failure_policy: Option<FailurePolicy>,

    /// Upper bound on concurrently running steps. Unbounded when omitted.
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<NonZeroUsize>,

    /// Abort the pipeline after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Let steps that are still running when the pipeline is aborted finish
    /// instead of killing them.
    #[arg(long)]
    pub no_kill: bool,

    /// Accept pipelines made of several independent step groups.
    #[arg(long)]
    pub allow_disconnected: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CASCADE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Scheduling knobs selected on the command line.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            failure_policy: if self.keep_going {
                FailurePolicy::KeepGoing
            } else {
                self.failure_policy.unwrap_or_default()
            },
            max_parallel: self.max_parallel,
            timeout: self.timeout.map(Duration::from_secs),
            cancel_running_on_halt: !self.no_kill,
        }
    }

    /// Structural checks applied before scheduling.
    pub fn graph_checks(&self) -> GraphChecks {
        GraphChecks {
            require_connected: !self.allow_disconnected,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
