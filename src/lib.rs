// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::{properties, CompiledGraph, GraphChecks, RunReport, RunStatus};
use crate::engine::{CoreRuntime, RunOptions, Runtime, RuntimeEvent};
use crate::exec::{ExecContext, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading and declaration validation
/// - graph compilation and structural checks
/// - control loop + executor
/// - Ctrl-C handling
///
/// Returns the overall run status; `--check` and `--dry-run` report
/// `Succeeded` once the pipeline is known to be valid.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let fs = RealFileSystem;
    let graph = compile_pipeline(&fs, &args.pipeline, &args.graph_checks())?;

    if args.check {
        info!(steps = graph.len(), "pipeline is valid");
        return Ok(RunStatus::Succeeded);
    }

    if args.dry_run {
        print_dry_run(&graph);
        return Ok(RunStatus::Succeeded);
    }

    let root_dir = pipeline_root_dir(&fs, &args.pipeline);
    let report = run_pipeline(Arc::new(graph), args.run_options(), ExecContext::new(root_dir)).await?;

    Ok(report.status)
}

/// Load, validate, compile and check a pipeline document.
///
/// Every failure here happens before any step is started.
pub fn compile_pipeline(
    fs: &dyn FileSystem,
    path: &Path,
    checks: &GraphChecks,
) -> Result<CompiledGraph> {
    let def = load_and_validate(fs, path)
        .with_context(|| format!("loading pipeline {:?}", path))?;
    let graph = CompiledGraph::compile(&def);
    properties::check(&graph, checks)?;
    debug!(steps = graph.len(), "pipeline compiled");
    Ok(graph)
}

/// Execute a checked graph with the real process executor.
pub async fn run_pipeline(
    graph: Arc<CompiledGraph>,
    options: RunOptions,
    ctx: ExecContext,
) -> Result<RunReport> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(rt_tx.clone(), ctx);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(graph, options);
    let runtime = Runtime::new(core, rt_rx, executor);
    let report = runtime.run().await?;

    for (name, state) in &report.steps {
        debug!(step = %name, ?state, "final step state");
    }

    Ok(report)
}

/// Directory step commands are started in.
///
/// - The directory containing the pipeline file, when it can be resolved.
/// - Otherwise the current working directory "."
fn pipeline_root_dir(fs: &dyn FileSystem, pipeline: &Path) -> PathBuf {
    fs.canonicalize(pipeline)
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print the steps wave by wave.
fn print_dry_run(graph: &CompiledGraph) {
    println!("cascade dry-run");
    println!();

    let waves = dag::execution_waves(graph);
    println!("steps ({}), {} wave(s):", graph.len(), waves.len());
    for (n, wave) in waves.iter().enumerate() {
        println!("  wave {}:", n + 1);
        for id in wave {
            let Some(step) = graph.step(*id) else {
                continue;
            };
            println!("    - {}", step.name);
            println!("        source_repo: {}", step.source_repo);
            if !step.source_path.is_empty() {
                println!("        source_path: {}", step.source_path);
            }
            println!("        command: {}", step.command);
            if !step.predecessors.is_empty() {
                println!("        after: {:?}", graph.names_of(&step.predecessors));
            }
            if !step.paths.is_empty() {
                println!("        paths: {:?}", step.paths);
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
