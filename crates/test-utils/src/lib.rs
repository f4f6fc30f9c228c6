pub mod builders;
pub mod fake_executor;

use std::sync::{Arc, Once};

use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use cascade::dag::{CompiledGraph, RunReport};
use cascade::engine::{CoreRuntime, RunOptions, Runtime, RuntimeEvent};
use cascade::exec::ExecutorBackend;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Drive a full run of `graph` through the real control loop, using the
/// executor built by `make_executor` from the runtime event sender.
pub async fn run_graph<E, F>(graph: CompiledGraph, options: RunOptions, make_executor: F) -> RunReport
where
    E: ExecutorBackend,
    F: FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
{
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = make_executor(rt_tx);

    let core = CoreRuntime::new(Arc::new(graph), options);
    let runtime = Runtime::new(core, rt_rx, executor);

    with_timeout(runtime.run())
        .await
        .expect("runtime returned an error")
}
