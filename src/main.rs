// src/main.rs

use std::process::ExitCode;

use cascade::{cli, logging, run};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(status) if status.is_success() => ExitCode::SUCCESS,
        Ok(status) => {
            error!(%status, "pipeline did not succeed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("cascade error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_main() -> anyhow::Result<cascade::dag::RunStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
