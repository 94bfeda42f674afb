//! dirpush - one-way push of a local directory into a Google Drive folder
//!
//! Folders are created or adopted by title, files are always uploaded, and
//! a file that already exists remotely is first moved into a quarantine
//! folder. Nothing is ever deleted and no state survives the run.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use dirpush_core::governor::EXIT_CEILING_EXCEEDED;
use dirpush_core::PushError;

mod output;
mod push;

use push::PushCommand;

/// Exit code for missing or invalid inputs
const EXIT_CONFIG: u8 = 2;
/// Exit code after Ctrl-C
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "dirpush",
    version,
    about = "Push a local directory into a Google Drive folder"
)]
pub struct Cli {
    /// Log every remote call
    #[arg(short, long)]
    verbose: bool,

    /// Use alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    push: PushCommand,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let run = match cli.push.resolve(cli.config.as_deref()) {
        Ok(run) => run,
        Err(e) => return report_failure(&e),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        run.config.logging.level.as_str()
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            on_signal.cancel();
        }
    });

    match push::execute(run, cancel).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

fn report_failure(err: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {err:#}");
    ExitCode::from(exit_code_for(err))
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PushError>() {
        Some(PushError::Config(_)) => EXIT_CONFIG,
        Some(PushError::CeilingExceeded(_)) => EXIT_CEILING_EXCEEDED as u8,
        Some(PushError::Cancelled) => EXIT_CANCELLED,
        _ => 1,
    }
}
