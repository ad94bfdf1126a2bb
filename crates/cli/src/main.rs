//! Relay entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — flags and environment variables via `clap`
//!    ([`cli::RelaySettings`] plus the trigger location and log format).
//! 2. **Wire observability** — a `tracing-subscriber` fmt layer on stderr,
//!    plain or JSON, filtered by `RUST_LOG`.
//! 3. **Read the trigger** — from `--event` or stdin, in either payload shape.
//! 4. **Construct infrastructure** — [`cli::build_relay`] injects
//!    `CodePipelineClient` and `GithubStatusClient` into `StatusRelay`.
//! 5. **Map the outcome to an exit code** — `0` on success, `75` when the
//!    failure is worth redelivering, `1` otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{build_relay, exit_status_for, init_tracing, RelaySettings};
use listener::{parse_trigger, read_trigger_input, STDIN_PATH};
use relay::RelayRunId;
use tracing::{error, info, info_span, Instrument};

#[derive(Debug, Parser)]
#[command(name = "codepipeline-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Report a CodePipeline execution's status as a GitHub commit status",
    long_about = None
)]
struct Cli {
    /// Trigger payload file, or `-` for stdin
    #[arg(long, env = "RELAY_EVENT", default_value = STDIN_PATH)]
    event: PathBuf,

    #[command(flatten)]
    settings: RelaySettings,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn run(args: Cli) -> Result<()> {
    let raw = read_trigger_input(&args.event)
        .with_context(|| format!("reading trigger from {}", args.event.display()))?;
    let event = parse_trigger(
        &raw,
        args.settings.shape,
        args.settings.github_token.as_deref(),
    )?;

    let relay = build_relay(&args.settings).await?;
    relay.relay(&event).await?;
    info!("Commit status reported");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.json, args.verbose);

    let run_id = RelayRunId::new_random();
    match run(args).instrument(info_span!("run", %run_id)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%run_id, error = %format!("{err:#}"), "Relay failed");
            ExitCode::from(exit_status_for(&err))
        }
    }
}
