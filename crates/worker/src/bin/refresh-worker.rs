//! refresh-worker: refreshes the reporting dataset on demand.
//!
//! Subcommands:
//! - `refresh`: empty the output folder and launch the extraction query
//! - `grant-acl`: apply output-object permissions for an S3 notification

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use refresh_core::load_dotenv;
use refresh_worker::{handle, handle_object_created, InvocationContext};

// ── CLI ─────────────────────────────────────────────────────────────

/// Reporting dataset refresh worker.
#[derive(Parser, Debug)]
#[command(name = "refresh-worker", version, about)]
struct Cli {
    /// Request id to tag this invocation's logs with (random when omitted).
    #[arg(long, env = "REFRESH_REQUEST_ID", global = true)]
    request_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Empty the output folder and launch the extraction query.
    Refresh {
        /// Trigger payload as JSON (`-` for stdin). Defaults to `{}`.
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Apply output-object permissions for an S3 object-created event.
    GrantAcl {
        /// S3 event notification as JSON (`-` for stdin).
        #[arg(long)]
        event: PathBuf,
    },
}

fn read_event(path: Option<&PathBuf>) -> anyhow::Result<serde_json::Value> {
    let raw = match path {
        None => return Ok(serde_json::json!({})),
        Some(p) if p.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading event from stdin")?;
            buf
        }
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("reading event from {}", p.display()))?,
    };
    serde_json::from_str(&raw).context("event is not valid JSON")
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let ctx = match cli.request_id {
        Some(id) => InvocationContext::new(id, "cli"),
        None => InvocationContext::local(),
    };

    match cli.command {
        Command::Refresh { event } => {
            let event = read_event(event.as_ref())?;
            handle(event, ctx).await?;
            info!("refresh-worker exited cleanly");
        }
        Command::GrantAcl { event } => {
            let event = read_event(Some(&event))?;
            let outcome = handle_object_created(event, ctx).await?;
            info!(outcome = ?outcome, "grant-acl finished");
        }
    }

    Ok(())
}
