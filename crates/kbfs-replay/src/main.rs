//! Replay a recorded kbfs event log through the client model.
//!
//! Each input line is one JSON-encoded event. Events are fed to the store in
//! order; the requests the model would have sent to the backend and the
//! final model state are written to stdout as one JSON document.
//!
//! Usage:
//!   kbfs-replay session.jsonl
//!   kbfs-replay --config kbfs.toml < session.jsonl
//!   RUST_LOG=kbfs_client=debug kbfs-replay session.jsonl

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use kbfs_client::{FsEvent, FsRequest, ModelConfig, StateSnapshot, spawn_store};

/// Replay kbfs events and print the resulting requests and state.
#[derive(Parser, Debug)]
#[command(name = "kbfs-replay")]
#[command(about = "Replay recorded kbfs events through the client model")]
struct Args {
    /// Event log, one JSON event per line. Reads stdin when omitted.
    events: Option<PathBuf>,

    /// TOML model configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop at the first line that fails to decode instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Omit the final state from the output
    #[arg(long)]
    requests_only: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    events: usize,
    skipped: usize,
    generation: u64,
    requests: Vec<FsRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<StateSnapshot>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ModelConfig::default(),
    };

    // Logs go to stderr; stdout carries the report.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let input: Box<dyn BufRead> = match &args.events {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (store, mut requests) = spawn_store(&config);

    let mut events = 0;
    let mut skipped = 0;
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("reading event log")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<FsEvent>(line) {
            Ok(event) => {
                store.send(event)?;
                events += 1;
            }
            Err(e) if args.strict => {
                return Err(e).with_context(|| format!("line {}", idx + 1));
            }
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping undecodable event");
                skipped += 1;
            }
        }
    }

    let generation = store.barrier().await?;
    tracing::info!(events, skipped, generation, "replay complete");

    let mut emitted = Vec::new();
    while let Ok(request) = requests.try_recv() {
        tracing::debug!(request = request.kind(), "request");
        emitted.push(request);
    }

    let report = Report {
        events,
        skipped,
        generation,
        requests: emitted,
        state: (!args.requests_only).then(|| store.read(|s| s.snapshot())),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
