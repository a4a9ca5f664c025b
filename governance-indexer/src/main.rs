// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Governance Indexer
//!
//! Replays an ordered governor/token event log into the governance projection.
//!
//! ```text
//! events.ndjson ──► EventLogReader ──► mpsc ──► EventRunner ──► EntityStore
//!                                                                (JSON file)
//! ```
//!
//! Re-running against the same store resumes after the stored watermark.

use anyhow::Context;
use clap::Parser;
use governance_indexer::config::IndexerConfig;
use governance_indexer::decode::LogDecoder;
use governance_indexer::metrics::IndexerMetrics;
use governance_indexer::reader::{EventLogReader, InputFormat};
use governance_indexer::{run_event_handler, EventRunner, GovernanceProjector, RunSummary};
use governance_schema::{Governance, GOVERNANCE_ID};
use governance_store::{EntityStore, JsonFileStore, MemoryStore};
use prometheus::{Registry, TextEncoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(rename_all = "kebab-case", author, version)]
struct Args {
    /// Newline-delimited event log, in chain order
    #[clap(env, long)]
    events: PathBuf,
    #[clap(env = "GOVERNANCE_INDEXER_CONFIG", long)]
    config: Option<PathBuf>,
    #[clap(long, value_enum)]
    input_format: Option<InputFormat>,
    /// Overrides `store_path` from the config
    #[clap(env = "GOVERNANCE_STORE", long)]
    store: Option<PathBuf>,
    #[clap(long)]
    token_decimals: Option<u32>,
    /// Project into memory only, nothing is persisted
    #[clap(long)]
    in_memory: bool,
    /// Print Prometheus metrics after the run
    #[clap(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => IndexerConfig::from_file(path)?,
        None => IndexerConfig::default(),
    };
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(decimals) = args.token_decimals {
        config.token_decimals = decimals;
    }
    if let Some(format) = args.input_format {
        config.input_format = format;
    }
    config.validate()?;
    info!("[Main] Starting with config: {:?}", config);

    let registry = Registry::new();
    let metrics = Arc::new(IndexerMetrics::new(&registry));

    let summary = if args.in_memory {
        replay(Arc::new(MemoryStore::new()), &config, &args.events, metrics).await?
    } else {
        let store = JsonFileStore::open(&config.store_path)
            .with_context(|| format!("Failed to open store {:?}", config.store_path))?;
        replay(Arc::new(store), &config, &args.events, metrics).await?
    };
    info!(
        "[Main] Done, applied {} events, skipped {}",
        summary.applied, summary.skipped
    );

    if args.print_metrics {
        let text = TextEncoder::new().encode_to_string(&registry.gather())?;
        println!("{}", text);
    }
    Ok(())
}

async fn replay<S: EntityStore + 'static>(
    store: Arc<S>,
    config: &IndexerConfig,
    events: &Path,
    metrics: Arc<IndexerMetrics>,
) -> anyhow::Result<RunSummary> {
    let projector = GovernanceProjector::new(store.clone(), config.decimal_scale()?, metrics);
    let runner = EventRunner::new(projector).await?;

    let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
    let cancel = CancellationToken::new();
    let handle = run_event_handler(runner, event_rx, cancel.clone());

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[Main] Received Ctrl-C, shutting down");
            ctrl_c_cancel.cancel();
        }
    });

    let reader = EventLogReader::new(
        config.input_format,
        LogDecoder::new(config.governor_address, config.token_address),
    );
    // The sender is dropped when streaming ends, which closes the runner's channel
    let read_result = reader.stream(events, event_tx).await;
    let summary = handle.await.context("Event handler task panicked")??;
    let sent = read_result?;
    info!("[Main] Read {} events from {}", sent, events.display());

    let governance: Option<Governance> = store.load(GOVERNANCE_ID).await?;
    if let Some(governance) = governance {
        info!(
            "[Main] Governance: proposals_queued={} token_holders={} delegates={} delegated_votes={}",
            governance.proposals_queued,
            governance.current_token_holders,
            governance.current_delegates,
            governance.delegated_votes
        );
    }
    Ok(summary)
}
