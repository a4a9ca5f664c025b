// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sequential event application
//!
//! ```text
//! EventLogReader ──(GovernanceLog)──► mpsc ──► run_event_handler
//!                                                   │
//!                                                   ▼
//!                                        EventRunner::apply()
//!                                                   │
//!                           position <= watermark ──┼──► skip
//!                                                   ▼
//!                                   GovernanceProjector::stage()
//!                                                   │
//!                                                   ▼
//!                                watermark staged in the same write set
//!                                                   │
//!                                                   ▼
//!                                     WriteSet::commit() (one batch)
//! ```
//!
//! Events are applied one at a time. An event's entity writes and its
//! watermark reach the store in one batch, so after a store failure the
//! store holds either the whole event or none of it, and a redelivered event
//! starts from the same state as the first attempt.

use crate::events::GovernanceLog;
use crate::handlers::GovernanceProjector;
use crate::progress::IndexerProgressStore;
use anyhow::Context;
use governance_store::{EntityStore, StoreResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub(crate) const SKIP_ALREADY_APPLIED: &str = "already_applied";
pub(crate) const SKIP_OUT_OF_ORDER: &str = "out_of_order";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// At or before the stored watermark
    AlreadyApplied,
    /// Behind an event already received in this run
    OutOfOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: u64,
    pub skipped: u64,
}

pub struct EventRunner<S> {
    projector: GovernanceProjector<S>,
    watermark: Option<(u64, u64)>,
    last_received: Option<(u64, u64)>,
}

impl<S: EntityStore> EventRunner<S> {
    /// Resume from the watermark stored alongside the projection
    pub async fn new(projector: GovernanceProjector<S>) -> StoreResult<Self> {
        let watermark = IndexerProgressStore::new(Arc::clone(projector.store()))
            .get_watermark()
            .await?;
        match watermark {
            Some((block, index)) => info!(
                "[Runner] Resuming after block {} index {}",
                block, index
            ),
            None => info!("[Runner] No watermark, starting from the first event"),
        }
        Ok(Self {
            projector,
            watermark,
            last_received: None,
        })
    }

    pub fn projector(&self) -> &GovernanceProjector<S> {
        &self.projector
    }

    pub fn watermark(&self) -> Option<(u64, u64)> {
        self.watermark
    }

    pub async fn apply(&mut self, log: &GovernanceLog) -> StoreResult<ApplyOutcome> {
        let position = log.position();
        let metrics = self.projector.metrics();

        if let Some(last) = self.last_received {
            if position < last {
                warn!(
                    "[Runner] Out of order {} at {:?} after {:?}, skipping. tx_hash: {:?}",
                    log.event.name(),
                    position,
                    last,
                    log.tx_hash
                );
                metrics
                    .events_skipped
                    .with_label_values(&[SKIP_OUT_OF_ORDER])
                    .inc();
                metrics
                    .anomalies
                    .with_label_values(&[SKIP_OUT_OF_ORDER])
                    .inc();
                return Ok(ApplyOutcome::OutOfOrder);
            }
        }
        self.last_received = Some(position);

        if let Some(watermark) = self.watermark {
            if position <= watermark {
                debug!(
                    "[Runner] {} at {:?} already applied",
                    log.event.name(),
                    position
                );
                metrics
                    .events_skipped
                    .with_label_values(&[SKIP_ALREADY_APPLIED])
                    .inc();
                return Ok(ApplyOutcome::AlreadyApplied);
            }
        }

        let writes = self.projector.stage(log).await?;
        IndexerProgressStore::new(Arc::clone(&writes))
            .update_watermark(log.block_number, log.log_index)
            .await?;
        writes.commit().await?;
        self.projector.record_processed(log);
        self.watermark = Some(position);
        Ok(ApplyOutcome::Applied)
    }
}

/// Drain `event_rx` into the runner until the channel closes or `cancel` fires.
///
/// A store error stops the loop and is returned; nothing after the failing
/// event is applied.
pub fn run_event_handler<S: EntityStore + 'static>(
    mut runner: EventRunner<S>,
    mut event_rx: mpsc::Receiver<GovernanceLog>,
    cancel: CancellationToken,
) -> JoinHandle<anyhow::Result<RunSummary>> {
    tokio::spawn(async move {
        info!("[Runner] Starting event handler");
        let mut summary = RunSummary::default();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Runner] Cancelled, stopping");
                    break;
                }
                event = event_rx.recv() => {
                    match event {
                        Some(log) => {
                            match runner.apply(&log).await {
                                Ok(ApplyOutcome::Applied) => summary.applied += 1,
                                Ok(_) => summary.skipped += 1,
                                Err(e) => {
                                    error!(
                                        "[Runner] Store failure on {} at block {} index {}: {:?}",
                                        log.event.name(),
                                        log.block_number,
                                        log.log_index,
                                        e
                                    );
                                    return Err(e).with_context(|| {
                                        format!(
                                            "Failed to apply {} at block {} index {}",
                                            log.event.name(),
                                            log.block_number,
                                            log.log_index
                                        )
                                    });
                                }
                            }
                        }
                        None => {
                            info!("[Runner] Event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            "[Runner] Stopped, applied {} skipped {}",
            summary.applied, summary.skipped
        );
        Ok(summary)
    })
}
