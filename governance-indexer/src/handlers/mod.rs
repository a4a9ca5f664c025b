// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Governance event handlers
//!
//! `GovernanceProjector::process` dispatches each decoded event to its handler.
//! Handlers are plain read-modify-write sequences against a [`WriteSet`]
//! staged over the entity store:
//!
//! ```text
//! GovernanceLog
//!      │
//!      ▼
//! GovernanceProjector::process()
//!      │
//!      ├─► proposal    (ProposalCreated / Canceled / Queued / Executed, VoteCast)
//!      ├─► delegation  (DelegateChanged, DelegateVotesChanged)
//!      └─► transfer    (Transfer)
//! ```
//!
//! The write set reaches the store as one batch once the handler is done. A
//! store error anywhere in the event leaves the store as it was before the
//! event, and the caller must stop feeding events.

use crate::decimals::DecimalScale;
use crate::events::{EventContext, GovernanceEvent, GovernanceLog};
use crate::metrics::IndexerMetrics;
use ethers::types::{I256, U256};
use governance_store::{EntityStore, StoreResult, WriteSet};
use std::sync::Arc;
use tracing::{debug, warn};

mod delegation;
mod factories;
mod proposal;
mod transfer;

pub use factories::DelegateLookup;

/// Anomaly labels
pub(crate) const ANOMALY_NEGATIVE_BALANCE: &str = "negative_balance";
pub(crate) const ANOMALY_UNKNOWN_VOTER: &str = "unknown_voter";
pub(crate) const ANOMALY_AMOUNT_OVERFLOW: &str = "amount_overflow";

/// Projects governance events onto the entity store
pub struct GovernanceProjector<S> {
    store: Arc<S>,
    scale: DecimalScale,
    metrics: Arc<IndexerMetrics>,
}

impl<S: EntityStore> GovernanceProjector<S> {
    pub fn new(store: Arc<S>, scale: DecimalScale, metrics: Arc<IndexerMetrics>) -> Self {
        Self {
            store,
            scale,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<IndexerMetrics> {
        &self.metrics
    }

    /// Apply a single event and commit its writes in one batch
    pub async fn process(&self, log: &GovernanceLog) -> StoreResult<()> {
        let writes = self.stage(log).await?;
        writes.commit().await?;
        self.record_processed(log);
        Ok(())
    }

    /// Run the handler for `log` against a fresh write set over the store.
    /// Nothing reaches the store until the returned write set is committed.
    pub async fn stage(&self, log: &GovernanceLog) -> StoreResult<Arc<WriteSet<S>>> {
        let writes = Arc::new(WriteSet::new(Arc::clone(&self.store)));
        let staged = GovernanceProjector {
            store: Arc::clone(&writes),
            scale: self.scale,
            metrics: Arc::clone(&self.metrics),
        };
        staged.dispatch(log).await?;
        Ok(writes)
    }

    async fn dispatch(&self, log: &GovernanceLog) -> StoreResult<()> {
        let ctx = log.context();
        debug!(
            "[Projector] {} at block {} index {}",
            log.event.name(),
            log.block_number,
            log.log_index
        );

        match &log.event {
            GovernanceEvent::ProposalCreated(event) => {
                self.handle_proposal_created(event, &ctx).await
            }
            GovernanceEvent::ProposalCanceled(event) => {
                self.handle_proposal_canceled(event, &ctx).await
            }
            GovernanceEvent::ProposalQueued(event) => {
                self.handle_proposal_queued(event, &ctx).await
            }
            GovernanceEvent::ProposalExecuted(event) => {
                self.handle_proposal_executed(event, &ctx).await
            }
            GovernanceEvent::VoteCast(event) => self.handle_vote_cast(event, &ctx).await,
            GovernanceEvent::DelegateChanged(event) => {
                self.handle_delegate_changed(event, &ctx).await
            }
            GovernanceEvent::DelegateVotesChanged(event) => {
                self.handle_delegate_votes_changed(event, &ctx).await
            }
            GovernanceEvent::Transfer(event) => self.handle_transfer(event, &ctx).await,
        }
    }

    /// Count a committed event
    pub(crate) fn record_processed(&self, log: &GovernanceLog) {
        self.metrics
            .events_processed
            .with_label_values(&[log.event.name()])
            .inc();
        self.metrics
            .last_processed_block
            .set(i64::try_from(log.block_number).unwrap_or(i64::MAX));
    }

    /// Reinterpret an on-chain unsigned amount as signed, saturating at `I256::MAX`
    fn to_signed(&self, value: U256, ctx: &EventContext) -> I256 {
        if value > I256::MAX.into_raw() {
            warn!(
                "[Projector] Amount {} exceeds the signed range, saturating. tx_hash: {:?}",
                value, ctx.tx_hash
            );
            self.record_anomaly(ANOMALY_AMOUNT_OVERFLOW);
            return I256::MAX;
        }
        I256::from_raw(value)
    }

    /// `a + b`, saturating at the I256 bounds
    fn add_amounts(&self, a: I256, b: I256, ctx: &EventContext) -> I256 {
        match a.checked_add(b) {
            Some(sum) => sum,
            None => {
                self.overflowed(a, b, ctx);
                a.saturating_add(b)
            }
        }
    }

    /// `a - b`, saturating at the I256 bounds
    fn sub_amounts(&self, a: I256, b: I256, ctx: &EventContext) -> I256 {
        match a.checked_sub(b) {
            Some(difference) => difference,
            None => {
                self.overflowed(a, b, ctx);
                a.saturating_sub(b)
            }
        }
    }

    fn overflowed(&self, a: I256, b: I256, ctx: &EventContext) {
        warn!(
            "[Projector] Arithmetic on {} and {} leaves the signed range, saturating. tx_hash: {:?}",
            a, b, ctx.tx_hash
        );
        self.record_anomaly(ANOMALY_AMOUNT_OVERFLOW);
    }

    fn record_anomaly(&self, kind: &str) {
        self.metrics.anomalies.with_label_values(&[kind]).inc();
    }
}

/// Change in a "how many are non-zero" counter when a value moves from
/// `previous` to `current`
pub(crate) fn zero_crossing(previous: I256, current: I256) -> i64 {
    if previous.is_zero() && current.is_positive() {
        1
    } else if previous.is_positive() && current.is_zero() {
        -1
    } else {
        0
    }
}
