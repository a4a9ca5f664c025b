// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Get-or-create helpers. A missing record is built with zeroed fields and
//! saved before it is returned, so repeated calls see the same stored state.

use super::{GovernanceProjector, ANOMALY_UNKNOWN_VOTER};
use crate::events::EventContext;
use governance_schema::{
    Delegate, Entity, Governance, Proposal, TokenHolder, Vote, GOVERNANCE_ID,
};
use governance_store::{EntityStore, StoreResult};
use tracing::warn;

/// How a missing delegate is treated
#[derive(Debug, Clone, Copy)]
pub enum DelegateLookup<'a> {
    CreateIfMissing,
    /// The delegate should already exist. Absence is logged as an anomaly
    /// and the delegate is created anyway.
    ExpectExisting {
        event: &'static str,
        ctx: &'a EventContext,
    },
}

impl<S: EntityStore> GovernanceProjector<S> {
    async fn get_or_create<E: Entity>(&self, id: &str) -> StoreResult<E> {
        let existing: Option<E> = self.store.load(id).await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }
        let entity = E::new(id);
        self.store.save(&entity).await?;
        Ok(entity)
    }

    pub(crate) async fn get_governance(&self) -> StoreResult<Governance> {
        self.get_or_create(GOVERNANCE_ID).await
    }

    pub(crate) async fn get_or_create_token_holder(&self, id: &str) -> StoreResult<TokenHolder> {
        self.get_or_create(id).await
    }

    pub(crate) async fn get_or_create_delegate(
        &self,
        id: &str,
        lookup: DelegateLookup<'_>,
    ) -> StoreResult<Delegate> {
        if let DelegateLookup::ExpectExisting { event, ctx } = lookup {
            let existing: Option<Delegate> = self.store.load(id).await?;
            if existing.is_none() {
                warn!(
                    "[Projector] Delegate {} not found on {}. tx_hash: {:?}",
                    id, event, ctx.tx_hash
                );
                self.record_anomaly(ANOMALY_UNKNOWN_VOTER);
            }
        }
        self.get_or_create(id).await
    }

    pub(crate) async fn get_or_create_proposal(&self, id: &str) -> StoreResult<Proposal> {
        self.get_or_create(id).await
    }

    pub(crate) async fn get_or_create_vote(&self, id: &str) -> StoreResult<Vote> {
        self.get_or_create(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimals::DecimalScale;
    use crate::metrics::IndexerMetrics;
    use ethers::types::{H256, I256};
    use governance_store::MemoryStore;
    use std::sync::Arc;

    fn projector() -> GovernanceProjector<MemoryStore> {
        GovernanceProjector::new(
            Arc::new(MemoryStore::new()),
            DecimalScale::default(),
            Arc::new(IndexerMetrics::new_for_testing()),
        )
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let projector = projector();
        let first = projector.get_or_create_token_holder("0xaa").await.unwrap();
        let second = projector.get_or_create_token_holder("0xaa").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(projector.store().len().await, 1);

        let snapshot_before = projector.store().snapshot().await.unwrap();
        projector.get_or_create_token_holder("0xaa").await.unwrap();
        assert_eq!(projector.store().snapshot().await.unwrap(), snapshot_before);
    }

    #[tokio::test]
    async fn test_get_or_create_persists_immediately() {
        let projector = projector();
        projector.get_or_create_proposal("7").await.unwrap();
        let stored: Option<Proposal> = projector.store().load("7").await.unwrap();
        assert_eq!(stored, Some(Proposal::new("7")));
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let projector = projector();
        let mut delegate = Delegate::new("0xbb");
        delegate.delegated_votes_raw = I256::from(10);
        projector.store().save(&delegate).await.unwrap();

        let loaded = projector
            .get_or_create_delegate("0xbb", DelegateLookup::CreateIfMissing)
            .await
            .unwrap();
        assert_eq!(loaded.delegated_votes_raw, I256::from(10));
    }

    #[tokio::test]
    async fn test_expected_delegate_is_created_when_missing() {
        let projector = projector();
        let ctx = EventContext {
            block_number: 1,
            log_index: 0,
            tx_hash: H256::zero(),
        };
        let delegate = projector
            .get_or_create_delegate(
                "0xcc",
                DelegateLookup::ExpectExisting {
                    event: "VoteCast",
                    ctx: &ctx,
                },
            )
            .await
            .unwrap();
        assert_eq!(delegate, Delegate::new("0xcc"));
        assert_eq!(projector.metrics().anomaly_count(ANOMALY_UNKNOWN_VOTER), 1);

        // second lookup finds it, no new anomaly
        projector
            .get_or_create_delegate(
                "0xcc",
                DelegateLookup::ExpectExisting {
                    event: "VoteCast",
                    ctx: &ctx,
                },
            )
            .await
            .unwrap();
        assert_eq!(projector.metrics().anomaly_count(ANOMALY_UNKNOWN_VOTER), 1);
    }

    #[tokio::test]
    async fn test_governance_singleton() {
        let projector = projector();
        let governance = projector.get_governance().await.unwrap();
        assert_eq!(governance, Governance::default());
        let stored: Option<Governance> = projector.store().load(GOVERNANCE_ID).await.unwrap();
        assert!(stored.is_some());
    }
}
