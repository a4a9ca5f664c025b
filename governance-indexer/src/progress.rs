// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Indexer progress
//!
//! The watermark is the chain position `(block_number, log_index)` of the last
//! event whose handler completed. It lives in the entity store next to the
//! projection, so a restart resumes right after it and a replay of an
//! already-applied prefix is a no-op.

use governance_schema::{Checkpoint, CHECKPOINT_ID};
use governance_store::{EntityStore, StoreResult};
use std::sync::Arc;
use tracing::debug;

pub struct IndexerProgressStore<S> {
    store: Arc<S>,
}

impl<S: EntityStore> IndexerProgressStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns None if nothing has been applied yet
    pub async fn get_watermark(&self) -> StoreResult<Option<(u64, u64)>> {
        let checkpoint: Option<Checkpoint> = self.store.load(CHECKPOINT_ID).await?;
        Ok(checkpoint.map(|c| c.position()))
    }

    /// The runner wraps an event's write set here, so the watermark commits
    /// in the same batch as the event it follows
    pub async fn update_watermark(&self, block_number: u64, log_index: u64) -> StoreResult<()> {
        let checkpoint = Checkpoint {
            id: CHECKPOINT_ID.to_string(),
            block_number,
            log_index,
        };
        self.store.save(&checkpoint).await?;
        debug!(
            "[Progress] Watermark at block {} index {}",
            block_number, log_index
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance_store::MemoryStore;

    #[tokio::test]
    async fn test_watermark_roundtrip() {
        let progress = IndexerProgressStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(progress.get_watermark().await.unwrap(), None);

        progress.update_watermark(10, 2).await.unwrap();
        assert_eq!(progress.get_watermark().await.unwrap(), Some((10, 2)));

        progress.update_watermark(11, 0).await.unwrap();
        assert_eq!(progress.get_watermark().await.unwrap(), Some((11, 0)));
    }
}
