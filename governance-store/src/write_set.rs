// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{EntityStore, RecordBatch, StoreResult, StoreSnapshot};
use async_trait::async_trait;
use governance_schema::EntityKind;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Staged writes over another store
///
/// Reads see staged records first and fall through to the underlying store.
/// Nothing reaches the underlying store until [`WriteSet::commit`], which
/// hands every staged record over in a single `put_batch`. Dropping a write
/// set without committing discards it.
pub struct WriteSet<S> {
    inner: Arc<S>,
    staged: RwLock<RecordBatch>,
}

impl<S: EntityStore> WriteSet<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            staged: RwLock::new(RecordBatch::new()),
        }
    }

    /// Number of staged records
    pub async fn len(&self) -> usize {
        self.staged.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.staged.read().await.is_empty()
    }

    /// Write every staged record to the underlying store as one batch.
    /// The staged records are consumed even if the batch fails.
    pub async fn commit(&self) -> StoreResult<usize> {
        let batch = std::mem::take(&mut *self.staged.write().await);
        let count = batch.len();
        if count > 0 {
            self.inner.put_batch(batch).await?;
        }
        debug!("[Store] Committed {} staged records", count);
        Ok(count)
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for WriteSet<S> {
    async fn get_raw(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Value>> {
        let staged = self.staged.read().await.get(&(kind, id.to_string())).cloned();
        match staged {
            Some(value) => Ok(Some(value)),
            None => self.inner.get_raw(kind, id).await,
        }
    }

    async fn put_raw(&self, kind: EntityKind, id: &str, value: Value) -> StoreResult<()> {
        self.staged
            .write()
            .await
            .insert((kind, id.to_string()), value);
        Ok(())
    }

    async fn put_batch(&self, batch: RecordBatch) -> StoreResult<()> {
        self.staged.write().await.extend(batch);
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let mut snapshot = self.inner.snapshot().await?;
        for ((kind, id), value) in self.staged.read().await.iter() {
            snapshot
                .entry(kind.as_str().to_string())
                .or_default()
                .insert(id.clone(), value.clone());
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use governance_schema::{Delegate, Entity, TokenHolder};

    #[tokio::test]
    async fn test_reads_fall_through_to_inner_store() {
        let inner = Arc::new(MemoryStore::new());
        inner.save(&Delegate::new("0xcc")).await.unwrap();

        let writes = WriteSet::new(inner.clone());
        let loaded: Option<Delegate> = writes.load("0xcc").await.unwrap();
        assert_eq!(loaded, Some(Delegate::new("0xcc")));
        assert!(writes.is_empty().await);
    }

    #[tokio::test]
    async fn test_staged_writes_are_invisible_until_commit() {
        let inner = Arc::new(MemoryStore::new());
        let writes = WriteSet::new(inner.clone());

        let mut delegate = Delegate::new("0xcc");
        delegate.token_holders_represented_amount = 2;
        writes.save(&delegate).await.unwrap();
        writes.save(&TokenHolder::new("0xaa")).await.unwrap();

        let staged: Option<Delegate> = writes.load("0xcc").await.unwrap();
        assert_eq!(staged, Some(delegate.clone()));
        assert_eq!(writes.snapshot().await.unwrap().len(), 2);
        assert!(inner.is_empty().await);

        assert_eq!(writes.commit().await.unwrap(), 2);
        let committed: Option<Delegate> = inner.load("0xcc").await.unwrap();
        assert_eq!(committed, Some(delegate));
        assert_eq!(inner.len().await, 2);
        assert!(writes.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropped_write_set_leaves_store_untouched() {
        let inner = Arc::new(MemoryStore::new());
        inner.save(&TokenHolder::new("0xaa")).await.unwrap();
        let before = inner.snapshot().await.unwrap();

        {
            let writes = WriteSet::new(inner.clone());
            let mut holder = TokenHolder::new("0xaa");
            holder.delegate = Some("0xcc".to_string());
            writes.save(&holder).await.unwrap();
        }

        assert_eq!(inner.snapshot().await.unwrap(), before);
    }
}
