// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::{to_snapshot, EntityStore, RecordBatch, StoreResult, StoreSnapshot};
use async_trait::async_trait;
use governance_schema::EntityKind;
use serde_json::Value;
use tokio::sync::RwLock;

/// In-memory entity store
///
/// Records are kept in a `BTreeMap` so snapshots come out in a stable order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<RecordBatch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all kinds
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of records of one kind
    pub async fn count(&self, kind: EntityKind) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_raw(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Value>> {
        let records = self.records.read().await;
        Ok(records.get(&(kind, id.to_string())).cloned())
    }

    async fn put_raw(&self, kind: EntityKind, id: &str, value: Value) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records.insert((kind, id.to_string()), value);
        Ok(())
    }

    async fn put_batch(&self, batch: RecordBatch) -> StoreResult<()> {
        self.records.write().await.extend(batch);
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let records = self.records.read().await;
        Ok(to_snapshot(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governance_schema::{Delegate, Entity, TokenHolder};

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = MemoryStore::new();
        let loaded: Option<Delegate> = store.load("0xabc").await.unwrap();
        assert!(loaded.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut delegate = Delegate::new("0xabc");
        delegate.token_holders_represented_amount = 3;
        store.save(&delegate).await.unwrap();

        let loaded: Delegate = store.load("0xabc").await.unwrap().unwrap();
        assert_eq!(loaded, delegate);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing() {
        let store = MemoryStore::new();
        let mut delegate = Delegate::new("0xabc");
        store.save(&delegate).await.unwrap();
        delegate.token_holders_represented_amount = -1;
        store.save(&delegate).await.unwrap();

        let loaded: Delegate = store.load("0xabc").await.unwrap().unwrap();
        assert_eq!(loaded.token_holders_represented_amount, -1);
        assert_eq!(store.count(EntityKind::Delegate).await, 1);
    }

    #[tokio::test]
    async fn test_same_id_different_kinds_are_separate() {
        let store = MemoryStore::new();
        store.save(&Delegate::new("0xabc")).await.unwrap();
        store.save(&TokenHolder::new("0xabc")).await.unwrap();

        assert_eq!(store.count(EntityKind::Delegate).await, 1);
        assert_eq!(store.count(EntityKind::TokenHolder).await, 1);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_corrupt() {
        let store = MemoryStore::new();
        store
            .put_raw(EntityKind::Delegate, "0xabc", serde_json::json!({"id": 5}))
            .await
            .unwrap();

        let result: crate::StoreResult<Option<Delegate>> = store.load("0xabc").await;
        let err = result.unwrap_err();
        assert_eq!(err.error_type(), "corrupt");
    }

    #[tokio::test]
    async fn test_put_batch_writes_every_record() {
        let store = MemoryStore::new();
        store.save(&TokenHolder::new("0xaa")).await.unwrap();

        let mut updated = TokenHolder::new("0xaa");
        updated.delegate = Some("0xcc".to_string());
        let mut batch = RecordBatch::new();
        batch.insert(
            (EntityKind::TokenHolder, "0xaa".to_string()),
            serde_json::to_value(&updated).unwrap(),
        );
        batch.insert(
            (EntityKind::Delegate, "0xcc".to_string()),
            serde_json::to_value(Delegate::new("0xcc")).unwrap(),
        );
        store.put_batch(batch).await.unwrap();

        assert_eq!(store.len().await, 2);
        let loaded: TokenHolder = store.load("0xaa").await.unwrap().unwrap();
        assert_eq!(loaded.delegate.as_deref(), Some("0xcc"));
    }

    #[tokio::test]
    async fn test_snapshot_is_grouped_and_ordered() {
        let store = MemoryStore::new();
        store.save(&TokenHolder::new("0xbb")).await.unwrap();
        store.save(&TokenHolder::new("0xaa")).await.unwrap();
        store.save(&Delegate::new("0xcc")).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        let kinds: Vec<&String> = snapshot.keys().collect();
        assert_eq!(kinds, vec!["Delegate", "TokenHolder"]);
        let holders: Vec<&String> = snapshot["TokenHolder"].keys().collect();
        assert_eq!(holders, vec!["0xaa", "0xbb"]);
    }
}
