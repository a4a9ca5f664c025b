// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Entity store for the governance projection
//!
//! Key-value persistence addressed by `(EntityKind, id)`. The store contract
//! is narrow: get, put, an all-or-nothing batch put and a full ordered
//! snapshot.
//!
//! - [`MemoryStore`]: ordered in-memory map, used for tests and dry runs
//! - [`JsonFileStore`]: memory map mirrored to a JSON file on every write
//! - [`WriteSet`]: staging overlay over another store. Reads fall through,
//!   writes stay local until [`WriteSet::commit`] hands them over as one batch

use async_trait::async_trait;
use governance_schema::{Entity, EntityKind};
use serde_json::Value;
use std::collections::BTreeMap;

mod error;
mod file;
mod memory;
mod write_set;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use write_set::WriteSet;

/// Ordered view of every stored record: kind name -> id -> record
pub type StoreSnapshot = BTreeMap<String, BTreeMap<String, Value>>;

/// Records written together, keyed by `(kind, id)`
pub type RecordBatch = BTreeMap<(EntityKind, String), Value>;

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_raw(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Value>>;

    /// Upsert a record. Must be durable before the call returns.
    async fn put_raw(&self, kind: EntityKind, id: &str, value: Value) -> StoreResult<()>;

    /// Upsert every record in `batch`. Either the whole batch is durable when
    /// the call returns `Ok` or none of it is visible.
    async fn put_batch(&self, batch: RecordBatch) -> StoreResult<()>;

    async fn snapshot(&self) -> StoreResult<StoreSnapshot>;

    async fn load<E: Entity>(&self, id: &str) -> StoreResult<Option<E>> {
        match self.get_raw(E::KIND, id).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    kind: E::KIND,
                    id: id.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn save<E: Entity>(&self, entity: &E) -> StoreResult<()> {
        let value = serde_json::to_value(entity)?;
        self.put_raw(E::KIND, entity.id(), value).await
    }
}

/// Build the ordered snapshot layout from a flat `(kind, id)` map
pub(crate) fn to_snapshot(records: &RecordBatch) -> StoreSnapshot {
    let mut snapshot = StoreSnapshot::new();
    for ((kind, id), value) in records {
        snapshot
            .entry(kind.as_str().to_string())
            .or_default()
            .insert(id.clone(), value.clone());
    }
    snapshot
}

/// Inverse of [`to_snapshot`]
pub(crate) fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<RecordBatch> {
    let mut records = RecordBatch::new();
    for (kind_name, entries) in snapshot {
        let kind = EntityKind::parse(&kind_name)
            .ok_or_else(|| StoreError::UnknownKind(kind_name.clone()))?;
        for (id, value) in entries {
            records.insert((kind, id), value);
        }
    }
    Ok(records)
}
