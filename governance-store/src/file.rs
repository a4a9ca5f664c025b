// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON file backed entity store

use crate::{from_snapshot, to_snapshot, EntityStore, RecordBatch, StoreResult, StoreSnapshot};
use async_trait::async_trait;
use governance_schema::EntityKind;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Entity store persisted as a single JSON document
///
/// The whole snapshot is rewritten on every put or batch (temp file + rename),
/// so a write that returned `Ok` survives a crash. The indexer commits one
/// batch per event, which keeps it to one rewrite per event. Suited to
/// replays and small deployments, not to large live indexes.
pub struct JsonFileStore {
    file_path: PathBuf,
    records: RwLock<RecordBatch>,
}

impl JsonFileStore {
    /// Open the store at `file_path`, loading existing state if the file exists
    pub fn open(file_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let file_path = file_path.into();
        let records = if file_path.exists() {
            let contents = std::fs::read_to_string(&file_path)?;
            let snapshot: StoreSnapshot = serde_json::from_str(&contents)?;
            let records = from_snapshot(snapshot)?;
            info!(
                "[Store] Loaded {} records from {:?}",
                records.len(),
                file_path
            );
            records
        } else {
            info!("[Store] No state file at {:?}, starting empty", file_path);
            RecordBatch::new()
        };

        Ok(Self {
            file_path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    async fn persist(&self, records: &RecordBatch) -> StoreResult<()> {
        let contents = serde_json::to_vec(&to_snapshot(records))?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, contents).await?;
        tokio::fs::rename(&temp_path, &self.file_path).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for JsonFileStore {
    async fn get_raw(&self, kind: EntityKind, id: &str) -> StoreResult<Option<Value>> {
        let records = self.records.read().await;
        Ok(records.get(&(kind, id.to_string())).cloned())
    }

    async fn put_raw(&self, kind: EntityKind, id: &str, value: Value) -> StoreResult<()> {
        let mut batch = RecordBatch::new();
        batch.insert((kind, id.to_string()), value);
        self.put_batch(batch).await
    }

    async fn put_batch(&self, batch: RecordBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut records = self.records.write().await;
        let mut replaced = Vec::with_capacity(batch.len());
        for (key, value) in batch {
            let previous = records.insert(key.clone(), value);
            replaced.push((key, previous));
        }

        // Keep memory and disk in step: undo the batch if the write fails
        if let Err(e) = self.persist(&records).await {
            for (key, previous) in replaced {
                match previous {
                    Some(old) => records.insert(key, old),
                    None => records.remove(&key),
                };
            }
            return Err(e);
        }

        debug!("[Store] Saved {} records to {:?}", replaced.len(), self.file_path);
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let records = self.records.read().await;
        Ok(to_snapshot(&records))
    }
}
