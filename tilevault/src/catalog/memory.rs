//! In-memory catalog and object store.
//!
//! `MemoryCatalog` keeps records in a `BTreeMap` keyed by [`TileCoord`], so a
//! full scan is naturally ordered by `(z, x, y)`. It is the default session
//! backend for tests and short-lived sessions.
//!
//! Payloads live in a separate [`ObjectStore`] so that prefix deletion can
//! exercise the degraded path: a payload that fails to delete is logged and
//! skipped, while the record deletion still succeeds.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::coord::{TileCoord, TilePrefix};

use super::{BoxFuture, CatalogError, DeleteOutcome, ObjectStore, TileCatalog, TileRecord};

/// In-memory object store mapping tile names to payload bytes.
#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads.
    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    /// True if no payloads are stored.
    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }

    /// Fetch a payload by tile name.
    pub async fn get(&self, name: &str) -> Option<Bytes> {
        self.blobs.lock().await.get(name).cloned()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, name: &str, bytes: Bytes) -> BoxFuture<'_, Result<(), CatalogError>> {
        let name = name.to_string();
        Box::pin(async move {
            self.blobs.lock().await.insert(name, bytes);
            Ok(())
        })
    }

    fn delete(&self, name: &str) -> BoxFuture<'_, Result<(), CatalogError>> {
        let name = name.to_string();
        Box::pin(async move {
            self.blobs.lock().await.remove(&name);
            Ok(())
        })
    }
}

/// In-memory tile catalog.
///
/// Records are keyed by coordinate; payload bytes are delegated to an
/// [`ObjectStore`]. Callers share it behind an `Arc`.
pub struct MemoryCatalog {
    records: Mutex<BTreeMap<TileCoord, TileRecord>>,
    store: Arc<dyn ObjectStore>,
    next_id: AtomicU64,
}

impl MemoryCatalog {
    /// Create an empty catalog with its own in-memory object store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryObjectStore::new()))
    }

    /// Create an empty catalog backed by the given object store.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            store,
            next_id: AtomicU64::new(1),
        }
    }

    fn assign_id(&self) -> String {
        format!("t{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of records in the catalog.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// True if the catalog holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCatalog for MemoryCatalog {
    fn list_all(&self) -> BoxFuture<'_, Result<Vec<TileRecord>, CatalogError>> {
        Box::pin(async move {
            // BTreeMap iteration order is (z, x, y) ascending
            Ok(self.records.lock().await.values().cloned().collect())
        })
    }

    fn create(
        &self,
        coord: TileCoord,
        bytes: Bytes,
    ) -> BoxFuture<'_, Result<TileRecord, CatalogError>> {
        Box::pin(async move {
            self.store.put(&coord.file_name(), bytes).await?;

            let mut records = self.records.lock().await;
            let record = records
                .entry(coord)
                .or_insert_with(|| TileRecord::new(self.assign_id(), coord))
                .clone();
            debug!(tile = %coord, id = %record.id, "stored tile record");
            Ok(record)
        })
    }

    fn delete_by_prefix(
        &self,
        prefix: TilePrefix,
    ) -> BoxFuture<'_, Result<DeleteOutcome, CatalogError>> {
        Box::pin(async move {
            let deleted_records: Vec<TileRecord> = {
                let mut records = self.records.lock().await;
                let targets: Vec<TileCoord> = records
                    .keys()
                    .filter(|coord| prefix.matches(coord))
                    .copied()
                    .collect();
                targets
                    .into_iter()
                    .filter_map(|coord| records.remove(&coord))
                    .collect()
            };

            for record in &deleted_records {
                // Record deletion already happened; a payload failure is
                // reported but does not undo it.
                if let Err(err) = self.store.delete(&record.file_name).await {
                    warn!(
                        tile = %record.file_name,
                        error = %err,
                        "payload deletion failed; record removed anyway"
                    );
                }
            }

            debug!(prefix = %prefix, count = deleted_records.len(), "cascading delete");
            Ok(DeleteOutcome { deleted_records })
        })
    }
}
