//! Tile catalog boundary.
//!
//! The catalog is the source of truth for tile records; everything else in
//! this crate (the hierarchy index, the transfer queue, the delete resolver)
//! treats it as an external collaborator behind the [`TileCatalog`] trait.
//!
//! # Design Principles
//!
//! - **Dyn-compatible**: uses `Pin<Box<dyn Future>>` for trait object support
//! - **Idempotent create**: re-uploading an existing coordinate is an upsert,
//!   not an error, because tile overwrite is a supported feature
//! - **Cascading delete**: deleting a prefix removes every record nested
//!   under it, plus the corresponding payloads in the object store
//! - **Degraded payload deletion**: a failed payload removal never fails the
//!   record deletion; it is logged and the outcome still reported
//!
//! # Example
//!
//! ```ignore
//! use tilevault::catalog::{MemoryCatalog, TileCatalog};
//! use tilevault::coord::{TileCoord, TilePrefix};
//!
//! let catalog = MemoryCatalog::new();
//! catalog.create(TileCoord::new(9, 14, 3), bytes).await?;
//!
//! // Cascading delete of everything under zoom 9
//! let outcome = catalog.delete_by_prefix(TilePrefix::zoom(9)).await?;
//! assert_eq!(outcome.deleted_records.len(), 1);
//! ```

mod fs;
mod memory;

pub use fs::FsCatalog;
pub use memory::{MemoryCatalog, MemoryObjectStore};

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{TileCoord, TilePrefix};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A persisted tile record.
///
/// Identity is the `(z, x, y)` coordinate; `file_name` is derived from it as
/// `"{z}-{x}-{y}"` and is unique across the catalog. The `id` is an opaque
/// backend-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Opaque backend identifier.
    pub id: String,
    /// Derived canonical name, `"{z}-{x}-{y}"`.
    pub file_name: String,
    /// Zoom level.
    pub z: u32,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileRecord {
    /// Create a record for the given coordinate.
    pub fn new(id: impl Into<String>, coord: TileCoord) -> Self {
        Self {
            id: id.into(),
            file_name: coord.file_name(),
            z: coord.z,
            x: coord.x,
            y: coord.y,
        }
    }

    /// The record's tile coordinate.
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.z, self.x, self.y)
    }
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Result of a cascading delete.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Every record removed by the operation, in `(z, x, y)` order per call.
    pub deleted_records: Vec<TileRecord>,
}

/// Store for raw tile image payloads, keyed by the derived tile name.
pub trait ObjectStore: Send + Sync {
    /// Store a payload under the given tile name, replacing any existing one.
    fn put(&self, name: &str, bytes: Bytes) -> BoxFuture<'_, Result<(), CatalogError>>;

    /// Remove the payload stored under the given tile name.
    fn delete(&self, name: &str) -> BoxFuture<'_, Result<(), CatalogError>>;
}

/// Create/read/delete operations over tile records keyed by coordinate.
pub trait TileCatalog: Send + Sync {
    /// Full scan of the catalog, ordered by `(z, x, y)` ascending.
    fn list_all(&self) -> BoxFuture<'_, Result<Vec<TileRecord>, CatalogError>>;

    /// Create or replace the record at `coord` with the given payload.
    ///
    /// Idempotent upsert: re-uploading an existing coordinate succeeds and
    /// returns the surviving record.
    fn create(
        &self,
        coord: TileCoord,
        bytes: Bytes,
    ) -> BoxFuture<'_, Result<TileRecord, CatalogError>>;

    /// Delete every record whose coordinate lies under `prefix`.
    ///
    /// A prefix matching no records yields an empty outcome, not an error.
    fn delete_by_prefix(
        &self,
        prefix: TilePrefix,
    ) -> BoxFuture<'_, Result<DeleteOutcome, CatalogError>>;

    /// Batch form of [`Self::delete_by_prefix`]: the union of deleting each
    /// prefix in turn.
    fn delete_by_prefixes(
        &self,
        prefixes: Vec<TilePrefix>,
    ) -> BoxFuture<'_, Result<DeleteOutcome, CatalogError>> {
        Box::pin(async move {
            let mut outcome = DeleteOutcome::default();
            for prefix in prefixes {
                let partial = self.delete_by_prefix(prefix).await?;
                outcome.deleted_records.extend(partial.deleted_records);
            }
            Ok(outcome)
        })
    }
}
