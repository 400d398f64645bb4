//! Session orchestration for TileVault.
//!
//! `TileSession` is the explicitly owned per-session instance that ties the
//! subsystems together: it holds the catalog handle, the hierarchy index,
//! and the batch queue, and exposes the observer surface the presentational
//! layer consumes.
//!
//! # Data Flow
//!
//! 1. `load()` rebuilds the hierarchy index from the catalog's full scan
//! 2. `upload_batch()` validates sources, queues the valid ones, drains the
//!    queue, and folds produced records into the index
//! 3. `delete_selected()` minimizes the selection, runs the cascading
//!    delete, and removes the deleted records from the index
//!
//! The session is single-threaded: at most one index-mutating operation is
//! in flight at a time (the `&mut self` receivers enforce what the original
//! UI achieved by disabling its controls while a batch drains).
//!
//! # Example
//!
//! ```ignore
//! use tilevault::session::{SessionConfig, TileSession, UploadSource};
//!
//! let mut session = TileSession::new(catalog, SessionConfig::default());
//! session.load().await?;
//!
//! let report = session.upload_batch(sources).await?;
//! println!("{} uploaded, {} rejected", report.produced.len(), report.rejected.len());
//! ```

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogError, TileCatalog, TileRecord};
use crate::index::{TileTree, TreeNode};
use crate::resolver::{self, DeleteError};
use crate::transfer::{
    BatchCompleteCallback, BatchQueue, DrainPolicy, ProgressCallback, TransferError,
    UploadRequest, UploadTask, ValidationError,
};

/// Callback invoked after a delete with the removed records.
pub type DeleteCompleteCallback = Box<dyn Fn(&[TileRecord]) + Send + Sync>;

/// Session configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    /// Batch queue drain policy.
    pub drain_policy: DrainPolicy,
}

impl SessionConfig {
    /// Set the drain policy.
    pub fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }
}

/// Errors that make a whole session operation fail.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The initial full load failed; no partial index is built.
    #[error("failed to load tile catalog: {0}")]
    Load(#[source] CatalogError),
}

/// One upload source: a display name (used to derive the coordinate) plus
/// payload bytes.
#[derive(Debug, Clone)]
pub struct UploadSource {
    /// Relative source name, e.g. `"12/2048/1365.png"` or `"12-2048-1365.png"`.
    pub name: String,
    /// Tile image bytes.
    pub payload: Bytes,
}

impl UploadSource {
    /// Create a source from a name and payload.
    pub fn new(name: impl Into<String>, payload: Bytes) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Aggregate result of one upload batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records produced by successful uploads, in submission order.
    pub produced: Vec<TileRecord>,
    /// Number of queued tasks that failed during transfer.
    pub failed: usize,
    /// Sources rejected before queueing, with the reason.
    pub rejected: Vec<(String, ValidationError)>,
}

/// An owned, single-instance coordinator for one user session.
///
/// Create it when the session starts, discard it when the session ends; the
/// index it holds is a cache rebuilt from the catalog on [`Self::load`].
pub struct TileSession {
    catalog: Arc<dyn TileCatalog>,
    tree: TileTree,
    queue: BatchQueue,
    on_delete_complete: Option<DeleteCompleteCallback>,
}

impl TileSession {
    /// Create a session over the given catalog.
    pub fn new(catalog: Arc<dyn TileCatalog>, config: SessionConfig) -> Self {
        Self {
            catalog,
            tree: TileTree::new(),
            queue: BatchQueue::new(config.drain_policy),
            on_delete_complete: None,
        }
    }

    /// Install the upload progress observer.
    pub fn set_progress_observer(&mut self, callback: ProgressCallback) {
        self.queue.set_progress_observer(callback);
    }

    /// Install the batch-completion callback.
    pub fn set_batch_complete(&mut self, callback: BatchCompleteCallback) {
        self.queue.set_batch_complete(callback);
    }

    /// Install the delete-completion callback.
    pub fn set_delete_complete(&mut self, callback: DeleteCompleteCallback) {
        self.on_delete_complete = Some(callback);
    }

    /// Rebuild the hierarchy index from the catalog.
    ///
    /// A catalog failure here is blocking: the previous index is kept and no
    /// partial one is built.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        let records = self
            .catalog
            .list_all()
            .await
            .map_err(SessionError::Load)?;
        info!(records = records.len(), "loaded tile catalog");
        self.tree = TileTree::build(&records);
        Ok(())
    }

    /// Current hierarchy snapshot for rendering.
    pub fn tree(&self) -> &[TreeNode] {
        self.tree.nodes()
    }

    /// Validate, queue, and transfer a batch of upload sources.
    ///
    /// Invalid sources are reported in the returned [`BatchReport`] and
    /// skipped; they never enter the queue. Valid sources are uploaded
    /// strictly in order and the produced records are folded into the index.
    pub async fn upload_batch(
        &mut self,
        sources: Vec<UploadSource>,
    ) -> Result<BatchReport, TransferError> {
        let mut rejected = Vec::new();
        let mut requests = Vec::new();
        for source in sources {
            match UploadRequest::from_relative_path(Path::new(&source.name), source.payload) {
                Ok(request) => requests.push(request),
                Err(err) => {
                    warn!(name = %source.name, error = %err, "upload source rejected");
                    rejected.push((source.name, err));
                }
            }
        }

        if requests.is_empty() {
            return Ok(BatchReport {
                rejected,
                ..BatchReport::default()
            });
        }

        self.queue.begin_batch(requests.len())?;
        for request in requests {
            self.queue
                .submit(UploadTask::new(request.target, request.payload))?;
        }

        let outcome = self.queue.drain(self.catalog.as_ref()).await;
        for record in &outcome.produced {
            self.tree.insert(record);
        }

        Ok(BatchReport {
            produced: outcome.produced,
            failed: outcome.failed,
            rejected,
        })
    }

    /// Resolve a selection of coordinate keys and delete the covered tiles.
    ///
    /// Returns the removed records, which are also removed from the index.
    pub async fn delete_selected(
        &mut self,
        keys: &[String],
    ) -> Result<Vec<TileRecord>, DeleteError> {
        let removed =
            resolver::delete_selection(self.catalog.as_ref(), &mut self.tree, keys).await?;
        if let Some(callback) = &self.on_delete_complete {
            callback(&removed);
        }
        Ok(removed)
    }
}
