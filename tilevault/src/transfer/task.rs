//! Upload task type.
//!
//! A task is one file destined for one tile coordinate. Tasks live only
//! inside the [`BatchQueue`](super::BatchQueue): they are created on
//! submission and consumed on completion or failure.

use std::fmt;

use bytes::Bytes;

use crate::catalog::{CatalogError, TileRecord};
use crate::coord::TileCoord;

/// Per-task callback invoked with the produced record on success.
pub type TaskSuccessCallback = Box<dyn FnOnce(&TileRecord) + Send>;

/// Per-task callback invoked with the error on failure.
pub type TaskFailureCallback = Box<dyn FnOnce(&CatalogError) + Send>;

/// A single queued upload: payload bytes bound for a target coordinate.
pub struct UploadTask {
    payload: Bytes,
    target: TileCoord,
    on_success: Option<TaskSuccessCallback>,
    on_failure: Option<TaskFailureCallback>,
}

impl UploadTask {
    /// Create a task for the given target coordinate.
    pub fn new(target: TileCoord, payload: Bytes) -> Self {
        Self {
            payload,
            target,
            on_success: None,
            on_failure: None,
        }
    }

    /// Attach a completion callback.
    pub fn on_success(mut self, callback: TaskSuccessCallback) -> Self {
        self.on_success = Some(callback);
        self
    }

    /// Attach a failure callback.
    pub fn on_failure(mut self, callback: TaskFailureCallback) -> Self {
        self.on_failure = Some(callback);
        self
    }

    /// Target tile coordinate.
    pub fn target(&self) -> TileCoord {
        self.target
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Split the task into the pieces the drain loop needs.
    pub(crate) fn into_parts(
        self,
    ) -> (
        TileCoord,
        Bytes,
        Option<TaskSuccessCallback>,
        Option<TaskFailureCallback>,
    ) {
        (self.target, self.payload, self.on_success, self.on_failure)
    }
}

impl fmt::Debug for UploadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTask")
            .field("target", &self.target)
            .field("payload_len", &self.payload.len())
            .field("has_on_success", &self.on_success.is_some())
            .field("has_on_failure", &self.on_failure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_accessors() {
        let task = UploadTask::new(TileCoord::new(1, 2, 3), Bytes::from_static(b"abcd"));
        assert_eq!(task.target(), TileCoord::new(1, 2, 3));
        assert_eq!(task.payload_len(), 4);
    }

    #[test]
    fn test_debug_omits_payload_bytes() {
        let task = UploadTask::new(TileCoord::new(1, 2, 3), Bytes::from_static(b"abcd"))
            .on_success(Box::new(|_| {}));
        let debug = format!("{:?}", task);
        assert!(debug.contains("payload_len"));
        assert!(debug.contains("has_on_success: true"));
        assert!(!debug.contains("abcd"));
    }
}
