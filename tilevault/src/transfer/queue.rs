//! Sequential batch queue with ordered progress and failure isolation.
//!
//! The queue moves between two states: `Idle` (empty, not draining) and
//! `Draining` (processing tasks strictly one at a time). Submissions are
//! accepted only while idle; once a drain starts, the batch is closed, so
//! the progress denominator can never race with late submissions.
//!
//! Per-task failures never abort the drain: the failure is reported to that
//! task's own callback and logged, and the loop advances. The aggregate
//! completion callback fires exactly once per batch, with only the records
//! the successful tasks produced.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{TileCatalog, TileRecord};

use super::progress::{ProgressCallback, ProgressUpdate};
use super::task::UploadTask;

/// When a queued batch starts draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Drain as soon as any task is queued: lowest latency per item, but the
    /// first progress updates may be computed against a still-growing batch
    /// total if the caller submits incrementally.
    #[default]
    Eager,

    /// Drain only once the expected batch size declared via
    /// [`BatchQueue::begin_batch`] has been submitted: the progress
    /// denominator is exact from the first reported percentage.
    Counted,
}

/// Errors from queue submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    /// The queue is draining; new submissions belong to the next batch.
    #[error("batch is draining; new submissions are not accepted")]
    Draining,
}

/// Aggregate result of draining one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records produced by the successful tasks, in submission order.
    pub produced: Vec<TileRecord>,
    /// Number of tasks that failed.
    pub failed: usize,
}

/// Callback invoked once per batch with the produced records.
pub type BatchCompleteCallback = Box<dyn Fn(&[TileRecord]) + Send + Sync>;

/// Ordered, strictly-sequential upload task runner.
pub struct BatchQueue {
    policy: DrainPolicy,
    queue: VecDeque<UploadTask>,
    /// Declared batch size for [`DrainPolicy::Counted`]; zero when undeclared.
    expected: usize,
    completed: usize,
    total: usize,
    produced: Vec<TileRecord>,
    draining: bool,
    progress: Option<ProgressCallback>,
    on_batch_complete: Option<BatchCompleteCallback>,
}

impl BatchQueue {
    /// Create an empty queue with the given drain policy.
    pub fn new(policy: DrainPolicy) -> Self {
        Self {
            policy,
            queue: VecDeque::new(),
            expected: 0,
            completed: 0,
            total: 0,
            produced: Vec::new(),
            draining: false,
            progress: None,
            on_batch_complete: None,
        }
    }

    /// Install the progress observer.
    pub fn set_progress_observer(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    /// Install the batch-completion callback.
    pub fn set_batch_complete(&mut self, callback: BatchCompleteCallback) {
        self.on_batch_complete = Some(callback);
    }

    /// Drain policy in effect.
    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when the queue is empty and not draining.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.draining
    }

    /// True while a drain loop is active.
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Declare the expected size of the next batch.
    ///
    /// Required for [`DrainPolicy::Counted`]; optional otherwise. Also resets
    /// any leftover batch counters.
    pub fn begin_batch(&mut self, expected: usize) -> Result<(), TransferError> {
        if self.draining {
            return Err(TransferError::Draining);
        }
        self.reset_batch_state();
        self.expected = expected;
        Ok(())
    }

    /// Append a task to the tail of the queue.
    ///
    /// Submitting while a drain loop is active is rejected: the current
    /// batch's total is already fixed. Batch counters are reset when each
    /// drain finishes, so a submission that finds the queue empty and idle
    /// starts a fresh batch.
    pub fn submit(&mut self, task: UploadTask) -> Result<(), TransferError> {
        if self.draining {
            return Err(TransferError::Draining);
        }
        debug!(target = %task.target(), queued = self.queue.len() + 1, "queued upload task");
        self.queue.push_back(task);
        Ok(())
    }

    /// True when the drain policy allows the queued batch to start.
    pub fn ready_to_drain(&self) -> bool {
        if self.draining || self.queue.is_empty() {
            return false;
        }
        match self.policy {
            DrainPolicy::Eager => true,
            DrainPolicy::Counted => self.expected > 0 && self.queue.len() >= self.expected,
        }
    }

    /// Execute every queued task to completion, one at a time, in FIFO order.
    ///
    /// After each task the observer receives a progress update; a task's
    /// failure is reported to its own callback and the loop advances. When
    /// the queue empties, the batch-completion callback fires once with the
    /// produced records (if any succeeded), a final `{ not uploading, 100% }`
    /// update is published, and the batch counters reset.
    pub async fn drain(&mut self, catalog: &dyn TileCatalog) -> BatchOutcome {
        if self.draining || self.queue.is_empty() {
            return BatchOutcome::default();
        }

        self.draining = true;
        self.total = self.queue.len();
        self.completed = 0;
        let mut failed = 0usize;
        info!(total = self.total, "batch drain started");

        while let Some(task) = self.queue.pop_front() {
            let (target, payload, on_success, on_failure) = task.into_parts();
            match catalog.create(target, payload).await {
                Ok(record) => {
                    if let Some(callback) = on_success {
                        callback(&record);
                    }
                    self.produced.push(record);
                }
                Err(err) => {
                    warn!(tile = %target, error = %err, "upload task failed; batch continues");
                    failed += 1;
                    if let Some(callback) = on_failure {
                        callback(&err);
                    }
                }
            }

            self.completed += 1;
            // The final 100% is published once, by the completion update below
            if self.completed < self.total {
                self.publish(ProgressUpdate::during(self.completed, self.total));
            }
        }

        let produced = std::mem::take(&mut self.produced);
        if !produced.is_empty() {
            if let Some(callback) = &self.on_batch_complete {
                callback(&produced);
            }
        }

        self.publish(ProgressUpdate::finished());
        info!(
            succeeded = produced.len(),
            failed, "batch drain finished"
        );

        self.reset_batch_state();
        self.draining = false;
        BatchOutcome { produced, failed }
    }

    fn publish(&self, update: ProgressUpdate) {
        if let Some(callback) = &self.progress {
            callback(update);
        }
    }

    fn reset_batch_state(&mut self) {
        self.expected = 0;
        self.completed = 0;
        self.total = 0;
        self.produced.clear();
    }
}
