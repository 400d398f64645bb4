//! Batch tile transfer.
//!
//! Moves many tile payloads into the catalog as one batch with ordered
//! progress reporting and per-item failure isolation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        BatchQueue                             │
//! │                                                               │
//! │  submit ──► ┌──────────┐   drain   ┌──────────────────────┐  │
//! │             │   FIFO    │ ────────► │ one catalog.create() │  │
//! │             │   queue   │  (tasks   │ in flight at a time  │  │
//! │             └──────────┘  in order) └──────────┬───────────┘  │
//! │                                                ▼              │
//! │                              progress update per task         │
//! │                              failure ──► task callback, log   │
//! │                              queue empty ──► batch callback   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strictly sequential draining is a deliberate backpressure policy: it
//! bounds outbound catalog calls to exactly one, which keeps the progress
//! counter race-free and error attribution per-tile.
//!
//! Validation of upload sources (image format, coordinate shape) happens in
//! [`validate`] before a task is ever constructed; the queue never sees an
//! invalid coordinate.

mod progress;
mod queue;
mod task;
pub mod validate;

pub use progress::{ProgressCallback, ProgressUpdate};
pub use queue::{BatchCompleteCallback, BatchOutcome, BatchQueue, DrainPolicy, TransferError};
pub use task::{TaskFailureCallback, TaskSuccessCallback, UploadTask};
pub use validate::{UploadRequest, ValidationError};
