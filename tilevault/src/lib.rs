//! TileVault - client-side management for a sparse map-tile catalog
//!
//! This library maintains a hierarchical index over a flat collection of tile
//! records addressed by `(z, x, y)` coordinates, moves batches of tile files
//! into and out of a backing catalog with ordered progress reporting, and
//! collapses redundant nested delete requests into minimal cascading
//! operations.
//!
//! # High-Level API
//!
//! For most use cases, the [`session`] module provides a simplified facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilevault::catalog::MemoryCatalog;
//! use tilevault::session::{SessionConfig, TileSession};
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let mut session = TileSession::new(catalog, SessionConfig::default());
//!
//! session.load().await?;
//! let report = session.upload_batch(sources).await?;
//! ```

pub mod catalog;
pub mod coord;
pub mod index;
pub mod logging;
pub mod resolver;
pub mod session;
pub mod transfer;

/// Version of the TileVault library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
