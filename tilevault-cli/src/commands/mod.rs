//! CLI subcommands.

pub mod delete;
pub mod tree;
pub mod upload;

use std::path::Path;
use std::sync::Arc;

use tilevault::catalog::FsCatalog;
use tilevault::session::{SessionConfig, TileSession};
use tilevault::transfer::DrainPolicy;

use crate::error::CliError;

/// Open the catalog at `root` and start a loaded session over it.
pub async fn open_session(root: &Path, policy: DrainPolicy) -> Result<TileSession, CliError> {
    let catalog = Arc::new(FsCatalog::open(root).await?);
    let mut session = TileSession::new(catalog, SessionConfig::default().with_drain_policy(policy));
    session.load().await?;
    Ok(session)
}
