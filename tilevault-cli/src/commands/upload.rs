//! Upload command - batch tile images into the catalog.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use tilevault::session::UploadSource;
use tilevault::transfer::DrainPolicy;

use crate::error::CliError;

/// Run the upload command.
pub async fn run(root: &Path, policy: DrainPolicy, files: Vec<PathBuf>) -> Result<(), CliError> {
    if files.is_empty() {
        println!("Nothing to upload");
        return Ok(());
    }

    let mut session = super::open_session(root, policy).await?;

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let payload = tokio::fs::read(file).await?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        debug!(%name, bytes = payload.len(), "read upload source");
        sources.push(UploadSource::new(name, Bytes::from(payload)));
    }

    let bar = ProgressBar::new(100).with_style(
        ProgressStyle::with_template("{bar:40} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    {
        let bar = bar.clone();
        session.set_progress_observer(Box::new(move |update| {
            bar.set_position(update.percent as u64);
            if !update.is_uploading {
                bar.finish();
            }
        }));
    }

    let report = session.upload_batch(sources).await?;

    println!(
        "Uploaded {} tiles ({} failed, {} rejected)",
        report.produced.len(),
        report.failed,
        report.rejected.len()
    );
    for (name, reason) in &report.rejected {
        println!("  rejected {}: {}", name, reason);
    }
    Ok(())
}
