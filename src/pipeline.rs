//! Extraction pipeline for stable files
//!
//! Given a path the coalescer reported stable, the pipeline:
//! 1. Skips paths still carrying an in-progress suffix
//! 2. Stats the path (a vanished file is a job failure)
//! 3. Skips directories and files that are not a supported archive
//! 4. Creates the sibling destination directory
//! 5. Extracts the archive into it
//! 6. Moves the archive itself into the destination directory
//!
//! Failures are scoped to the job: [`ExtractionPipeline::handle`] reports
//! them and returns, and the archive stays where it was if extraction failed.

use crate::classify::{destination_dir, has_in_progress_suffix};
use crate::error::{Error, ExtractionError, Result};
use crate::extraction::{extract_archive, resolve};
use crate::notifier::{Icon, NOTIFICATION_TITLE, Notifier};
use crate::types::{Event, ExtractionJob};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Permissions of a freshly created destination directory
#[cfg(unix)]
const DESTINATION_MODE: u32 = 0o700;

/// Why a stable path did not produce an extraction job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Path still ends in `.part`, `.tmp` or `.opdownload`
    InProgressSuffix,
    /// Path is a directory
    Directory,
    /// Not an archive format this system extracts
    Unsupported,
}

/// Result of running the pipeline on one stable path
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do
    Skipped(SkipReason),
    /// Archive extracted and moved into `destination`
    Extracted {
        /// Directory holding the archive contents and the archive itself
        destination: PathBuf,
        /// Number of files materialized
        files: usize,
    },
}

/// Extraction pipeline executor
pub struct ExtractionPipeline {
    /// Desktop (or log) notifications
    notifier: Arc<dyn Notifier>,
    /// Event channel for emitting lifecycle events
    event_tx: broadcast::Sender<Event>,
}

impl ExtractionPipeline {
    /// Create a new pipeline
    pub fn new(notifier: Arc<dyn Notifier>, event_tx: broadcast::Sender<Event>) -> Self {
        Self { notifier, event_tx }
    }

    /// Run the pipeline and report any failure
    ///
    /// A failure is logged, emitted as [`Event::ExtractionFailed`] and sent as
    /// an error notification. The result is returned unchanged so callers can
    /// inspect it, but nothing needs to be done with it.
    pub async fn handle(&self, stable_path: &Path) -> Result<Outcome> {
        let result = self.run(stable_path).await;

        match &result {
            Ok(Outcome::Skipped(reason)) => {
                debug!(path = ?stable_path, ?reason, "no extraction needed");
            }
            Ok(Outcome::Extracted { destination, files }) => {
                info!(path = ?stable_path, ?destination, files, "extraction finished");
            }
            Err(e) => {
                warn!(path = ?stable_path, error = %e, "extraction job failed");
                self.event_tx
                    .send(Event::ExtractionFailed {
                        source: stable_path.to_path_buf(),
                        error: e.to_string(),
                    })
                    .ok();
                self.notify(
                    &format!("failed to extract {}: {}", stable_path.display(), e),
                    Icon::Error,
                )
                .await;
            }
        }

        result
    }

    /// Run the pipeline on a stable path
    ///
    /// Returns `Ok(Outcome::Skipped(..))` for paths that are not extraction
    /// targets, and an error if the path cannot be stat'ed or any step of the
    /// extraction fails.
    pub async fn run(&self, stable_path: &Path) -> Result<Outcome> {
        if has_in_progress_suffix(stable_path) {
            return Ok(Outcome::Skipped(SkipReason::InProgressSuffix));
        }

        let metadata =
            tokio::fs::metadata(stable_path)
                .await
                .map_err(|source| Error::SourceUnavailable {
                    path: stable_path.to_path_buf(),
                    source,
                })?;

        if metadata.is_dir() {
            return Ok(Outcome::Skipped(SkipReason::Directory));
        }

        let kind = resolve(stable_path);
        if !kind.is_supported() {
            return Ok(Outcome::Skipped(SkipReason::Unsupported));
        }

        let destination_dir =
            destination_dir(stable_path).ok_or_else(|| ExtractionError::InvalidPath {
                path: stable_path.to_path_buf(),
            })?;

        let job = ExtractionJob {
            source_path: stable_path.to_path_buf(),
            destination_dir,
            kind,
        };

        self.execute(&job).await
    }

    /// Extract a confirmed archive and move it into its destination
    async fn execute(&self, job: &ExtractionJob) -> Result<Outcome> {
        info!(
            archive = ?job.source_path,
            destination = ?job.destination_dir,
            kind = %job.kind,
            "starting extraction"
        );

        self.event_tx
            .send(Event::ExtractionStarted {
                source: job.source_path.clone(),
                destination: job.destination_dir.clone(),
                kind: job.kind,
            })
            .ok();
        self.notify(
            &format!("extracting {}", job.source_path.display()),
            Icon::Download,
        )
        .await;

        create_destination(&job.destination_dir).await?;

        let files = extract_archive(job).await?;

        let moved_to = move_into_destination(&job.source_path, &job.destination_dir).await?;
        debug!(from = ?job.source_path, to = ?moved_to, "archive moved into destination");

        self.notify(
            &format!("{} extracted successfully", job.destination_dir.display()),
            Icon::Extracted,
        )
        .await;
        self.event_tx
            .send(Event::ExtractionComplete {
                source: job.source_path.clone(),
                destination: job.destination_dir.clone(),
                files: files.len(),
            })
            .ok();

        Ok(Outcome::Extracted {
            destination: job.destination_dir.clone(),
            files: files.len(),
        })
    }

    /// Best-effort notification; failures are logged
    async fn notify(&self, body: &str, icon: Icon) {
        if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, body, icon).await {
            warn!(
                notifier = self.notifier.name(),
                error = %e,
                "failed to send notification"
            );
        }
    }
}

/// Create the destination directory (and parents) restricted to the owner
async fn create_destination(path: &Path) -> Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DESTINATION_MODE);

    builder
        .create(path)
        .await
        .map_err(|e| ExtractionError::DestinationFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(())
}

/// Move the archive into the destination under its original file name
async fn move_into_destination(source: &Path, destination: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| ExtractionError::InvalidPath {
            path: source.to_path_buf(),
        })?;
    let target = destination.join(file_name);

    tokio::fs::rename(source, &target)
        .await
        .map_err(|e| ExtractionError::MoveFailed {
            from: source.to_path_buf(),
            to: target.clone(),
            reason: e.to_string(),
        })?;
    Ok(target)
}
