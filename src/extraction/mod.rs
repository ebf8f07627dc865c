//! Archive extraction
//!
//! This module maps an [`ArchiveKind`] to the extractor that materializes it.
//! Every extractor implements the same [`Extractor`] contract: fully write the
//! archive's members under a destination directory, or fail.
//!
//! Supported formats: ZIP, 7z and RAR (sniffed from magic bytes), and
//! gzip-compressed tarballs.

mod rar;
mod sevenz;
mod shared;
mod sniff;
mod targz;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use rar::RarExtractor;
pub use sevenz::SevenZipExtractor;
pub use shared::resolve;
pub use sniff::{ContainerFormat, SevenZipOrRarExtractor, sniff_container};
pub use targz::TarGzExtractor;
pub use zip::ZipExtractor;

use crate::error::{ExtractionError, Result};
use crate::types::{ArchiveKind, ExtractionJob};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::info;

/// Shared capability of every format-specific extractor
///
/// Implementations are synchronous and run on the blocking thread pool.
pub trait Extractor: Send + Sync {
    /// Write every member of `archive_path` under `dest_path`
    ///
    /// Creates intermediate directories as needed and returns the files that
    /// were materialized.
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Select the extractor for an archive kind
///
/// Returns `None` for [`ArchiveKind::Unsupported`].
pub fn extractor_for(kind: ArchiveKind) -> Option<&'static dyn Extractor> {
    match kind {
        ArchiveKind::Zip => Some(&ZipExtractor),
        ArchiveKind::SevenZipOrRar => Some(&SevenZipOrRarExtractor),
        ArchiveKind::TarGz => Some(&TarGzExtractor),
        ArchiveKind::Unsupported => None,
    }
}

/// Run the extractor for a job on the blocking thread pool
///
/// # Example
/// ```no_run
/// use auto_extract::extraction::{extract_archive, resolve};
/// use auto_extract::types::ExtractionJob;
/// use std::path::PathBuf;
///
/// # async fn example() -> auto_extract::error::Result<()> {
/// let source_path = PathBuf::from("/home/me/Downloads/movie.zip");
/// let job = ExtractionJob {
///     kind: resolve(&source_path),
///     destination_dir: PathBuf::from("/home/me/Downloads/movie"),
///     source_path,
/// };
/// let files = extract_archive(&job).await?;
/// println!("Extracted {} files", files.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_archive(job: &ExtractionJob) -> Result<Vec<PathBuf>> {
    let extractor = extractor_for(job.kind).ok_or_else(|| ExtractionError::UnsupportedArchive {
        path: job.source_path.clone(),
    })?;

    info!(
        archive = ?job.source_path,
        destination = ?job.destination_dir,
        extractor = extractor.name(),
        "dispatching extraction"
    );

    let archive_path = job.source_path.clone();
    let dest_path = job.destination_dir.clone();

    spawn_blocking(move || extractor.extract(&archive_path, &dest_path))
        .await
        .map_err(|e| ExtractionError::ExtractionFailed {
            archive: job.source_path.clone(),
            reason: format!("extraction task panicked: {}", e),
        })?
}
