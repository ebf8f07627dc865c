//! Core types and events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of a raw filesystem notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventKind {
    /// A file appeared in the watched directory (including renames into it)
    Created,
    /// A file's content or metadata changed
    Modified,
    /// Anything else (removal, rename away, access); never qualifies
    Other,
}

/// A single notification from the watch primitive
///
/// Consumed once by the coalescer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Path the notification refers to
    pub path: PathBuf,
    /// What happened to it
    pub kind: RawEventKind,
}

impl RawEvent {
    /// Build a `Created` event
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: RawEventKind::Created,
        }
    }

    /// Build a `Modified` event
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: RawEventKind::Modified,
        }
    }

    /// Whether the event kind can ever start or reset a quiet period
    pub fn is_relevant(&self) -> bool {
        matches!(self.kind, RawEventKind::Created | RawEventKind::Modified)
    }
}

/// Archive format detected by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// ZIP archive (.zip)
    Zip,
    /// 7-Zip or RAR archive (.7z, .rar)
    SevenZipOrRar,
    /// Gzip-compressed tarball (.tar.gz)
    TarGz,
    /// Anything this system does not extract
    Unsupported,
}

impl ArchiveKind {
    /// Whether an extractor exists for this kind
    pub fn is_supported(self) -> bool {
        !matches!(self, ArchiveKind::Unsupported)
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::SevenZipOrRar => "7z/rar",
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// A file whose quiet period elapsed without further events
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableFile {
    /// Logical name the events were coalesced under
    pub logical_name: PathBuf,
    /// Path carried by the last event seen for the logical name
    pub path: PathBuf,
}

/// One archive being extracted
///
/// Only built by the pipeline once the source is known to be an existing,
/// non-directory file with a supported [`ArchiveKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionJob {
    /// Archive being extracted
    pub source_path: PathBuf,
    /// Sibling directory the archive is materialized into
    pub destination_dir: PathBuf,
    /// Format of the archive
    pub kind: ArchiveKind,
}

/// Event emitted during the extraction lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A file stopped changing for a full quiet period
    FileStable {
        /// Path reported stable
        path: PathBuf,
    },

    /// Extraction of an archive started
    ExtractionStarted {
        /// Archive being extracted
        source: PathBuf,
        /// Directory receiving the contents
        destination: PathBuf,
        /// Archive format
        kind: ArchiveKind,
    },

    /// Archive extracted and moved into its destination
    ExtractionComplete {
        /// Original archive location
        source: PathBuf,
        /// Directory now holding the contents and the archive
        destination: PathBuf,
        /// Number of files materialized
        files: usize,
    },

    /// Extraction job failed; the watcher keeps running
    ExtractionFailed {
        /// File the job was working on
        source: PathBuf,
        /// Error message
        error: String,
    },
}
