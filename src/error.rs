//! Error types for auto-extract
//!
//! This module provides the error hierarchy used throughout the crate:
//! - A top-level [`Error`] for watcher, configuration and pipeline failures
//! - [`ExtractionError`] for failures scoped to a single archive
//! - The [`Result`] alias used by every fallible operation

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for auto-extract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for auto-extract
///
/// Each variant carries enough context to name the offending file or setting
/// in a log line or a failure notification.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "quiet_period")
        key: Option<String>,
    },

    /// Extraction error (unsupported format, corrupt archive, move failure, etc.)
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The stable file could not be stat'ed (vanished or inaccessible)
    #[error("source file {path} is unavailable: {source}")]
    SourceUnavailable {
        /// The path that was reported stable
        path: PathBuf,
        /// The underlying stat failure
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Folder watching error
    #[error("watch error: {0}")]
    Watch(String),

    /// Desktop notification could not be delivered
    #[error("notification error: {0}")]
    Notification(String),
}

impl From<notify::Error> for Error {
    fn from(e: notify::Error) -> Self {
        Error::Watch(e.to_string())
    }
}

/// Errors scoped to a single extraction job
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The archive could not be read or materialized
    #[error("extraction failed for {archive}: {reason}")]
    ExtractionFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// Why extraction failed
        reason: String,
    },

    /// No extractor handles this file
    #[error("unsupported archive type: {path}")]
    UnsupportedArchive {
        /// The file that was offered for extraction
        path: PathBuf,
    },

    /// A path could not be split into directory and file name
    #[error("invalid path: {path}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
    },

    /// The destination directory could not be created
    #[error("failed to create destination {path}: {reason}")]
    DestinationFailed {
        /// The destination directory
        path: PathBuf,
        /// Why creation failed
        reason: String,
    },

    /// The source archive could not be moved into the destination directory
    #[error("failed to move {from} to {to}: {reason}")]
    MoveFailed {
        /// Original archive location
        from: PathBuf,
        /// Intended location inside the destination directory
        to: PathBuf,
        /// Why the move failed
        reason: String,
    },
}
