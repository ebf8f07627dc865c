//! Suffix classification for download-in-progress artifacts
//!
//! Browsers and download managers stream into sidecar files (`.part`,
//! `.tmp`, `.opdownload`) before renaming them into place. This module decides
//! which paths are worth waiting on and which name their events coalesce under.

use std::path::{Path, PathBuf};

/// Suffixes that mark a file as still being written
pub const IN_PROGRESS_SUFFIXES: &[&str] = &[".tmp", ".opdownload", ".part"];

/// Suffix used by download managers that rename through a random token
const PART_SUFFIX: &str = ".part";

/// Outcome of classifying a raw event path
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The path never starts or resets a quiet period
    Ignore,
    /// The path qualifies; events coalesce under the contained logical name
    Qualify(PathBuf),
}

/// Check whether a path still carries an in-progress suffix
pub fn has_in_progress_suffix(path: &Path) -> bool {
    let s = path.to_string_lossy();
    IN_PROGRESS_SUFFIXES.iter().any(|suffix| s.ends_with(suffix))
}

/// Classify a raw event path
///
/// `.tmp` and `.opdownload` are always ignored. A `.part` file qualifies only
/// when it matches `base.token.part` or `base.token.ext.part`, in which case
/// the token is dropped: `report.8f3ac1.part` -> `report`,
/// `archive.a1b2c3.zip.part` -> `archive.zip`. Every other path qualifies
/// under its own name.
pub fn classify(path: &Path) -> Classification {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return Classification::Ignore;
    };

    if name.ends_with(".tmp") || name.ends_with(".opdownload") {
        return Classification::Ignore;
    }

    if name.ends_with(PART_SUFFIX) {
        return match unwrap_part_name(&name) {
            Some(logical) => Classification::Qualify(path.with_file_name(logical)),
            None => Classification::Ignore,
        };
    }

    Classification::Qualify(path.to_path_buf())
}

/// Strip the random token and `.part` suffix from a sidecar file name
fn unwrap_part_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(PART_SUFFIX)?;
    let (base, rest) = stem.split_once('.')?;
    if base.is_empty() {
        return None;
    }

    let segments: Vec<&str> = rest.split('.').collect();
    match segments.as_slice() {
        [token] if !token.is_empty() => Some(base.to_string()),
        [token, ext] if !token.is_empty() && !ext.is_empty() => Some(format!("{base}.{ext}")),
        _ => None,
    }
}

/// Effective extension of a path, without the leading dot
///
/// A trailing extension preceded by `.tar` is treated as one unit, so
/// `backup.tar.gz` yields `tar.gz` rather than `gz`. The extension is
/// returned as written in the file name.
pub fn effective_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    let stem = Path::new(path.file_stem()?);

    match stem.extension().and_then(|e| e.to_str()) {
        Some(inner) if inner.eq_ignore_ascii_case("tar") => Some(format!("{inner}.{ext}")),
        _ => Some(ext.to_string()),
    }
}

/// Sibling directory an archive extracts into
///
/// Strips the effective extension from the file name:
/// `/downloads/movie.zip` -> `/downloads/movie`.
pub fn destination_dir(path: &Path) -> Option<PathBuf> {
    let ext = effective_extension(path)?;
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(ext.as_str())?.strip_suffix('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(stem))
}
