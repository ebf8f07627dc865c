use crate::classify::effective_extension;
use crate::error::{Error, ExtractionError};
use crate::types::ArchiveKind;
use std::path::{Component, Path, PathBuf};

/// Resolve the archive kind of a path from its effective extension
///
/// Matching is ASCII case-insensitive and `.tar.gz` is one extension.
/// Pure and total: anything unrecognized is [`ArchiveKind::Unsupported`].
pub fn resolve(path: &Path) -> ArchiveKind {
    let Some(ext) = effective_extension(path) else {
        return ArchiveKind::Unsupported;
    };

    match ext.to_ascii_lowercase().as_str() {
        "zip" => ArchiveKind::Zip,
        "7z" | "rar" => ArchiveKind::SevenZipOrRar,
        "tar.gz" => ArchiveKind::TarGz,
        _ => ArchiveKind::Unsupported,
    }
}

/// Wrap a format-level failure for `archive`
pub(crate) fn extraction_failed(archive: &Path, reason: impl Into<String>) -> Error {
    Error::Extraction(ExtractionError::ExtractionFailed {
        archive: archive.to_path_buf(),
        reason: reason.into(),
    })
}

/// Wrap a filesystem failure with a short description of what was attempted
pub(crate) fn io_failure(what: &str, e: std::io::Error) -> Error {
    Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", what, e)))
}

/// Rebuild an archive entry name from its normal components only
///
/// Drops `..`, `.`, root and prefix components; an empty result means the
/// entry has no safe location under the destination.
pub(crate) fn sanitize_entry_path(filename: &Path) -> PathBuf {
    filename
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
