//! Container sniffing for the shared 7z/RAR archive kind

use crate::error::Result;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Extractor;
use super::rar::RarExtractor;
use super::sevenz::SevenZipExtractor;

const SEVEN_ZIP_MAGIC: &[u8] = &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";

/// Concrete container behind [`crate::types::ArchiveKind::SevenZipOrRar`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    /// 7-Zip container
    SevenZip,
    /// RAR container (v4 or v5)
    Rar,
}

/// Identify a 7z/RAR container
///
/// Magic bytes win over the extension, so mislabelled downloads still reach
/// the right decoder. Falls back to the extension when the header matches
/// neither format or cannot be read.
pub fn sniff_container(path: &Path) -> Option<ContainerFormat> {
    let mut header = [0u8; 8];
    let read = std::fs::File::open(path)
        .and_then(|mut file| file.read(&mut header))
        .unwrap_or(0);

    if header[..read].starts_with(SEVEN_ZIP_MAGIC) {
        return Some(ContainerFormat::SevenZip);
    }
    if header[..read].starts_with(RAR_MAGIC) {
        return Some(ContainerFormat::Rar);
    }

    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("7z") {
        Some(ContainerFormat::SevenZip)
    } else if ext.eq_ignore_ascii_case("rar") {
        Some(ContainerFormat::Rar)
    } else {
        None
    }
}

/// Extractor for the 7z/RAR kind, delegating per sniffed container
pub struct SevenZipOrRarExtractor;

impl Extractor for SevenZipOrRarExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        let format = sniff_container(archive_path).ok_or_else(|| {
            crate::error::ExtractionError::UnsupportedArchive {
                path: archive_path.to_path_buf(),
            }
        })?;
        debug!(?archive_path, ?format, "sniffed container format");

        match format {
            ContainerFormat::SevenZip => SevenZipExtractor.extract(archive_path, dest_path),
            ContainerFormat::Rar => RarExtractor.extract(archive_path, dest_path),
        }
    }

    fn name(&self) -> &'static str {
        "7z/rar"
    }
}
