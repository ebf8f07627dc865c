use crate::error::Result;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Extractor;
use super::shared::{extraction_failed, io_failure, sanitize_entry_path};

/// Archive extractor for 7z files
///
/// Entry names are rebuilt from their normal components before anything is
/// written, so `..` and absolute names cannot leave the destination.
pub struct SevenZipExtractor;

impl SevenZipExtractor {
    /// Write one entry under `dest_path`, returning the file written (if any)
    fn write_entry(
        entry: &sevenz_rust::SevenZArchiveEntry,
        reader: &mut dyn Read,
        dest_path: &Path,
    ) -> std::result::Result<Option<PathBuf>, sevenz_rust::Error> {
        let sanitized = sanitize_entry_path(Path::new(entry.name()));
        if sanitized.as_os_str().is_empty() {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            // keep the shared block stream aligned for the next entry
            std::io::copy(reader, &mut std::io::sink()).map_err(sevenz_rust::Error::io)?;
            return Ok(None);
        }

        let out_path = dest_path.join(&sanitized);
        if entry.is_directory() {
            std::fs::create_dir_all(&out_path).map_err(sevenz_rust::Error::io)?;
            return Ok(None);
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(sevenz_rust::Error::io)?;
        }
        let file = std::fs::File::create(&out_path).map_err(sevenz_rust::Error::io)?;
        let mut writer = BufWriter::new(file);
        std::io::copy(reader, &mut writer).map_err(sevenz_rust::Error::io)?;

        Ok(Some(out_path))
    }
}

impl Extractor for SevenZipExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting 7z extraction");

        std::fs::create_dir_all(dest_path)
            .map_err(|e| io_failure("failed to create destination", e))?;

        let mut extracted_files = Vec::new();

        sevenz_rust::decompress_file_with_extract_fn(archive_path, dest_path, |entry, reader, _| {
            if let Some(written) = Self::write_entry(entry, reader, dest_path)? {
                extracted_files.push(written);
            }
            Ok(true)
        })
        .map_err(|e| {
            extraction_failed(archive_path, format!("failed to extract 7z archive: {}", e))
        })?;

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "7z extraction successful"
        );
        Ok(extracted_files)
    }

    fn name(&self) -> &'static str {
        "7z"
    }
}
