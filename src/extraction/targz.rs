use crate::error::Result;
use flate2::read::GzDecoder;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Extractor;
use super::shared::{extraction_failed, io_failure};

/// Archive extractor for gzip-compressed tarballs
///
/// Only regular files and directories are materialized; links and special
/// entries are skipped.
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting tar.gz extraction");

        std::fs::create_dir_all(dest_path)
            .map_err(|e| io_failure("failed to create destination", e))?;

        let file = std::fs::File::open(archive_path)
            .map_err(|e| io_failure("failed to open tar.gz archive", e))?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));

        let entries = archive.entries().map_err(|e| {
            extraction_failed(archive_path, format!("failed to read tar.gz archive: {}", e))
        })?;

        let mut extracted_files = Vec::new();

        for entry in entries {
            let mut entry = entry.map_err(|e| {
                extraction_failed(archive_path, format!("failed to read tar entry: {}", e))
            })?;

            let entry_type = entry.header().entry_type();
            if !entry_type.is_file() && !entry_type.is_dir() {
                debug!(?archive_path, ?entry_type, "skipping non-regular tar entry");
                continue;
            }

            let entry_path = entry
                .path()
                .map_err(|e| extraction_failed(archive_path, format!("invalid entry path: {}", e)))?
                .into_owned();

            // unpack_in refuses entries that would land outside dest_path
            let unpacked = entry.unpack_in(dest_path).map_err(|e| {
                extraction_failed(
                    archive_path,
                    format!("failed to extract {}: {}", entry_path.display(), e),
                )
            })?;

            if !unpacked {
                warn!(?archive_path, ?entry_path, "skipping entry with unsafe path");
                continue;
            }

            if entry_type.is_file() {
                extracted_files.push(dest_path.join(&entry_path));
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "tar.gz extraction successful"
        );

        Ok(extracted_files)
    }

    fn name(&self) -> &'static str {
        "tar.gz"
    }
}
