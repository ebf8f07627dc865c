use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Extractor;
use super::shared::{extraction_failed, io_failure, sanitize_entry_path};

/// Archive extractor for RAR files
pub struct RarExtractor;

impl RarExtractor {
    /// Convert an unrar error to our error type
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        extraction_failed(archive_path, e.to_string())
    }
}

impl Extractor for RarExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        std::fs::create_dir_all(dest_path)
            .map_err(|e| io_failure("failed to create destination", e))?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        // Walk entries through the header/file cursor state machine
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();
            let sanitized = sanitize_entry_path(&header.filename);

            if sanitized.as_os_str().is_empty() {
                warn!(?archive_path, entry = ?header.filename, "skipping entry with unsafe path");
                at_header = at_file.skip().map_err(|e| {
                    extraction_failed(archive_path, format!("failed to skip unsafe entry: {}", e))
                })?;
                continue;
            }

            let file_path = dest_path.join(&sanitized);

            if header.is_directory() {
                std::fs::create_dir_all(&file_path)
                    .map_err(|e| io_failure("failed to create directory", e))?;
                at_header = at_file.skip().map_err(|e| {
                    extraction_failed(archive_path, format!("failed to skip directory: {}", e))
                })?;
            } else {
                if let Some(parent) = file_path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| io_failure("failed to create parent directories", e))?;
                }
                at_header = at_file
                    .extract_to(&file_path)
                    .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "RAR extraction successful"
        );

        Ok(extracted_files)
    }

    fn name(&self) -> &'static str {
        "rar"
    }
}
