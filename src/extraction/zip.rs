use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::Extractor;
use super::shared::{extraction_failed, io_failure};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(?archive_path, entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)
                .map_err(|e| io_failure("failed to create directory", e))?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_failure("failed to create parent directories", e))?;
        }

        let mut outfile = std::fs::File::create(&file_path)
            .map_err(|e| io_failure("failed to create output file", e))?;

        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| extraction_failed(archive_path, format!("failed to extract file: {}", e)))?;

        Ok(Some(file_path))
    }
}

impl Extractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        std::fs::create_dir_all(dest_path)
            .map_err(|e| io_failure("failed to create destination", e))?;

        let file = std::fs::File::open(archive_path)
            .map_err(|e| io_failure("failed to open ZIP archive", e))?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            extraction_failed(archive_path, format!("failed to read ZIP archive: {}", e))
        })?;

        let mut extracted_files = Vec::new();

        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|e| {
                extraction_failed(archive_path, format!("failed to read ZIP entry: {}", e))
            })?;

            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }

    fn name(&self) -> &'static str {
        "zip"
    }
}
