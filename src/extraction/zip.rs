use crate::config::UnsafeEntryPolicy;
use crate::error::{Error, ExtractionError, Result};
use crate::utils::ensure_dir_exists_blocking;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract every entry of `archive_path` into `dest_path`
    ///
    /// Creates `dest_path` if needed, keeps the archive's relative paths, and returns
    /// the files written. Entries whose names would land outside `dest_path` are
    /// handled according to `policy`. Under `Reject` the whole archive is refused
    /// before anything is written.
    pub fn extract(
        archive_path: &Path,
        dest_path: &Path,
        policy: UnsafeEntryPolicy,
    ) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, ?policy, "attempting ZIP extraction");

        // Open the archive
        let file = std::fs::File::open(archive_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to open ZIP archive '{}': {}",
                    archive_path.display(),
                    e
                ),
            ))
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(archive_path, e))?;

        // Nothing is written until every entry name has been checked
        if policy == UnsafeEntryPolicy::Reject {
            Self::check_entry_names(&mut archive, archive_path)?;
        }

        // Create destination directory if it doesn't exist
        ensure_dir_exists_blocking(dest_path)?;

        // Extract each file
        let mut extracted_files = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| corrupt(archive_path, e))?;

            if let Some(file_path) = Self::extract_entry(entry, dest_path, archive_path, policy)? {
                extracted_files.push(file_path);
            }
        }

        debug!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }

    /// Fail with [`ExtractionError::UnsafeEntry`] on the first entry that would escape
    fn check_entry_names(
        archive: &mut zip::ZipArchive<std::fs::File>,
        archive_path: &Path,
    ) -> Result<()> {
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| corrupt(archive_path, e))?;
            if entry.enclosed_name().is_none() {
                return Err(unsafe_entry(archive_path, entry.name()));
            }
        }
        Ok(())
    }

    /// Write a single entry to disk, creating parent directories as needed
    fn extract_entry(
        mut entry: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
        policy: UnsafeEntryPolicy,
    ) -> Result<Option<PathBuf>> {
        // Get the file path
        let file_path = match entry.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                return match policy {
                    UnsafeEntryPolicy::Reject => Err(unsafe_entry(archive_path, entry.name())),
                    UnsafeEntryPolicy::Skip => {
                        warn!(?archive_path, entry = %entry.name(), "skipping entry with unsafe path");
                        Ok(None)
                    }
                };
            }
        };

        if entry.is_dir() {
            ensure_dir_exists_blocking(&file_path)?;
            return Ok(None);
        }

        // Create parent directories if needed
        if let Some(parent) = file_path.parent() {
            ensure_dir_exists_blocking(parent)?;
        }

        let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create '{}': {}", file_path.display(), e),
            ))
        })?;

        // Extract file
        std::io::copy(&mut entry, &mut outfile).map_err(|e| match e.kind() {
            // Decompression and checksum failures surface as these kinds
            ErrorKind::InvalidData | ErrorKind::UnexpectedEof => {
                Error::Extraction(ExtractionError::Corrupt {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to decode entry '{}': {}", entry.name(), e),
                })
            }
            _ => Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write '{}': {}", file_path.display(), e),
            )),
        })?;

        Ok(Some(file_path))
    }
}

fn unsafe_entry(archive_path: &Path, name: &str) -> Error {
    Error::Extraction(ExtractionError::UnsafeEntry {
        archive: archive_path.to_path_buf(),
        entry: name.to_string(),
    })
}

fn corrupt(archive_path: &Path, e: zip::result::ZipError) -> Error {
    Error::Extraction(ExtractionError::Corrupt {
        archive: archive_path.to_path_buf(),
        reason: e.to_string(),
    })
}
