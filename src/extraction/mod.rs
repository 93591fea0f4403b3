//! Archive extraction
//!
//! Unpacks a downloaded `.zip` result archive into a sibling directory named after
//! the archive without its extension (`cancer_research.zip` → `cancer_research/`).

mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use zip::ZipExtractor;

use crate::config::UnsafeEntryPolicy;
use crate::error::{Error, ExtractionError, Result};
use crate::fetch::ARCHIVE_EXTENSION;
use crate::utils::dir_name;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::info;

/// Result of unpacking one archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedArchive {
    /// Extraction directory
    pub directory: PathBuf,
    /// Last path segment of [`directory`](Self::directory)
    pub name: String,
    /// Files written, in archive order
    pub files: Vec<PathBuf>,
}

/// Extraction directory for an archive: the archive path without its `.zip` extension
///
/// The extension match is case-insensitive. Any other path is rejected with
/// [`ExtractionError::InvalidPath`] rather than guessed at.
///
/// # Examples
///
/// ```
/// use research_dl::extraction::extraction_dir_for;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     extraction_dir_for(Path::new("downloads/cancer_research.zip")).unwrap(),
///     PathBuf::from("downloads/cancer_research"),
/// );
/// assert!(extraction_dir_for(Path::new("downloads/cancer_research.tar")).is_err());
/// ```
pub fn extraction_dir_for(archive_path: &Path) -> Result<PathBuf> {
    let has_zip_extension = archive_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION));

    if !has_zip_extension {
        return Err(Error::Extraction(ExtractionError::InvalidPath {
            path: archive_path.to_path_buf(),
            reason: format!("expected a .{} archive", ARCHIVE_EXTENSION),
        }));
    }

    Ok(archive_path.with_extension(""))
}

/// Extract `archive_path` into its extraction directory
///
/// The blocking ZIP work runs on the blocking thread pool; this future resolves only
/// once every entry has been written and the archive handle is closed.
pub async fn extract_archive(
    archive_path: &Path,
    policy: UnsafeEntryPolicy,
) -> Result<ExtractedArchive> {
    let directory = extraction_dir_for(archive_path)?;

    info!(?archive_path, ?directory, "extracting archive");

    let archive_owned = archive_path.to_path_buf();
    let dest_owned = directory.clone();
    let files = spawn_blocking(move || ZipExtractor::extract(&archive_owned, &dest_owned, policy))
        .await
        .map_err(|e| {
            Error::Extraction(ExtractionError::TaskFailed {
                archive: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
        })??;

    let name = dir_name(&directory);
    info!(
        ?archive_path,
        directory = %name,
        extracted_count = files.len(),
        "archive extracted"
    );

    Ok(ExtractedArchive {
        directory,
        name,
        files,
    })
}
