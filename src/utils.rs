//! Utility functions for directory and file housekeeping

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Create a directory (and its parents) if it does not exist
///
/// An existing directory is success and its contents are left untouched. Only the
/// "already exists" failure is tolerated, and only when the existing entry is a
/// directory; every other failure (permission denied, disk full, a regular file in
/// the way) is returned as [`Error::Io`].
///
/// # Examples
///
/// ```
/// use research_dl::utils::ensure_dir_exists;
///
/// # async fn example() -> research_dl::error::Result<()> {
/// let dir = std::env::temp_dir().join("research-dl-doc");
/// ensure_dir_exists(&dir).await?;
/// ensure_dir_exists(&dir).await?; // second call is a no-op
/// # Ok(())
/// # }
/// ```
pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
    match tokio::fs::create_dir_all(path).await {
        Ok(()) => {
            debug!(?path, "directory ready");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create directory '{}': {}", path.display(), e),
        ))),
    }
}

/// Blocking counterpart of [`ensure_dir_exists`] for use inside extraction tasks
pub(crate) fn ensure_dir_exists_blocking(path: &Path) -> Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create directory '{}': {}", path.display(), e),
        ))),
    }
}

/// Remove a file, logging instead of failing
///
/// Returns `true` if the file was removed. A file that is already gone counts as
/// not removed but is not worth a warning.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(?path, "removed file");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "file already absent");
            false
        }
        Err(e) => {
            warn!(?path, error = %e, "failed to remove file");
            false
        }
    }
}

/// Last path segment of a directory as a displayable string
///
/// Falls back to the full path when the path has no final component (e.g. `/`).
pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
