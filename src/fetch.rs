//! Registry archive download
//!
//! Builds the registry's bulk download URL for a criterion and streams the response
//! body to `<downloads>/<criterion stem><suffix>.zip` without holding it in memory.

use crate::config::{DownloadConfig, RegistryConfig};
use crate::criteria::Criterion;
use crate::error::{Error, Result};
use crate::utils::remove_file_best_effort;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Extension of downloaded archives
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Streams result archives from the registry to disk
#[derive(Clone, Debug)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
    registry: RegistryConfig,
    chunk_size: usize,
    archive_suffix: String,
}

impl ArchiveFetcher {
    /// Create a fetcher for the given registry and download settings
    pub fn new(registry: &RegistryConfig, download: &DownloadConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = registry.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            registry: registry.clone(),
            chunk_size: download.chunk_size,
            archive_suffix: download.archive_suffix.clone(),
        })
    }

    /// Registry download URL for a criterion
    ///
    /// The encoded term is inserted verbatim; it is already URL-safe.
    pub fn download_url(&self, criterion: &Criterion) -> String {
        let r = &self.registry;
        format!(
            "{}{}?down_flds={}&down_fmt={}&term={}&show_down=Y&down_typ={}&down_stds={}",
            r.base_url.trim_end_matches('/'),
            r.download_path,
            r.fields,
            r.format,
            criterion.encoded(),
            r.result_type,
            r.studies,
        )
    }

    /// Local path the archive for `criterion` is written to
    pub fn archive_path(&self, criterion: &Criterion, downloads_dir: &Path) -> PathBuf {
        downloads_dir.join(format!(
            "{}{}.{}",
            criterion.file_stem(),
            self.archive_suffix,
            ARCHIVE_EXTENSION
        ))
    }

    /// Download the archive for `criterion` into `downloads_dir`
    ///
    /// Returns the archive path and the number of bytes written. An existing file at
    /// that path is overwritten. A partially written archive is removed on failure.
    pub async fn fetch(&self, criterion: &Criterion, downloads_dir: &Path) -> Result<(PathBuf, u64)> {
        let url = self.download_url(criterion);
        let destination = self.archive_path(criterion, downloads_dir);
        self.fetch_to(&url, &destination).await.map(|bytes| (destination, bytes))
    }

    /// Stream `url` into `destination`
    pub async fn fetch_to(&self, url: &str, destination: &Path) -> Result<u64> {
        info!(%url, ?destination, "downloading archive");

        let response = self.client.get(url).send().await?;

        // Reject error pages before anything touches the disk
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = self.write_body(response, destination).await?;
        info!(?destination, bytes, "archive saved");
        Ok(bytes)
    }

    /// Create `destination` and stream the body into it
    ///
    /// Once the file exists, any later failure removes it again.
    async fn write_body(&self, response: reqwest::Response, destination: &Path) -> Result<u64> {
        // Open the archive file; a failure here leaves any existing file alone
        let file = tokio::fs::File::create(destination).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "could not open '{}' to save downloaded research: {}",
                    destination.display(),
                    e
                ),
            ))
        })?;

        match self.stream_body(response, file, destination).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                warn!(?destination, error = %e, "download interrupted, discarding partial archive");
                remove_file_best_effort(destination).await;
                Err(e)
            }
        }
    }

    async fn stream_body(
        &self,
        mut response: reqwest::Response,
        file: tokio::fs::File,
        destination: &Path,
    ) -> Result<u64> {
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);

        // Write each chunk as it arrives
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await.map_err(|e| write_error(destination, e))?;
            written += chunk.len() as u64;
            debug!(bytes = written, "archive chunk written");
        }

        writer.flush().await.map_err(|e| write_error(destination, e))?;
        Ok(written)
    }
}

fn write_error(destination: &Path, e: std::io::Error) -> Error {
    Error::Io(std::io::Error::new(
        e.kind(),
        format!(
            "could not write downloaded research to '{}': {}",
            destination.display(),
            e
        ),
    ))
}
