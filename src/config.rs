//! Configuration types for research-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Registry endpoint and query settings
///
/// The defaults reproduce the clinicaltrials.gov bulk download request: plain-text
/// listing, all shown fields, all standard fields, results only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host including scheme (default: "https://clinicaltrials.gov")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Download path on the registry (default: "/ct2/results/download")
    #[serde(default = "default_download_path")]
    pub download_path: String,

    /// Value of the `down_flds` parameter (default: "shown")
    #[serde(default = "default_fields")]
    pub fields: String,

    /// Value of the `down_fmt` parameter (default: "plain")
    #[serde(default = "default_format")]
    pub format: String,

    /// Value of the `down_typ` parameter (default: "results")
    #[serde(default = "default_result_type")]
    pub result_type: String,

    /// Value of the `down_stds` parameter (default: "all")
    #[serde(default = "default_studies")]
    pub studies: String,

    /// Whole-request timeout in seconds (None = wait indefinitely)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            download_path: default_download_path(),
            fields: default_fields(),
            format: default_format(),
            result_type: default_result_type(),
            studies: default_studies(),
            timeout: None,
        }
    }
}

/// Download behavior (directories, buffering, naming)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Download directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Write buffer size in bytes for streamed archives (default: 1024)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Suffix appended to the criterion file stem (default: "_research")
    #[serde(default = "default_archive_suffix")]
    pub archive_suffix: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            chunk_size: default_chunk_size(),
            archive_suffix: default_archive_suffix(),
        }
    }
}

/// What to do with archive entries whose paths escape the extraction directory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeEntryPolicy {
    /// Fail the extraction (default)
    #[default]
    Reject,
    /// Log a warning and leave the entry out
    Skip,
}

/// Extraction configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Handling of `../` and absolute entry names (default: reject)
    #[serde(default)]
    pub unsafe_entries: UnsafeEntryPolicy,
}

/// Cleanup of downloaded archives
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Delete the archive after a successful extraction (default: true)
    #[serde(default = "default_true")]
    pub delete_archives: bool,

    /// Also delete the archive when extraction fails (default: false)
    #[serde(default)]
    pub remove_failed_archives: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            delete_archives: true,
            remove_failed_archives: false,
        }
    }
}

/// How a failing criterion affects the rest of the run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error (default)
    #[default]
    Abort,
    /// Record the failure and move on to the next criterion
    Continue,
}

/// Main configuration for the research pipeline
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry endpoint settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Archive cleanup settings
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Failure handling between criteria
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                "config_file",
                format!("cannot read config file '{}': {}", path.display(), e),
            )
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.registry.base_url).map_err(|e| {
            Error::config(
                "registry.base_url",
                format!("invalid registry URL '{}': {}", self.registry.base_url, e),
            )
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(
                "registry.base_url",
                format!("registry URL must use http or https, got '{}'", base.scheme()),
            ));
        }

        if !self.registry.download_path.starts_with('/') {
            return Err(Error::config(
                "registry.download_path",
                "download path must start with '/'",
            ));
        }

        if self.download.chunk_size == 0 {
            return Err(Error::config(
                "download.chunk_size",
                "chunk size must be greater than zero",
            ));
        }

        if self.download.archive_suffix.contains(['/', '\\']) {
            return Err(Error::config(
                "download.archive_suffix",
                "archive suffix must not contain path separators",
            ));
        }

        Ok(())
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://clinicaltrials.gov".to_string()
}

fn default_download_path() -> String {
    "/ct2/results/download".to_string()
}

fn default_fields() -> String {
    "shown".to_string()
}

fn default_format() -> String {
    "plain".to_string()
}

fn default_result_type() -> String {
    "results".to_string()
}

fn default_studies() -> String {
    "all".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_chunk_size() -> usize {
    1024
}

fn default_archive_suffix() -> String {
    "_research".to_string()
}

fn default_true() -> bool {
    true
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
