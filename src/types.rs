//! Core types for research-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::criteria::Criterion;

/// Lifecycle stage of a single download job
///
/// Jobs move strictly forward: `Pending → Downloading → Downloaded → Extracting →
/// Extracted → CleanedUp`. A failure in any stage moves the job to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Queued, nothing done yet
    Pending,
    /// Streaming the archive from the registry
    Downloading,
    /// Archive fully written to disk
    Downloaded,
    /// Unpacking the archive
    Extracting,
    /// Archive contents written to the extraction directory
    Extracted,
    /// Temporary archive removed
    CleanedUp,
    /// Job aborted
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Pending => "pending",
            Stage::Downloading => "downloading",
            Stage::Downloaded => "downloaded",
            Stage::Extracting => "extracting",
            Stage::Extracted => "extracted",
            Stage::CleanedUp => "cleaning up",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One criterion's unit of work
///
/// Created by the pipeline per criterion and dropped once the archive is cleaned up.
#[derive(Clone, Debug)]
pub struct DownloadJob {
    /// The criterion being fetched
    pub criterion: Criterion,
    /// Registry download URL
    pub url: String,
    /// Where the archive is streamed to
    pub archive_path: PathBuf,
    /// Where the archive is unpacked
    pub extraction_dir: PathBuf,
    /// Current stage
    pub stage: Stage,
}

impl DownloadJob {
    /// Advance to the next stage
    pub(crate) fn advance(&mut self, stage: Stage) {
        tracing::debug!(
            criterion = %self.criterion,
            from = %self.stage,
            to = %stage,
            "job stage transition"
        );
        self.stage = stage;
    }
}

/// A criterion paired with the directory its results were extracted to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Encoded criterion (e.g. `diabetes+treatment`)
    pub criterion: String,
    /// Extraction directory name (e.g. `diabetes_treatment_research`)
    pub directory: String,
    /// Full path of the extraction directory
    pub path: PathBuf,
    /// Number of files written during extraction
    pub file_count: usize,
    /// When the result set finished extracting
    pub completed_at: DateTime<Utc>,
}

/// A criterion that failed under the `continue` failure policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedJob {
    /// Encoded criterion
    pub criterion: String,
    /// Stage the job was in when it failed
    pub stage: Stage,
    /// Error description
    pub error: String,
}

/// Outcome of a full run, in criterion order
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Successful result sets, in processing order
    pub results: Vec<ResultSet>,
    /// Failed criteria (always empty under the `abort` policy)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedJob>,
}

impl RunReport {
    /// Names of all extraction directories, in processing order
    pub fn directories(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.directory.as_str()).collect()
    }

    /// Whether every criterion succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Event emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Criterion accepted for processing
    Queued {
        /// Encoded criterion
        criterion: String,
        /// Position in the criteria file (0-based, blank lines excluded)
        index: usize,
    },

    /// Archive download started
    Downloading {
        /// Encoded criterion
        criterion: String,
        /// Registry URL
        url: String,
    },

    /// Archive written to disk
    Downloaded {
        /// Encoded criterion
        criterion: String,
        /// Archive path
        archive: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// Extraction started
    Extracting {
        /// Encoded criterion
        criterion: String,
        /// Archive path
        archive: PathBuf,
    },

    /// Extraction finished
    Extracted {
        /// Encoded criterion
        criterion: String,
        /// Extraction directory name
        directory: String,
        /// Number of files extracted
        file_count: usize,
    },

    /// Temporary archive removed (or removal attempted)
    CleanedUp {
        /// Encoded criterion
        criterion: String,
        /// Whether the archive file was actually removed
        removed: bool,
    },

    /// Job failed
    Failed {
        /// Encoded criterion
        criterion: String,
        /// Stage the job failed in
        stage: Stage,
        /// Error message
        error: String,
    },

    /// All criteria processed
    RunComplete {
        /// Number of successful result sets
        succeeded: usize,
        /// Number of failed criteria
        failed: usize,
    },
}
