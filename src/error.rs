//! Error types for research-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (configuration, network, I/O, extraction)
//! - Per-criterion context (which criterion failed and in which stage)
//! - Process exit code mapping for the command line front-end

use crate::types::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for research-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for research-dl
///
/// Every failure is terminal for the criterion it occurred in. Nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing criteria file, invalid settings)
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message, including guidance on how to fix it
        message: String,
        /// The configuration key that caused the error (e.g., "criteria_file")
        key: Option<String>,
    },

    /// Transport-level failure talking to the registry
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Registry answered with a non-success HTTP status
    #[error("registry returned HTTP {status} for {url}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// Local disk read/write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive extraction failure
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Serialization error (config files, run reports)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A single criterion failed; wraps the underlying cause with context
    #[error("criterion \"{criterion}\" failed while {stage}: {source}")]
    Job {
        /// The encoded criterion being processed
        criterion: String,
        /// The stage the job was in when it failed
        stage: Stage,
        /// The underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Attach criterion and stage context to this error
    pub fn in_job(self, criterion: impl Into<String>, stage: Stage) -> Self {
        Error::Job {
            criterion: criterion.into(),
            stage,
            source: Box::new(self),
        }
    }

    /// Strip any job context and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::Job { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Archive could not be read (corrupt, truncated, not a ZIP)
    #[error("cannot read archive {archive}: {reason}")]
    Corrupt {
        /// The archive that failed to open or decode
        archive: PathBuf,
        /// The reason reading failed
        reason: String,
    },

    /// Archive path does not end in the expected `.zip` suffix
    #[error("invalid archive path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// Archive entry would be written outside the extraction directory
    #[error("archive {archive} contains unsafe entry {entry:?}")]
    UnsafeEntry {
        /// The archive holding the entry
        archive: PathBuf,
        /// The raw entry name as stored in the archive
        entry: String,
    },

    /// The blocking extraction task panicked or was cancelled
    #[error("extraction task for {archive} did not complete: {reason}")]
    TaskFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// Join error description
        reason: String,
    },
}

/// Map errors to process exit codes for the command line front-end
pub trait ToExitCode {
    /// Get the process exit code for this error
    fn exit_code(&self) -> u8;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        match self {
            Error::Config { .. } => 2,
            Error::Network(_) | Error::HttpStatus { .. } => 3,
            Error::Io(_) | Error::Serialization(_) => 4,
            Error::Extraction(_) => 5,
            Error::Job { source, .. } => source.exit_code(),
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) | Error::HttpStatus { .. } => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Extraction(ExtractionError::UnsafeEntry { .. }) => "unsafe_archive_entry",
            Error::Extraction(_) => "extraction_error",
            Error::Job { source, .. } => source.error_code(),
        }
    }
}
