//! # research-dl
//!
//! Batch downloader for clinical research trial result archives.
//!
//! Reads search phrases from a text file (one per line), downloads the registry's
//! bulk result archive for each phrase, unpacks it under the downloads directory,
//! and reports where every result set landed.
//!
//! ```text
//! downloads/
//!   diabetes_treatment_research/   # one directory per criterion
//!     NCT00000102.xml
//!     ...
//! ```
//!
//! Criteria are processed one at a time in file order. By default the first failure
//! stops the run; see [`config::FailurePolicy`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use research_dl::{Config, Pipeline};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Config::default())?;
//!     let report = pipeline
//!         .run(Path::new("params.txt"), Path::new("downloads"))
//!         .await?;
//!
//!     for result in &report.results {
//!         println!("{} -> {}", result.criterion, result.directory);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Search criteria loading
pub mod criteria;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Registry archive download
pub mod fetch;
/// Logging setup
pub mod logging;
/// Sequential batch pipeline
pub mod pipeline;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, FailurePolicy, UnsafeEntryPolicy};
pub use criteria::Criterion;
pub use error::{Error, ExtractionError, Result, ToExitCode};
pub use extraction::ExtractedArchive;
pub use fetch::ArchiveFetcher;
pub use pipeline::Pipeline;
pub use types::{DownloadJob, Event, FailedJob, ResultSet, RunReport, Stage};
