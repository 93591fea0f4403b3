//! Sequential batch-fetch pipeline
//!
//! For every criterion, in file order: download the archive, extract it, remove the
//! archive, and record where the results landed. One criterion finishes completely
//! (including archive removal) before the next one starts downloading.

use crate::config::{Config, FailurePolicy};
use crate::criteria::{self, Criterion};
use crate::error::Result;
use crate::extraction::{extract_archive, extraction_dir_for};
use crate::fetch::ArchiveFetcher;
use crate::types::{DownloadJob, Event, FailedJob, ResultSet, RunReport, Stage};
use crate::utils::{ensure_dir_exists, remove_file_best_effort};
use chrono::Utc;
use std::path::Path;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Batch downloader for research result archives
///
/// Holds no per-run state: criteria go in as arguments and results come back in the
/// returned [`RunReport`].
pub struct Pipeline {
    config: Config,
    fetcher: ArchiveFetcher,
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline from validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = ArchiveFetcher::new(&config.registry, &config.download)?;
        let (event_tx, _rx) = broadcast::channel(1000);

        Ok(Self {
            config,
            fetcher,
            event_tx,
        })
    }

    /// Subscribe to progress events
    ///
    /// Events are only delivered to receivers that exist when they are emitted.
    ///
    /// ```no_run
    /// use research_dl::{Config, Pipeline};
    /// use std::path::Path;
    ///
    /// # async fn example() -> research_dl::Result<()> {
    /// let pipeline = Pipeline::new(Config::default())?;
    /// let mut events = pipeline.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         println!("{event:?}");
    ///     }
    /// });
    /// pipeline.run(Path::new("params.txt"), Path::new("downloads")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The fetcher used for downloads
    pub fn fetcher(&self) -> &ArchiveFetcher {
        &self.fetcher
    }

    /// Load criteria from `criteria_file` and process them into `downloads_dir`
    ///
    /// A missing criteria file fails before the downloads directory is touched or any
    /// request is made.
    pub async fn run(&self, criteria_file: &Path, downloads_dir: &Path) -> Result<RunReport> {
        info!(?criteria_file, "gathering search criteria");
        let criteria = criteria::load(criteria_file).await?;
        self.run_criteria(&criteria, downloads_dir).await
    }

    /// Process already-loaded criteria into `downloads_dir`
    pub async fn run_criteria(
        &self,
        criteria: &[Criterion],
        downloads_dir: &Path,
    ) -> Result<RunReport> {
        ensure_dir_exists(downloads_dir).await?;

        let mut report = RunReport::default();

        for (index, criterion) in criteria.iter().enumerate() {
            self.emit(Event::Queued {
                criterion: criterion.to_string(),
                index,
            });

            let mut job = self.prepare_job(criterion, downloads_dir)?;

            match self.process(&mut job).await {
                Ok(result) => {
                    info!(
                        criterion = %criterion,
                        directory = %result.directory,
                        "results stored in {}/",
                        result.path.display()
                    );
                    report.results.push(result);
                }
                Err(e) => {
                    let stage = job.stage;
                    job.advance(Stage::Failed);
                    error!(criterion = %criterion, %stage, error = %e, "criterion failed");
                    self.emit(Event::Failed {
                        criterion: criterion.to_string(),
                        stage,
                        error: e.to_string(),
                    });

                    match self.config.failure_policy {
                        FailurePolicy::Abort => return Err(e.in_job(criterion.encoded(), stage)),
                        FailurePolicy::Continue => report.failures.push(FailedJob {
                            criterion: criterion.to_string(),
                            stage,
                            error: e.to_string(),
                        }),
                    }
                }
            }
        }

        self.emit(Event::RunComplete {
            succeeded: report.results.len(),
            failed: report.failures.len(),
        });

        Ok(report)
    }

    /// Build the job for a criterion
    pub fn prepare_job(&self, criterion: &Criterion, downloads_dir: &Path) -> Result<DownloadJob> {
        let archive_path = self.fetcher.archive_path(criterion, downloads_dir);
        let extraction_dir = extraction_dir_for(&archive_path)?;

        Ok(DownloadJob {
            criterion: criterion.clone(),
            url: self.fetcher.download_url(criterion),
            archive_path,
            extraction_dir,
            stage: Stage::Pending,
        })
    }

    /// Drive one job from `Pending` to `CleanedUp`
    ///
    /// On error, `job.stage` is the stage that failed.
    async fn process(&self, job: &mut DownloadJob) -> Result<ResultSet> {
        let criterion = job.criterion.to_string();

        job.advance(Stage::Downloading);
        self.emit(Event::Downloading {
            criterion: criterion.clone(),
            url: job.url.clone(),
        });
        let bytes = self.fetcher.fetch_to(&job.url, &job.archive_path).await?;
        job.advance(Stage::Downloaded);
        self.emit(Event::Downloaded {
            criterion: criterion.clone(),
            archive: job.archive_path.clone(),
            bytes,
        });

        job.advance(Stage::Extracting);
        self.emit(Event::Extracting {
            criterion: criterion.clone(),
            archive: job.archive_path.clone(),
        });
        let extracted =
            match extract_archive(&job.archive_path, self.config.extraction.unsafe_entries).await {
                Ok(extracted) => extracted,
                Err(e) => {
                    if self.config.cleanup.remove_failed_archives {
                        remove_file_best_effort(&job.archive_path).await;
                    }
                    return Err(e);
                }
            };
        job.advance(Stage::Extracted);
        self.emit(Event::Extracted {
            criterion: criterion.clone(),
            directory: extracted.name.clone(),
            file_count: extracted.files.len(),
        });

        let removed = if self.config.cleanup.delete_archives {
            let removed = remove_file_best_effort(&job.archive_path).await;
            if !removed {
                warn!(
                    criterion = %criterion,
                    archive = ?job.archive_path,
                    "archive could not be removed after extraction"
                );
            }
            removed
        } else {
            false
        };
        job.advance(Stage::CleanedUp);
        self.emit(Event::CleanedUp {
            criterion: criterion.clone(),
            removed,
        });

        Ok(ResultSet {
            criterion,
            directory: extracted.name,
            path: extracted.directory,
            file_count: extracted.files.len(),
            completed_at: Utc::now(),
        })
    }

    fn emit(&self, event: Event) {
        // No receivers is normal for library use without subscribers
        self.event_tx.send(event).ok();
    }
}
