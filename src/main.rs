use clap::{ArgAction, Parser};
use research_dl::{Config, Error, FailurePolicy, Pipeline, RunReport, ToExitCode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "research-dl")]
#[command(version)]
#[command(about = "Download and unpack clinical trial result archives by search phrase", long_about = None)]
struct Cli {
    /// Text file with one search phrase per line
    #[arg(
        long,
        value_name = "FILE",
        default_value = "params.txt",
        env = "RESEARCH_DL_CRITERIA"
    )]
    criteria: PathBuf,

    /// Directory archives are downloaded and extracted into
    #[arg(long, value_name = "DIR", env = "RESEARCH_DL_DOWNLOADS")]
    downloads: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Registry host, e.g. https://clinicaltrials.gov
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Keep going after a criterion fails and report failures at the end
    #[arg(long, action = ArgAction::SetTrue)]
    continue_on_error: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Colorize log output
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    /// Log debug output
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    research_dl::logging::init_logger(cli.color, cli.verbose);

    match run(cli).await {
        Ok(report) if report.is_complete() => ExitCode::SUCCESS,
        Ok(report) => {
            warn!(
                failed = report.failures.len(),
                "some criteria failed, see messages above"
            );
            ExitCode::from(1)
        }
        Err(e) => {
            error!(code = e.error_code(), "{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport, Error> {
    let mut config = match &cli.config {
        Some(path) => {
            info!(config = %path.display(), "loading configuration");
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    if let Some(base_url) = cli.base_url {
        config.registry.base_url = base_url;
    }
    if cli.continue_on_error {
        config.failure_policy = FailurePolicy::Continue;
    }
    let downloads = cli
        .downloads
        .unwrap_or_else(|| config.download.download_dir.clone());

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run(&cli.criteria, &downloads).await?;

    for result in &report.results {
        println!(
            "Results for \"{}\" stored in {}/",
            result.criterion,
            downloads.join(&result.directory).display()
        );
    }
    for failure in &report.failures {
        println!(
            "Failed \"{}\" while {}: {}",
            failure.criterion, failure.stage, failure.error
        );
    }

    if let Some(path) = &cli.report {
        write_report(&report, path)?;
    }

    Ok(report)
}

fn write_report(report: &RunReport, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    info!(report = %path.display(), "run report written");
    Ok(())
}
