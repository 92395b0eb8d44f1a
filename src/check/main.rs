//! geoBoundaries submission checker.
//!
//! Runs the individual checks (or all of them) against submission archives
//! and prints the findings.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geoboundaries_check::checks;
use geoboundaries_check::config::Config;
use geoboundaries_check::{CheckReport, ReferenceData, SubmissionReport};

#[derive(Parser, Debug)]
#[command(name = "gbcheck", version)]
#[command(about = "Validate geoBoundaries submissions")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to extract archives under (defaults to the system temp dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Local ISO 3166-1 alpha-3 CSV instead of fetching it
    #[arg(long)]
    iso_csv: Option<PathBuf>,

    /// Local license list CSV instead of fetching it
    #[arg(long)]
    license_csv: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check for a column of boundary names
    Name { path: PathBuf },
    /// Check for a column of boundary ISO codes
    Iso { path: PathBuf },
    /// Check geometry validity and extent
    Boundary { path: PathBuf },
    /// Check the layer is in EPSG:4326
    Projection { path: PathBuf },
    /// Validate meta.txt
    Meta { path: PathBuf },
    /// Check for a license image in the archive
    License { path: PathBuf },
    /// Run every check on one or more submissions
    All {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// How a run ended, mapped onto the exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Passed,
    Failed,
    /// At least one submission could not be checked at all
    Incomplete,
}

impl Outcome {
    fn of(passed: bool) -> Self {
        if passed {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }

    fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Passed => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::from(1),
            Outcome::Incomplete => ExitCode::from(2),
        }
    }
}

fn print_report(report: &CheckReport) {
    println!("== {} check: {}", report.kind, report.source.display());
    for finding in &report.findings {
        println!("{}", finding);
    }
    println!(
        "Result: {}",
        if report.passed() { "PASSED" } else { "FAILED" }
    );
}

fn print_submission(summary: &SubmissionReport) {
    println!("#### {}", summary.path.display());
    for report in &summary.reports {
        print_report(report);
    }
    println!("Performed all the checks.");
}

async fn reference(config: &Config) -> Result<ReferenceData> {
    ReferenceData::load(&config.reference)
        .await
        .context("Failed to load ISO / license reference lists")
}

fn could_not_check(path: &Path) -> String {
    format!("Could not check {}", path.display())
}

fn single(report: CheckReport, format: OutputFormat) -> Result<Outcome> {
    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(Outcome::of(report.passed()))
}

/// Split batch results into the summaries that ran and one error line per
/// submission that could not be opened
fn partition_results(
    paths: &[PathBuf],
    results: Vec<geoboundaries_check::Result<SubmissionReport>>,
) -> (Vec<SubmissionReport>, Vec<String>) {
    let mut summaries = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => errors.push(format!("{}: {}", could_not_check(path), e)),
        }
    }
    (summaries, errors)
}

fn batch_outcome(summaries: &[SubmissionReport], errors: &[String]) -> Outcome {
    if !errors.is_empty() {
        Outcome::Incomplete
    } else {
        Outcome::of(summaries.iter().all(SubmissionReport::passed))
    }
}

async fn run(args: Args) -> Result<Outcome> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if args.temp_dir.is_some() {
        config.global.temp_dir = args.temp_dir.clone();
    }
    if args.iso_csv.is_some() {
        config.reference.iso_csv = args.iso_csv.clone();
    }
    if args.license_csv.is_some() {
        config.reference.license_csv = args.license_csv.clone();
    }

    let temp_root = config.global.temp_dir.as_deref();

    match &args.command {
        Command::Name { path } => single(
            checks::name_check(path, temp_root).with_context(|| could_not_check(path))?,
            args.format,
        ),
        Command::Iso { path } => single(
            checks::iso_check(path, temp_root).with_context(|| could_not_check(path))?,
            args.format,
        ),
        Command::Boundary { path } => single(
            checks::boundary_check(path, temp_root).with_context(|| could_not_check(path))?,
            args.format,
        ),
        Command::Projection { path } => single(
            checks::projection_check(path, temp_root).with_context(|| could_not_check(path))?,
            args.format,
        ),
        Command::License { path } => single(
            checks::check_license_png(path, temp_root).with_context(|| could_not_check(path))?,
            args.format,
        ),
        Command::Meta { path } => {
            let reference = reference(&config).await?;
            single(
                checks::meta_check(path, temp_root, &reference).with_context(|| could_not_check(path))?,
                args.format,
            )
        }
        Command::All { paths } => {
            let reference = reference(&config).await?;

            let pb = ProgressBar::new(paths.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            if paths.len() < 2 {
                pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            }

            let batch_paths = paths.clone();
            let batch_temp_root = config.global.temp_dir.clone();
            let progress = pb.clone();
            let results = tokio::task::spawn_blocking(move || {
                checks::check_many(
                    &batch_paths,
                    batch_temp_root.as_deref(),
                    &reference,
                    |path, _| {
                        progress.set_message(path.display().to_string());
                        progress.inc(1);
                    },
                )
            })
            .await
            .context("Batch check task failed")?;
            pb.finish_and_clear();

            let (summaries, errors) = partition_results(paths, results);

            match args.format {
                OutputFormat::Text => summaries.iter().for_each(print_submission),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
            }
            for error in &errors {
                eprintln!("Error: {}", error);
            }

            let failed = summaries.iter().filter(|s| !s.passed()).count();
            info!(
                "{} of {} submissions passed, {} could not be checked",
                summaries.len() - failed,
                paths.len(),
                errors.len()
            );
            Ok(batch_outcome(&summaries, &errors))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so that reports on stdout stay machine readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    let args = Args::parse();

    match run(args).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
