//! The `search` command: resolves locations, launches the browser, and runs
//! the location loop on a worker task while the foreground prints progress.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use mapscout_core::filter::DEFAULT_MAX_AGE_DAYS;
use mapscout_core::{AppConfig, FilterCriteria, LocationHierarchy, LocationSelection};
use mapscout_scraper::{pacing, ChromiumSession, EmailHarvester, SearchOrchestrator, SearchSettings, SessionOptions};
use mapscout_sink::{default_stem, DistrictExporter, OutputFormat, ResultSink, SaveMode};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::run::{execute_run, CancellationFlag, RunEvent, RunPlan, RunSummary};

/// Directory (under the output directory) holding per-district files.
pub const DISTRICT_DIR: &str = "gmb_results";

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// What to search for, e.g. "restaurantes"
    pub query: String,

    /// Department to search (repeatable)
    #[arg(long = "department")]
    pub departments: Vec<String>,

    /// Restrict to these provinces of the selected departments (repeatable)
    #[arg(long = "province")]
    pub provinces: Vec<String>,

    /// Restrict to these districts of the selected provinces (repeatable)
    #[arg(long = "district")]
    pub districts: Vec<String>,

    /// Search every district in the hierarchy
    #[arg(long, conflicts_with = "departments")]
    pub all: bool,

    /// Minimum star rating (0-5)
    #[arg(long, default_value_t = 0.0)]
    pub min_rating: f64,

    /// Minimum number of reviews
    #[arg(long, default_value_t = 0)]
    pub min_reviews: u64,

    /// Minimum listing age in days (only with --estimate-age)
    #[arg(long = "min-age", default_value_t = 0)]
    pub min_age_days: u32,

    /// Maximum listing age in days (only with --estimate-age)
    #[arg(long = "max-age", default_value_t = DEFAULT_MAX_AGE_DAYS)]
    pub max_age_days: u32,

    /// Estimate listing age from the oldest visible review
    #[arg(long)]
    pub estimate_age: bool,

    /// Listings to extract per location
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Skip this many listings at the top of each result list
    #[arg(long)]
    pub skip_first: Option<usize>,

    /// Output format: csv, json or both
    #[arg(long, default_value = "both")]
    pub format: OutputFormat,

    /// Output file stem (default: gmb_{query}_{timestamp})
    #[arg(long)]
    pub output: Option<String>,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Write all results once at the end instead of after every location.
    /// A crash before the end loses every unsaved result
    #[arg(long)]
    pub buffered: bool,

    /// Also merge results into per-district CSV files
    #[arg(long)]
    pub by_district: bool,

    /// Launch the browser headless
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Launch the browser with a visible window
    #[arg(long)]
    pub headed: bool,
}

impl SearchArgs {
    #[must_use]
    pub fn selection(&self) -> LocationSelection {
        LocationSelection {
            all: self.all,
            departments: self.departments.clone(),
            provinces: self.provinces.clone(),
            districts: self.districts.clone(),
        }
    }

    #[must_use]
    pub fn filters(&self) -> FilterCriteria {
        FilterCriteria {
            min_rating: self.min_rating,
            min_reviews: self.min_reviews,
            min_age_days: self.min_age_days,
            max_age_days: self.max_age_days,
        }
    }

    /// Applies per-run flag overrides on top of the environment config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(max) = self.max_results {
            config.max_results = max;
        }
        if let Some(skip) = self.skip_first {
            config.skip_first = skip;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if self.headless {
            config.headless = true;
        }
        if self.headed {
            config.headless = false;
        }
    }

    fn save_mode(&self) -> SaveMode {
        if self.buffered {
            SaveMode::Buffered
        } else {
            SaveMode::Incremental
        }
    }
}

fn render(event: &RunEvent) {
    match event {
        RunEvent::Progress(pct) => println!("[{pct:>3}%]"),
        RunEvent::Status(text) => println!("  {text}"),
        RunEvent::Result(line) => println!("    + {line}"),
        RunEvent::Stats { total, with_email } => {
            println!("  {total} businesses so far ({with_email} with email)");
        }
        RunEvent::Complete(text) => println!("done: {text}"),
        RunEvent::Error(text) => eprintln!("error: {text}"),
    }
}

fn print_summary(summary: &RunSummary, files: &[PathBuf]) {
    println!();
    println!("{}", "=".repeat(50));
    println!("Businesses found:    {}", summary.total);
    println!("With email:          {}", summary.with_email);
    println!("Locations processed: {}", summary.locations_done);
    println!("Locations failed:    {}", summary.locations_failed);
    if summary.cancelled {
        println!("Run was cancelled before all locations were searched.");
    }
    for file in files {
        println!("Saved: {}", file.display());
    }
}

/// Runs the `search` command.
///
/// # Errors
///
/// Returns an error if the location selection is invalid, the browser cannot
/// be launched, the session is lost mid-run, or results cannot be saved.
pub async fn run_search(
    mut config: AppConfig,
    hierarchy: &LocationHierarchy,
    args: SearchArgs,
) -> anyhow::Result<()> {
    args.apply_overrides(&mut config);
    let locations = hierarchy
        .select(&args.selection())
        .context("invalid location selection")?;

    let pacing = pacing::for_mode(config.pacing);
    let harvester = EmailHarvester::new(config.website_timeout_secs, config.website_scan_probability)
        .context("failed to build website client")?;
    let mut settings = SearchSettings::from_config(&config);
    settings.estimate_age = args.estimate_age;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, query = %args.query);
    span.in_scope(|| {
        tracing::info!(
            locations = locations.len(),
            format = %args.format,
            buffered = args.buffered,
            "starting search run"
        );
    });

    let options = SessionOptions::from_config(&config, pacing.as_ref());
    let session = ChromiumSession::launch(&options)
        .await
        .context("failed to launch browser")?;
    let orchestrator = SearchOrchestrator::new(session, Arc::clone(&pacing), harvester, settings);

    let stem = args
        .output
        .clone()
        .unwrap_or_else(|| default_stem(&args.query, chrono::Local::now().naive_local()));
    let sink = ResultSink::new(&config.output_dir, stem, args.format, args.save_mode());
    let files = sink.paths();

    let cancel = CancellationFlag::default();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping after the current location");
                cancel.cancel();
            }
        });
    }

    let plan = RunPlan {
        query: args.query.clone(),
        locations,
        filters: args.filters(),
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(
        async move { execute_run(&orchestrator, plan, sink, cancel, tx).await }.instrument(span),
    );

    while let Some(event) = rx.recv().await {
        render(&event);
    }
    let summary = worker.await.context("run worker panicked")??;

    print_summary(&summary, &files);

    if args.by_district {
        let exporter = DistrictExporter::new(config.output_dir.join(DISTRICT_DIR));
        let report = exporter
            .export(&summary.records)
            .context("failed to write district files")?;
        println!("District files: {}", report.files.len());
    }
    Ok(())
}
