mod export;
mod locations;
mod run;
mod search;

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use mapscout_core::{load_app_config, LocationHierarchy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mapscout")]
#[command(about = "Collect business listings from map searches, district by district")]
struct Cli {
    /// Location hierarchy YAML to use instead of the bundled one
    #[arg(long, global = true, env = "MAPSCOUT_LOCATIONS_FILE")]
    locations_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search one query across the selected districts
    Search(search::SearchArgs),
    /// List departments, provinces of a department, or districts of a province
    Locations {
        #[arg(long)]
        department: Option<String>,
        #[arg(long, requires = "department")]
        province: Option<String>,
    },
    /// Merge a saved JSON result file into per-district CSV files
    Export {
        /// JSON file written by `search`
        input: PathBuf,
        /// Target directory (default: <output dir>/gmb_results)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn load_hierarchy(path: Option<&PathBuf>) -> anyhow::Result<LocationHierarchy> {
    match path {
        Some(path) => LocationHierarchy::load(path)
            .with_context(|| format!("failed to load locations from {}", path.display())),
        None => LocationHierarchy::bundled().context("bundled location hierarchy is invalid"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_app_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, pacing = %config.pacing, "configuration loaded");

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let hierarchy = load_hierarchy(cli.locations_file.as_ref())?;

    match command {
        Commands::Search(args) => search::run_search(config, &hierarchy, args).await?,
        Commands::Locations {
            department,
            province,
        } => locations::run_locations(&hierarchy, department.as_deref(), province.as_deref())?,
        Commands::Export { input, dir } => {
            let dir = dir.unwrap_or_else(|| config.output_dir.join(search::DISTRICT_DIR));
            let report = export::export_by_district(&input, &dir)?;
            export::print_report(&report);
        }
    }

    Ok(())
}
