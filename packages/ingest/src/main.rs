#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the fire incident ingestion tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fire_map_cli_utils::GeocodeProgress;
use fire_map_geocoder::resolve::AddressResolver;
use fire_map_ingest::{IngestConfig, Ingestor, geocode_one};
use fire_map_scraper::html_table::IncidentTableExtractor;
use fire_map_store::StoreConfig;

#[derive(Parser)]
#[command(name = "fire_map_ingest", about = "Fire incident ingestion tool")]
struct Cli {
    /// TOML file merged over the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding `data.json` and `location_cache.json`
    /// (overrides the configured store paths)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the dispatch page once and merge new incidents into the store
    Run,
    /// Print the incidents extracted from a saved copy of the dispatch page
    Extract {
        /// Path to an HTML file
        file: PathBuf,
    },
    /// Resolve one address through the cache and geocoder
    Geocode {
        /// Address as it appears on the dispatch page
        address: String,
    },
    /// Print the geocoding queries that would be tried for an address
    Candidates {
        /// Address as it appears on the dispatch page
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = fire_map_cli_utils::init_logger();

    let cli = Cli::parse();

    let mut config = IngestConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.store = StoreConfig::in_dir(dir);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let ingestor = Ingestor::from_config(&config)?;
            let progress = GeocodeProgress::attach(&multi, "Geocoding");

            let report = ingestor.run_once(Some(progress)).await?;

            println!(
                "Found {} incidents, added {} ({} geocoded)",
                report.found, report.added, report.geocoded
            );
        }
        Commands::Extract { file } => {
            let html = std::fs::read_to_string(&file)?;
            let extractor = IncidentTableExtractor::new(&config.source.table)?;
            let incidents = extractor.extract(&html);

            log::info!("Extracted {} incidents from {}", incidents.len(), file.display());
            println!("{}", serde_json::to_string_pretty(&incidents)?);
        }
        Commands::Geocode { address } => {
            let resolver = AddressResolver::nominatim(&config.geocoder)?;

            match geocode_one(&resolver, &config.store, &address).await? {
                Some((lat, lng)) => println!("{lat}, {lng}"),
                None => return Err(format!("no in-bounds result for '{address}'").into()),
            }
        }
        Commands::Candidates { address } => {
            let resolver = AddressResolver::nominatim(&config.geocoder)?;
            let planner = resolver.planner();

            println!("Candidates for '{address}' ({}):", planner.city());
            for candidate in planner.candidates(&address) {
                println!("{:?}\t{}", candidate.kind, candidate.query);
            }
        }
    }

    Ok(())
}
