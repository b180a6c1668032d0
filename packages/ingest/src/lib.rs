#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Library for ingesting fire/rescue dispatch incidents into the fire map
//! data files.
//!
//! One call to [`Ingestor::run_once`] fetches the dispatch page, extracts
//! its incident table, geocodes every incident not seen before, merges them
//! into the persisted list (newest first) and writes the list and the
//! geocode cache back to disk. Scheduling repeated runs is up to the
//! caller.

pub mod config;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use fire_map_geocoder::nominatim::NominatimClient;
use fire_map_geocoder::resolve::AddressResolver;
use fire_map_geocoder::{Geocode, GeocodeError, Pause, TokioPause};
use fire_map_incident_models::{GeocodeCache, Incident, Precision, sort_newest_first};
use fire_map_scraper::html_table::IncidentTableExtractor;
use fire_map_scraper::progress::ProgressCallback;
use fire_map_scraper::{FetchDocument, HttpFetcher, ScrapeError};
use fire_map_store::{StoreConfig, StoreError};

pub use config::IngestConfig;

/// Errors that abort an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The dispatch page could not be fetched. Nothing was written.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ScrapeError),

    /// The scraper could not be set up (bad selector or header).
    #[error("Scraper setup failed: {0}")]
    Scrape(#[from] ScrapeError),

    /// The geocoder could not be set up.
    #[error("Geocoder setup failed: {0}")]
    Geocode(#[from] GeocodeError),

    /// Writing the store files failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Incidents found on the page.
    pub found: usize,
    /// Incidents that were new and got appended.
    pub added: usize,
    /// How many of the added incidents received coordinates.
    pub geocoded: usize,
}

/// Runs the fetch → extract → dedupe → geocode → merge → persist pipeline.
pub struct Ingestor<F, G, P = TokioPause> {
    fetcher: F,
    extractor: IncidentTableExtractor,
    resolver: AddressResolver<G, P>,
    store: StoreConfig,
}

impl Ingestor<HttpFetcher, NominatimClient, TokioPause> {
    /// Builds an ingestor that talks to the real dispatch page and
    /// Nominatim.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the HTTP clients, the table selectors, or
    /// the candidate patterns cannot be built.
    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestError> {
        Ok(Self::new(
            HttpFetcher::new(&config.source)?,
            IncidentTableExtractor::new(&config.source.table)?,
            AddressResolver::nominatim(&config.geocoder)?,
            config.store.clone(),
        ))
    }
}

impl<F: FetchDocument, G: Geocode, P: Pause> Ingestor<F, G, P> {
    /// Assembles an ingestor from its parts.
    #[must_use]
    pub const fn new(
        fetcher: F,
        extractor: IncidentTableExtractor,
        resolver: AddressResolver<G, P>,
        store: StoreConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            resolver,
            store,
        }
    }

    /// Performs one ingestion run and returns what it did.
    ///
    /// Both store files are rewritten at the end of every run that gets
    /// past the fetch, even when nothing new was found.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Fetch`] if the page cannot be fetched, in
    /// which case nothing is written, or [`IngestError::Store`] if the
    /// files cannot be written.
    pub async fn run_once(
        &self,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        log::info!("Starting ingestion run");

        let mut incidents = fire_map_store::load_incidents(&self.store.incidents_path);
        let mut cache = fire_map_store::load_geocode_cache(&self.store.cache_path);
        log::debug!(
            "Loaded {} incidents and {} cached locations",
            incidents.len(),
            cache.len()
        );

        let html = self.fetcher.fetch().await.map_err(IngestError::Fetch)?;

        let found = self.extractor.extract(&html);
        log::info!("Found {} incidents on page", found.len());

        let mut report = IngestReport {
            found: found.len(),
            ..IngestReport::default()
        };

        let (added, geocoded) = merge_new_incidents(
            &mut incidents,
            found,
            &self.resolver,
            &mut cache,
            progress.as_deref(),
        )
        .await;
        report.added = added;
        report.geocoded = geocoded;

        sort_newest_first(&mut incidents);

        fire_map_store::save(&self.store.incidents_path, &incidents)?;
        fire_map_store::save(&self.store.cache_path, &cache)?;

        log::info!(
            "Ingestion complete in {:.1}s. Added {} new incidents ({} geocoded)",
            start.elapsed().as_secs_f64(),
            report.added,
            report.geocoded
        );

        Ok(report)
    }
}

/// Appends every incident from `found` whose id is not already in
/// `incidents`, geocoding and classifying it first.
///
/// Existing incidents are left untouched. Rows repeating an id seen earlier
/// on the same page are dropped. Returns `(added, geocoded)`.
pub async fn merge_new_incidents<G: Geocode, P: Pause>(
    incidents: &mut Vec<Incident>,
    found: Vec<Incident>,
    resolver: &AddressResolver<G, P>,
    cache: &mut GeocodeCache,
    progress: Option<&dyn ProgressCallback>,
) -> (usize, usize) {
    let mut known: BTreeSet<String> = incidents.iter().map(|i| i.id.clone()).collect();
    let fresh: Vec<Incident> = found
        .into_iter()
        .filter(|incident| known.insert(incident.id.clone()))
        .collect();

    if let Some(p) = progress {
        p.set_total(fresh.len() as u64);
    }

    let mut geocoded = 0;
    let added = fresh.len();

    for mut incident in fresh {
        if let Some((lat, lng)) = resolver.resolve(&incident.address, cache).await {
            incident.lat = Some(lat);
            incident.lng = Some(lng);
            geocoded += 1;
        }
        incident.precision = Some(Precision::classify(&incident.address));

        log::debug!(
            "New incident {} at {} ({}), coordinates {:?}",
            incident.id,
            incident.address,
            incident.timestamp,
            incident.coordinates()
        );
        if let Some(p) = progress {
            p.advance(&incident.address);
        }

        incidents.push(incident);
    }

    if let Some(p) = progress {
        p.finish(format!("{added} new incidents, {geocoded} geocoded"));
    }

    (added, geocoded)
}

/// Resolves a single address through the persisted cache and the candidate
/// chain, saving the cache when a new location was learned.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if the updated cache cannot be written.
pub async fn geocode_one<G: Geocode, P: Pause>(
    resolver: &AddressResolver<G, P>,
    store: &StoreConfig,
    address: &str,
) -> Result<Option<(f64, f64)>, IngestError> {
    let mut cache = fire_map_store::load_geocode_cache(&store.cache_path);
    let before = cache.len();

    let coords = resolver.resolve(address, &mut cache).await;

    if cache.len() != before {
        fire_map_store::save(&store.cache_path, &cache)?;
    }

    Ok(coords)
}
