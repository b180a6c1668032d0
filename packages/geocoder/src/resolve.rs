//! Cache-first, candidate-by-candidate address resolution.

use std::time::Duration;

use fire_map_incident_models::GeocodeCache;

use crate::address::CandidatePlanner;
use crate::nominatim::NominatimClient;
use crate::{BoundingBox, Geocode, GeocodeError, GeocoderConfig, Pause, TokioPause};

/// Resolves raw dispatch addresses to `(lat, lng)`.
///
/// Candidates from the [`CandidatePlanner`] are sent one at a time; the
/// first in-bounds result wins and is cached under the original address.
/// Every request is followed by a pause: the success delay after a
/// completed request, the error delay after a failed one.
#[derive(Debug)]
pub struct AddressResolver<G, P = TokioPause> {
    geocoder: G,
    pause: P,
    planner: CandidatePlanner,
    bounds: BoundingBox,
    success_delay: Duration,
    error_delay: Duration,
}

impl AddressResolver<NominatimClient, TokioPause> {
    /// Builds a resolver backed by Nominatim and real sleeps.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client or the candidate
    /// patterns cannot be built.
    pub fn nominatim(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        Self::new(NominatimClient::new(config)?, TokioPause, config)
    }
}

impl<G: Geocode, P: Pause> AddressResolver<G, P> {
    /// Builds a resolver from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the candidate patterns for the
    /// configured city cannot be compiled.
    pub fn new(geocoder: G, pause: P, config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        Ok(Self {
            geocoder,
            pause,
            planner: CandidatePlanner::new(&config.city)?,
            bounds: config.bounds,
            success_delay: config.success_delay(),
            error_delay: config.error_delay(),
        })
    }

    /// Returns the candidate planner.
    #[must_use]
    pub const fn planner(&self) -> &CandidatePlanner {
        &self.planner
    }

    /// Resolves `address`, consulting and updating `cache`.
    ///
    /// A cache hit returns immediately without touching the network.
    /// Returns `None` when every candidate failed, came back empty, or
    /// landed outside the bounding box.
    pub async fn resolve(&self, address: &str, cache: &mut GeocodeCache) -> Option<(f64, f64)> {
        if let Some(&[lat, lng]) = cache.get(address) {
            log::debug!("Cache hit for '{address}'");
            return Some((lat, lng));
        }

        for candidate in self.planner.candidates(address) {
            log::info!("Geocoding query: {}", candidate.query);

            match self.geocoder.geocode(&candidate.query).await {
                Ok(Some(hit)) => {
                    self.pause.pause(self.success_delay).await;

                    if self.bounds.contains(hit.latitude, hit.longitude) {
                        cache.insert(address.to_owned(), [hit.latitude, hit.longitude]);
                        return Some((hit.latitude, hit.longitude));
                    }

                    log::info!(
                        "Skipping result out of bounds for '{}': ({}, {}) {}",
                        candidate.query,
                        hit.latitude,
                        hit.longitude,
                        hit.matched_address.as_deref().unwrap_or_default()
                    );
                }
                Ok(None) => {
                    self.pause.pause(self.success_delay).await;
                    log::debug!("No match for '{}'", candidate.query);
                }
                Err(e) => {
                    log::warn!("Geocoding error for '{}': {e}", candidate.query);
                    self.pause.pause(self.error_delay).await;
                }
            }
        }

        log::warn!("Failed to geocode: {address}");
        None
    }
}
