#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for fire incident addresses.
//!
//! Resolves a dispatch address to coordinates by:
//!
//! 1. Checking the shared [`fire_map_incident_models::GeocodeCache`].
//! 2. Planning alternate query phrasings ([`address::CandidatePlanner`]).
//! 3. Sending each candidate to Nominatim ([`nominatim`]) until one comes
//!    back inside the configured [`BoundingBox`].
//!
//! Every network attempt is followed by a fixed pause to respect the public
//! Nominatim rate limit. The network and the pause are both behind traits
//! ([`Geocode`], [`Pause`]) so the [`resolve::AddressResolver`] can be
//! driven by fakes.

pub mod address;
pub mod nominatim;
pub mod resolve;

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (including timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The geocoder configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] regex::Error),
}

/// Latitude/longitude rectangle that accepted results must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Roughly Kaohsiung and its surroundings.
    pub const KAOHSIUNG: Self = Self {
        min_lat: 22.0,
        max_lat: 23.5,
        min_lng: 120.0,
        max_lng: 121.5,
    };

    /// Returns whether the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::KAOHSIUNG
    }
}

/// Geocoder settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
    pub base_url: String,
    /// Identifies this application to the geocoding service.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause after a completed request, in milliseconds.
    pub success_delay_ms: u64,
    /// Pause after a failed request, in milliseconds.
    pub error_delay_ms: u64,
    /// City used by the candidate rewrites.
    pub city: String,
    /// Optional `countrycodes` restriction passed to Nominatim.
    pub country_codes: Option<String>,
    /// Results outside this box are discarded.
    pub bounds: BoundingBox,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".to_owned(),
            user_agent: "kaohsiung_fire_map_v1".to_owned(),
            timeout_secs: 10,
            success_delay_ms: 1100,
            error_delay_ms: 1000,
            city: "高雄市".to_owned(),
            country_codes: None,
            bounds: BoundingBox::default(),
        }
    }
}

impl GeocoderConfig {
    /// Pause after a completed request.
    #[must_use]
    pub const fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_delay_ms)
    }

    /// Pause after a failed request.
    #[must_use]
    pub const fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

/// A free-text geocoding backend.
pub trait Geocode: Send + Sync {
    /// Geocodes a single query, returning the best match if any.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the service cannot be reached or its
    /// response cannot be understood.
    fn geocode(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Option<GeocodedAddress>, GeocodeError>> + Send;
}

/// Waits between geocoding requests.
pub trait Pause: Send + Sync {
    /// Suspends for `duration`.
    fn pause(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// [`Pause`] backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
