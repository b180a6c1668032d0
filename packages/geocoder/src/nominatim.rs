//! Nominatim / OpenStreetMap geocoder client.
//!
//! Free-text search only. The public instance allows **1 request per
//! second** and requires an identifying `User-Agent`; pacing is left to the
//! caller (see [`crate::resolve::AddressResolver`]).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use serde::Deserialize;

use crate::{Geocode, GeocodeError, GeocodedAddress, GeocoderConfig};

/// Nominatim free-text search client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    country_codes: Option<String>,
}

impl NominatimClient {
    /// Builds a client identified by the configured user agent, with the
    /// configured per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            country_codes: config.country_codes.clone(),
        })
    }
}

impl Geocode for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        geocode_freeform(
            &self.client,
            &self.base_url,
            query,
            self.country_codes.as_deref(),
        )
        .await
    }
}

/// Geocodes a free-form query using Nominatim.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    country_codes: Option<&str>,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
    if let Some(codes) = country_codes {
        params.push(("countrycodes", codes));
    }

    let resp = client.get(base_url).query(&params).send().await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body = resp.error_for_status()?.text().await?;
    parse_response(&body)
}

/// One entry of a `format=jsonv2` search response. Coordinates arrive as
/// decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

fn parse_response(body: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let places: Vec<Place> = serde_json::from_str(body).map_err(|e| GeocodeError::Parse {
        message: format!("unexpected Nominatim response: {e}"),
    })?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let coordinate = |raw: &str| {
        raw.trim().parse::<f64>().map_err(|e| GeocodeError::Parse {
            message: format!("bad coordinate '{raw}': {e}"),
        })
    };

    Ok(Some(GeocodedAddress {
        latitude: coordinate(&place.lat)?,
        longitude: coordinate(&place.lon)?,
        matched_address: place.display_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = r#"[{
            "place_id": 1,
            "lat": "22.6229",
            "lon": "120.3210",
            "display_name": "建國一路, 苓雅區, 高雄市, 臺灣"
        }]"#;
        let result = parse_response(body).unwrap().unwrap();
        assert!((result.latitude - 22.6229).abs() < 1e-4);
        assert!((result.longitude - 120.3210).abs() < 1e-4);
        assert_eq!(
            result.matched_address.as_deref(),
            Some("建國一路, 苓雅區, 高雄市, 臺灣")
        );
    }

    #[test]
    fn parses_nominatim_empty() {
        assert!(parse_response("[]").unwrap().is_none());
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            parse_response(r#"{"error": "bad request"}"#),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        assert!(matches!(
            parse_response(r#"[{ "display_name": "somewhere" }]"#),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_unparseable_coordinate() {
        assert!(matches!(
            parse_response(r#"[{ "lat": "north", "lon": "120.3" }]"#),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let config = GeocoderConfig {
            base_url: "http://127.0.0.1:1/search".to_string(),
            timeout_secs: 2,
            ..GeocoderConfig::default()
        };
        let client = NominatimClient::new(&config).unwrap();

        assert!(matches!(
            client.geocode("高雄市建國一路").await,
            Err(GeocodeError::Http(_))
        ));
    }
}
