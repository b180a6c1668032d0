#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fire/rescue dispatch incident types.
//!
//! This crate defines the canonical [`Incident`] record persisted by the
//! ingestion pipeline, the content-derived identity used for deduplication
//! ([`incident_id`]), and the address [`Precision`] classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Characters that mark an address as street-level (road, street, number,
/// section, lane, alley).
pub const STREET_TOKENS: &[char] = &['路', '街', '號', '段', '巷', '弄'];

/// Character that marks an administrative district.
pub const DISTRICT_TOKEN: char = '區';

/// Raw address → `[lat, lng]` cache shared by the geocoder and the store.
///
/// Keys are the address exactly as published, not the query that resolved
/// it. Entries are never invalidated.
pub type GeocodeCache = BTreeMap<String, [f64; 2]>;

/// How specific an incident's address is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Precision {
    /// The address names a street, number, lane, etc.
    Point,
    /// The address only names a district.
    Area,
}

impl Precision {
    /// Classifies an address.
    ///
    /// An address is [`Precision::Area`] when it contains a district token
    /// but none of the [`STREET_TOKENS`]. Everything else, including
    /// addresses with neither, is [`Precision::Point`].
    #[must_use]
    pub fn classify(address: &str) -> Self {
        if address.contains(DISTRICT_TOKEN) && !address.contains(STREET_TOKENS) {
            Self::Area
        } else {
            Self::Point
        }
    }
}

/// A single dispatch record extracted from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Content-derived identifier, see [`incident_id`].
    pub id: String,
    /// Source timestamp, kept verbatim. Also the sort key.
    pub timestamp: String,
    /// Incident category (e.g. fire, rescue).
    pub category: String,
    /// Incident type within the category.
    #[serde(rename = "type")]
    pub incident_type: String,
    /// Free-text address as published by the source.
    pub address: String,
    /// Dispatch status.
    pub status: String,
    /// Latitude (WGS84), once geocoded.
    pub lat: Option<f64>,
    /// Longitude (WGS84), once geocoded.
    pub lng: Option<f64>,
    /// Address precision. `None` until the incident has been ingested.
    pub precision: Option<Precision>,
}

impl Incident {
    /// Builds a fresh, un-geocoded incident and derives its id.
    #[must_use]
    pub fn new(
        timestamp: String,
        category: String,
        incident_type: String,
        address: String,
        status: String,
    ) -> Self {
        let id = incident_id(&timestamp, &address, &incident_type);
        Self {
            id,
            timestamp,
            category,
            incident_type,
            address,
            status,
            lat: None,
            lng: None,
            precision: None,
        }
    }

    /// Returns the coordinates as `(lat, lng)` if both are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Derives the stable identifier of an incident.
///
/// Lowercase hex MD5 of `timestamp`, `address` and `incident_type`
/// concatenated without separators. Two rows with the same triple are the
/// same incident.
#[must_use]
pub fn incident_id(timestamp: &str, address: &str, incident_type: &str) -> String {
    let mut context = md5::Context::new();
    context.consume(timestamp.as_bytes());
    context.consume(address.as_bytes());
    context.consume(incident_type.as_bytes());
    format!("{:x}", context.finalize())
}

/// Sorts incidents by timestamp, newest first.
///
/// Timestamps are compared as plain strings.
pub fn sort_newest_first(incidents: &mut [Incident]) {
    incidents.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let a = incident_id("2024/05/01 10:00", "高雄市苓雅區建國一路100號", "火災");
        let b = incident_id("2024/05/01 10:00", "高雄市苓雅區建國一路100號", "火災");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn id_changes_with_any_field() {
        let base = incident_id("2024/05/01 10:00", "高雄市苓雅區", "火災");
        assert_ne!(base, incident_id("2024/05/01 10:01", "高雄市苓雅區", "火災"));
        assert_ne!(base, incident_id("2024/05/01 10:00", "高雄市前鎮區", "火災"));
        assert_ne!(base, incident_id("2024/05/01 10:00", "高雄市苓雅區", "救護"));
    }

    #[test]
    fn id_matches_md5_of_concatenation() {
        assert_eq!(
            incident_id("a", "b", "c"),
            format!("{:x}", md5::compute(b"abc"))
        );
    }

    #[test]
    fn district_only_is_area() {
        assert_eq!(Precision::classify("高雄市苓雅區"), Precision::Area);
    }

    #[test]
    fn street_address_is_point() {
        assert_eq!(
            Precision::classify("高雄市苓雅區建國一路100號"),
            Precision::Point
        );
        assert_eq!(
            Precision::classify("高雄市前鎮區中山二路和一心路"),
            Precision::Point
        );
    }

    #[test]
    fn address_without_district_is_point() {
        assert_eq!(Precision::classify("高雄市"), Precision::Point);
        assert_eq!(Precision::classify(""), Precision::Point);
    }

    #[test]
    fn serializes_with_source_field_names() {
        let mut incident = Incident::new(
            "2024/05/01 10:00".to_string(),
            "火災".to_string(),
            "建築物火災".to_string(),
            "高雄市苓雅區".to_string(),
            "處理中".to_string(),
        );
        incident.precision = Some(Precision::Area);

        let value = serde_json::to_value(&incident).unwrap();
        assert_eq!(value["type"], "建築物火災");
        assert_eq!(value["precision"], "area");
        assert!(value["lat"].is_null());
        assert!(value["lng"].is_null());
        assert!(value.get("incident_type").is_none());
    }

    #[test]
    fn sorts_by_string_timestamp_descending() {
        let make = |ts: &str| {
            Incident::new(
                ts.into(),
                String::new(),
                String::new(),
                ts.into(),
                String::new(),
            )
        };
        let mut incidents = vec![
            make("2024/05/01 09:00"),
            make("2024/05/02 08:00"),
            make("2024/04/30 23:59"),
        ];
        sort_newest_first(&mut incidents);

        let order: Vec<&str> = incidents.iter().map(|i| i.timestamp.as_str()).collect();
        assert_eq!(
            order,
            ["2024/05/02 08:00", "2024/05/01 09:00", "2024/04/30 23:59"]
        );
    }
}
