//! Ingestion configuration.
//!
//! Built-in defaults live in `config/default.toml` and are embedded at
//! compile time. An optional user TOML file is deep-merged over them, then
//! environment overrides are applied:
//!
//! - `FIRE_MAP_SOURCE_URL` replaces `source.url`
//! - `FIRE_MAP_DATA_DIR` relocates both store files (see
//!   [`fire_map_store::paths`])

use std::path::Path;

use fire_map_geocoder::GeocoderConfig;
use fire_map_scraper::SourceConfig;
use fire_map_store::StoreConfig;
use serde::Deserialize;

use crate::IngestError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Everything one ingestion run needs.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Dispatch page location and layout.
    pub source: SourceConfig,
    /// Geocoding service, pacing and bounds.
    pub geocoder: GeocoderConfig,
    /// Store file locations.
    #[serde(default)]
    pub store: StoreConfig,
}

impl IngestConfig {
    /// Loads the built-in defaults, merges `path` over them if given, and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the file cannot be read or the
    /// merged configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, IngestError> {
        let overlay = path
            .map(|p| {
                std::fs::read_to_string(p).map_err(|e| IngestError::Config {
                    message: format!("failed to read {}: {e}", p.display()),
                })
            })
            .transpose()?;

        let mut config = Self::from_toml(overlay.as_deref())?;

        if let Ok(url) = std::env::var("FIRE_MAP_SOURCE_URL") {
            log::debug!("Using source URL from FIRE_MAP_SOURCE_URL");
            config.source.url = url;
        }

        Ok(config)
    }

    /// Parses the built-in defaults with an optional TOML overlay.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if either document is not valid TOML
    /// or the merged result does not describe a configuration.
    pub fn from_toml(overlay: Option<&str>) -> Result<Self, IngestError> {
        let mut base = parse_table(DEFAULT_CONFIG)?;
        if let Some(overlay) = overlay {
            merge_tables(&mut base, parse_table(overlay)?);
        }

        toml::Value::Table(base)
            .try_into()
            .map_err(|e| IngestError::Config {
                message: e.to_string(),
            })
    }
}

fn parse_table(contents: &str) -> Result<toml::Table, IngestError> {
    contents
        .parse::<toml::Table>()
        .map_err(|e| IngestError::Config {
            message: e.to_string(),
        })
}

/// Recursively merges `overlay` into `base`. Nested tables merge key by key;
/// any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fire_map_geocoder::BoundingBox;

    use super::*;

    #[test]
    fn builtin_defaults_parse() {
        let config = IngestConfig::from_toml(None).unwrap();

        assert!(config.source.url.starts_with("https://119dts.fdkc.gov.tw/"));
        assert!(config.source.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.source.table.table_selector, "table.tablelist");
        assert_eq!(config.source.table.row_classes, ["table_tr1", "table_tr2"]);
        assert_eq!(config.geocoder, GeocoderConfig::default());
        assert_eq!(config.geocoder.bounds, BoundingBox::KAOHSIUNG);
    }

    #[test]
    fn overlay_replaces_only_given_keys() {
        let overlay = r#"
            [geocoder]
            success_delay_ms = 0

            [geocoder.bounds]
            max_lat = 24.0
        "#;

        let config = IngestConfig::from_toml(Some(overlay)).unwrap();

        assert_eq!(config.geocoder.success_delay_ms, 0);
        assert_eq!(config.geocoder.error_delay_ms, 1000);
        assert!((config.geocoder.bounds.max_lat - 24.0).abs() < f64::EPSILON);
        assert!((config.geocoder.bounds.min_lat - 22.0).abs() < f64::EPSILON);
        assert_eq!(config.geocoder.city, "高雄市");
    }

    #[test]
    fn overlay_can_set_store_paths() {
        let overlay = r#"
            [store]
            incidents_path = "/srv/fire/data.json"
            cache_path = "/srv/fire/location_cache.json"
        "#;

        let config = IngestConfig::from_toml(Some(overlay)).unwrap();

        assert_eq!(
            config.store,
            StoreConfig::in_dir(Path::new("/srv/fire"))
        );
    }

    #[test]
    fn invalid_overlay_is_a_config_error() {
        assert!(matches!(
            IngestConfig::from_toml(Some("[geocoder")),
            Err(IngestError::Config { .. })
        ));
        assert!(matches!(
            IngestConfig::from_toml(Some("[geocoder]\ntimeout_secs = \"soon\"")),
            Err(IngestError::Config { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let path = std::env::temp_dir().join("fire_map_ingest_missing_config.toml");
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            IngestConfig::load(Some(&path)),
            Err(IngestError::Config { .. })
        ));
    }
}
