#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! JSON file persistence for the fire incident map.
//!
//! Two collections are stored as pretty-printed JSON files:
//!
//! - the incident list (`data.json`), a JSON array of [`Incident`]s
//! - the geocode cache (`location_cache.json`), a JSON object mapping a raw
//!   address to a `[lat, lng]` pair
//!
//! Loading never fails: a missing or unparseable file yields an empty
//! collection. Saving always overwrites the whole file, going through a
//! temporary sibling and a rename so the previous contents survive a failed
//! write.

pub mod paths;

use std::path::{Path, PathBuf};

pub use fire_map_incident_models::GeocodeCache;

use fire_map_incident_models::Incident;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors from writing a store file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing or renaming the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the collection failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Locations of the two store files.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Incident list path.
    pub incidents_path: PathBuf,
    /// Geocode cache path.
    pub cache_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            incidents_path: paths::incidents_path(),
            cache_path: paths::geocode_cache_path(),
        }
    }
}

impl StoreConfig {
    /// Places both files in `dir` under their default names.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            incidents_path: dir.join(paths::INCIDENTS_FILE),
            cache_path: dir.join(paths::GEOCODE_CACHE_FILE),
        }
    }
}

/// Loads a JSON collection, substituting `T::default()` when the file is
/// missing or cannot be parsed.
#[must_use]
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("{} does not exist, starting empty", path.display());
            return T::default();
        }
        Err(e) => {
            log::warn!("Failed to read {}: {e}; starting empty", path.display());
            return T::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to parse {}: {e}; starting empty", path.display());
            T::default()
        }
    }
}

/// Loads the persisted incident list.
#[must_use]
pub fn load_incidents(path: &Path) -> Vec<Incident> {
    load_or_default(path)
}

/// Loads the persisted geocode cache.
#[must_use]
pub fn load_geocode_cache(path: &Path) -> GeocodeCache {
    load_or_default(path)
}

/// Serializes `data` as pretty-printed JSON and atomically replaces `path`.
///
/// Creates the parent directory if needed.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization, the temporary write, or the
/// final rename fails.
pub fn save<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        paths::ensure_dir(parent)?;
    }

    let contents = serde_json::to_string_pretty(data)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;

    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
