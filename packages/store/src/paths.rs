#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the JSON data directory.
//!
//! The data directory defaults to `data/` under the project root and can be
//! relocated with the `FIRE_MAP_DATA_DIR` environment variable.

use std::path::{Path, PathBuf};

/// File name of the persisted incident list.
pub const INCIDENTS_FILE: &str = "data.json";

/// File name of the persisted geocode cache.
pub const GEOCODE_CACHE_FILE: &str = "location_cache.json";

/// Returns the workspace root directory, two levels above this crate's
/// manifest. Falls back to the current directory when the crate is built
/// outside the workspace.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the data directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os("FIRE_MAP_DATA_DIR")
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the default path of the incident list.
#[must_use]
pub fn incidents_path() -> PathBuf {
    data_dir().join(INCIDENTS_FILE)
}

/// Returns the default path of the geocode cache.
#[must_use]
pub fn geocode_cache_path() -> PathBuf {
    data_dir().join(GEOCODE_CACHE_FILE)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_files_share_the_data_dir() {
        let incidents = incidents_path();
        let cache = geocode_cache_path();

        assert_eq!(incidents.file_name().unwrap(), INCIDENTS_FILE);
        assert_eq!(cache.file_name().unwrap(), GEOCODE_CACHE_FILE);
        assert_eq!(incidents.parent(), cache.parent());
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = std::env::temp_dir().join("fire_map_store_paths_test/a/b");
        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("fire_map_store_paths_test"));

        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();

        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(std::env::temp_dir().join("fire_map_store_paths_test"));
    }
}
