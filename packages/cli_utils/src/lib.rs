#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the fire map binaries: logger setup and an
//! `indicatif` rendering of [`ProgressCallback`].

use std::sync::Arc;
use std::time::Duration;

use fire_map_scraper::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Geocoding progress drawn as an `indicatif` bar.
///
/// Spins until the number of new incidents is known, then shows a bar with
/// the address currently being resolved.
pub struct GeocodeProgress {
    bar: ProgressBar,
    counted: ProgressStyle,
}

impl GeocodeProgress {
    /// Adds a spinner labelled `label` to `multi`.
    #[must_use]
    pub fn attach(multi: &MultiProgress, label: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.red} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(label.to_string());

        let counted = ProgressStyle::with_template(
            "{prefix} [{bar:30.red/dim}] {pos}/{len} {elapsed} {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Arc::new(Self { bar, counted })
    }
}

impl ProgressCallback for GeocodeProgress {
    fn set_total(&self, total: u64) {
        if total == 0 {
            self.bar.finish_and_clear();
            return;
        }
        self.bar.set_length(total);
        self.bar.set_style(self.counted.clone());
    }

    fn advance(&self, address: &str) {
        self.bar.set_message(address.to_string());
        self.bar.inc(1);
    }

    fn finish(&self, summary: String) {
        if self.bar.is_finished() {
            return;
        }
        self.bar.finish_with_message(summary);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`, so log lines are printed above any live bars
/// instead of through them.
///
/// Every bar must be added to the returned [`MultiProgress`].
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_timed_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
