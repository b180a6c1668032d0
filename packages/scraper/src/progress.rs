//! Progress hooks for an ingestion run.
//!
//! The run reports how many new incidents it is about to geocode and then
//! one step per incident. How that is shown (a terminal bar, nothing at all)
//! is up to the implementor.

/// Receives progress from the geocoding phase of an ingestion run.
pub trait ProgressCallback: Send + Sync {
    /// Number of new incidents that will be geocoded.
    fn set_total(&self, total: u64);

    /// One incident at `address` has been handled.
    fn advance(&self, address: &str);

    /// The phase is over.
    fn finish(&self, summary: String);
}
