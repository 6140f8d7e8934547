/// Feed ingestion.
///
/// Submodules:
/// - `cdc` - CDC county time-series URL construction, HTTP fetch, JSON decoding.
/// - `fixtures` (test only) - representative feed payloads.

pub mod cdc;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::error::RunError;
use crate::model::{FeedSnapshot, RegionId};

/// Source of feed snapshots for a region.
///
/// Implemented by `cdc::HttpFeedFetcher`; tests substitute canned snapshots.
pub trait FeedFetcher {
    fn fetch(&self, region: RegionId) -> Result<FeedSnapshot, RunError>;
}
