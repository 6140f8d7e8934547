/// CDC COVID Data Tracker county time-series client.
///
/// Handles URL construction, the HTTP GET (bounded by a timeout), and JSON
/// decoding of the integrated county time-series feed:
///   https://covid.cdc.gov/covid-data-tracker/COVIDData/getAjaxData
///
/// See `fixtures.rs` for annotated examples of the response structure.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::RunError;
use crate::ingest::FeedFetcher;
use crate::model::{FeedSnapshot, RegionId};

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

pub const FEED_BASE_URL: &str = "https://covid.cdc.gov/covid-data-tracker/COVIDData/getAjaxData";

/// Builds the feed URL for one county.
///
/// # Example
/// ```
/// use covmon_service::ingest::cdc::{build_feed_url, FEED_BASE_URL};
/// use covmon_service::model::RegionId;
///
/// let url = build_feed_url(FEED_BASE_URL, RegionId::new(17031).unwrap());
/// assert!(url.ends_with("id=integrated_county_timeseries_fips_17031_external"));
/// ```
pub fn build_feed_url(base_url: &str, region: RegionId) -> String {
    let dataset = format!("integrated_county_timeseries_fips_{}_external", region);
    format!(
        "{}?id={}",
        base_url.trim_end_matches('?'),
        urlencoding::encode(&dataset)
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Decodes a feed body into a `FeedSnapshot`, preserving record order.
///
/// # Errors
/// - `RunError::Decode` - malformed JSON, missing `runid`, a record array
///   that is not an array, or a record with an unparseable date.
pub fn parse_feed_response(json: &str) -> Result<FeedSnapshot, RunError> {
    serde_json::from_str(json)
        .map_err(|e| RunError::Decode(format!("JSON deserialization failed: {}", e)))
}

// ---------------------------------------------------------------------------
// HTTP fetcher
// ---------------------------------------------------------------------------

/// Blocking reqwest client for the feed.
pub struct HttpFeedFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpFeedFetcher {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RunError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunError::Network(format!("unable to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch(&self, region: RegionId) -> Result<FeedSnapshot, RunError> {
        let url = build_feed_url(&self.base_url, region);
        info!(%region, %url, "fetching feed");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| describe_transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RunError::Network(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .map_err(|e| RunError::Network(format!("unable to read body from {}: {}", url, e)))?;
        debug!(bytes = body.len(), "feed body received");

        let snapshot = parse_feed_response(&body)?;
        info!(
            generation = snapshot.generation_id,
            records = snapshot.records.len(),
            "feed decoded"
        );
        Ok(snapshot)
    }
}

fn describe_transport_error(url: &str, e: reqwest::Error) -> RunError {
    if e.is_timeout() {
        RunError::Network(format!("timed out waiting for {}", url))
    } else {
        RunError::Network(format!("no response from {}: {}", url, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
