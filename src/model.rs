/// Shared data types: the per-day `Record`, the fetched `FeedSnapshot`,
/// the persisted `RunState`, and the `RegionId` key.
///
/// Serde field names match the CDC integrated county time-series feed, so
/// the same `Record` type decodes the feed and flattens into the state file.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Region identifier
// ---------------------------------------------------------------------------

/// County FIPS code identifying the tracked region. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    pub fn new(id: u64) -> Result<Self, ConfigError> {
        if id == 0 {
            return Err(ConfigError::InvalidRegion(id.to_string()));
        }
        Ok(RegionId(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl FromStr for RegionId {
    type Err = ConfigError;

    /// Accepts a positive decimal integer. Zero, negatives and
    /// non-numeric input are all `InvalidRegion`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id: i64 = trimmed
            .parse()
            .map_err(|_| ConfigError::InvalidRegion(s.to_string()))?;
        if id <= 0 {
            return Err(ConfigError::InvalidRegion(s.to_string()));
        }
        RegionId::new(id as u64)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One day of observations for one county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Calendar day; the natural key.
    pub date: NaiveDate,

    #[serde(
        rename = "new_cases_7_day_rolling_average",
        default,
        deserialize_with = "lenient_text"
    )]
    pub rolling_avg_new_cases: String,

    #[serde(
        rename = "new_deaths_7_day_rolling_average",
        default,
        deserialize_with = "lenient_text"
    )]
    pub rolling_avg_new_deaths: String,

    /// 7-day percent positivity. `0.0` means "not yet populated".
    #[serde(
        rename = "percent_positive_7_day",
        default,
        deserialize_with = "null_as_zero"
    )]
    pub percent_positive: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_transmission_level: Option<String>,

    #[serde(
        rename = "report_date_window_start",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub report_window_start: Option<String>,

    #[serde(
        rename = "report_date_window_end",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub report_window_end: Option<String>,

    #[serde(rename = "county", default)]
    pub county_name: String,

    #[serde(default)]
    pub state: String,

    #[serde(rename = "fips_code")]
    pub region_id: i64,
}

impl Record {
    /// True once the feed has populated percent positivity for this day.
    pub fn is_populated(&self) -> bool {
        self.percent_positive > 0.0
    }
}

/// Rolling averages arrive as strings, numbers, or null depending on the
/// feed revision. Kept verbatim as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Num(serde_json::Number),
        Null(()),
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Str(s) => s,
        Text::Num(n) => n.to_string(),
        Text::Null(()) => String::new(),
    })
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

// ---------------------------------------------------------------------------
// Feed snapshot
// ---------------------------------------------------------------------------

/// One pull of the feed: its generation marker and records in feed order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedSnapshot {
    #[serde(rename = "runid")]
    pub generation_id: i64,

    #[serde(rename = "integrated_county_timeseries_external_data", default)]
    pub records: Vec<Record>,
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Durable state carried between runs for one region.
///
/// The zero value (`generation_id == 0`, no record) is what a first run
/// starts from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    /// Last generation fully processed.
    pub generation_id: i64,
    /// Record selected by that generation's run.
    pub last_selected: Option<Record>,
}
