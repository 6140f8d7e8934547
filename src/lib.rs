/// covmon_service: county COVID test-positivity monitor.
///
/// # Module structure
///
/// ```text
/// covmon_service
/// ├── model       - shared data types (Record, FeedSnapshot, RunState, RegionId)
/// ├── error       - RunError / ConfigError / NotificationError taxonomy
/// ├── config      - covmon.toml loader + Twilio NotifierConfig from env
/// ├── cli         - argument parsing for the covmon_service binary
/// ├── ingest
/// │   ├── cdc     - CDC county time-series: URL construction, fetch, JSON decoding
/// │   └── fixtures (test only) - representative feed payloads
/// ├── reconcile   - generation gate, date index, backward scan
/// ├── state       - per-region state file with atomic save
/// ├── notify
/// │   └── twilio  - SMS delivery through the Twilio REST API
/// └── runner      - load → fetch → reconcile → save → notify
/// ```

/// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod runner;
pub mod state;
