/// Service configuration.
///
/// Two sources, kept separate:
///
/// - `covmon.toml` (optional) - feed endpoint, request timeout, state
///   directory and notification worker count. Every key has a default, so
///   the file may be absent or partial.
/// - Environment (optionally loaded from `.env`) - Twilio credentials and
///   phone numbers, assembled into an explicit `NotifierConfig` that is
///   handed to the notifier at construction.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::ingest::cdc::FEED_BASE_URL;

pub const DEFAULT_CONFIG_PATH: &str = "covmon.toml";

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_PHONE_FROM: &str = "TWILIO_PHONE_FROM";
pub const ENV_PHONE_TO: &str = "TWILIO_PHONE_TO";

// ---------------------------------------------------------------------------
// File configuration
// ---------------------------------------------------------------------------

/// Root of `covmon.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub feed: FeedConfig,
    pub state: StateConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    /// Upper bound on the whole feed request, connect through body.
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: FEED_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding `lastdata.<region>.json` files.
    pub dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    pub api_base_url: String,
    /// 1 sends sequentially; more dispatches on a worker pool.
    pub workers: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.twilio.com".to_string(),
            workers: 1,
        }
    }
}

/// Loads service configuration from `path`.
///
/// A missing file yields defaults.
///
/// # Errors
/// `ConfigError::ConfigFile` if the file exists but cannot be read or
/// parsed, or if it sets `timeout_secs` or `workers` to zero.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ServiceConfig::default()),
        Err(e) => return Err(file_error(path, e)),
    };
    parse_config(&contents).map_err(|reason| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_config(contents: &str) -> Result<ServiceConfig, String> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|e| e.to_string())?;

    if config.feed.timeout_secs == 0 {
        return Err("feed.timeout_secs must be at least 1".to_string());
    }
    if config.notify.workers == 0 {
        return Err("notify.workers must be at least 1".to_string());
    }
    Ok(config)
}

fn file_error(path: &Path, e: io::Error) -> ConfigError {
    ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Notifier configuration
// ---------------------------------------------------------------------------

/// Everything the notifier needs, with every field required.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifierConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub recipients: Vec<String>,
}

impl NotifierConfig {
    /// Reads the four `TWILIO_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    ///
    /// Empty values count as missing. `TWILIO_PHONE_TO` is split on commas,
    /// trimmed, and empty entries dropped; a list that ends up empty is
    /// reported as missing too.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingNotifierVar(name))
        };

        let account_sid = required(ENV_ACCOUNT_SID)?;
        let auth_token = required(ENV_AUTH_TOKEN)?;
        let from = required(ENV_PHONE_FROM)?;
        let recipients = parse_recipients(&required(ENV_PHONE_TO)?);

        if recipients.is_empty() {
            return Err(ConfigError::MissingNotifierVar(ENV_PHONE_TO));
        }

        Ok(Self {
            account_sid,
            auth_token,
            from,
            recipients,
        })
    }
}

/// Splits a comma-separated recipient list.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
