/// Error taxonomy for a single service run.
///
/// Every fatal failure surfaces as a `RunError` variant with its own exit
/// path; nothing is silently discarded. `NotificationError` is the only
/// category the runner swallows, and it does so per recipient.

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Configuration problems detected before or during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A Twilio environment variable is missing or empty. Disables
    /// notification but does not fail the run.
    MissingNotifierVar(&'static str),
    /// Region identifier missing, not a number, or not positive.
    InvalidRegion(String),
    /// The TOML configuration file exists but could not be read or parsed.
    ConfigFile { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingNotifierVar(name) => {
                write!(f, "{} is not set; notification disabled.\n\n", name)?;
                write!(f, "  Required for SMS delivery:\n")?;
                write!(f, "  TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN (credentials)\n")?;
                write!(f, "  TWILIO_PHONE_FROM, TWILIO_PHONE_TO (comma-separated recipients)")
            }
            ConfigError::InvalidRegion(raw) => {
                write!(f, "Invalid region id '{}': expected a positive integer", raw)
            }
            ConfigError::ConfigFile { path, reason } => {
                write!(f, "Failed to load config {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Run errors
// ---------------------------------------------------------------------------

/// Fatal outcomes of a run. None of them leave persisted state modified.
#[derive(Debug)]
pub enum RunError {
    Config(ConfigError),
    /// Feed unreachable, timed out, or answered with a non-success status.
    Network(String),
    /// Feed body did not match the expected shape.
    Decode(String),
    /// An existing state file could not be read or parsed.
    CorruptState { path: PathBuf, reason: String },
    /// The backward scan exhausted its bound without a usable record.
    NotFound { as_of: NaiveDate, examined: usize },
    /// Writing the state file failed; the previous file is intact.
    Persistence { path: PathBuf, reason: String },
}

impl RunError {
    /// Process exit status for this failure. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Config(_) => 2,
            RunError::Network(_) | RunError::Decode(_) => 3,
            RunError::CorruptState { .. } | RunError::Persistence { .. } => 4,
            RunError::NotFound { .. } => 5,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "configuration error: {}", e),
            RunError::Network(msg) => {
                write!(f, "feed request failed: {}\n\n", msg)?;
                write!(f, "  State was not modified; the next scheduled run will retry.")
            }
            RunError::Decode(msg) => write!(f, "feed response could not be decoded: {}", msg),
            RunError::CorruptState { path, reason } => {
                write!(f, "state file {} is corrupt: {}\n\n", path.display(), reason)?;
                write!(f, "  Inspect or remove the file to start from an empty state.")
            }
            RunError::NotFound { as_of, examined } => write!(
                f,
                "no day with a populated percent positive found scanning back from {} ({} days examined)",
                as_of, examined
            ),
            RunError::Persistence { path, reason } => {
                write!(f, "unable to write state file {}: {}\n\n", path.display(), reason)?;
                write!(f, "  The previous state file was left intact.")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Delivery failure for a single recipient. Logged, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationError {
    /// Request never produced a response (DNS, TLS, timeout, ...).
    Transport(String),
    /// Provider answered with an error status.
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    /// Provider answered 2xx but the body was not understood.
    Decode(String),
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::Transport(msg) => write!(f, "transport error: {}", msg),
            NotificationError::Rejected { status, code, message } => match code {
                Some(code) => write!(f, "rejected ({} / code {}): {}", status, code, message),
                None => write!(f, "rejected ({}): {}", status, message),
            },
            NotificationError::Decode(msg) => write!(f, "unreadable provider response: {}", msg),
        }
    }
}

impl std::error::Error for NotificationError {}
