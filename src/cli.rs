/// Command-line parsing for the `covmon_service` binary.
///
/// ```text
/// covmon_service --id <FIPS> [--as-of YYYY-MM-DD] [--config PATH]
/// ```
///
/// A missing or non-positive region id is a no-op (usage, exit 0) so a
/// misconfigured scheduler entry does not page anyone. That holds even when
/// other arguments on the same line are malformed.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::model::RegionId;

pub const USAGE: &str = "Usage: covmon_service --id <FIPS> [--as-of YYYY-MM-DD] [--config PATH]\n\
    \n\
    \x20 --id <FIPS>          county FIPS code to track (required, positive)\n\
    \x20 --as-of <DATE>       scan back from DATE instead of today\n\
    \x20 --config <PATH>      service config file (default: covmon.toml)";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub region: RegionId,
    pub as_of: Option<NaiveDate>,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliError {
    /// `--id` missing, non-numeric, or not positive. Exit 0.
    MissingRegion,
    /// `--help` requested. Exit 0.
    Help,
    /// Anything else the parser cannot accept. Exit 2.
    Invalid(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::MissingRegion | CliError::Help => 0,
            CliError::Invalid(_) => 2,
        }
    }
}

/// Parses arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs, CliError> {
    let mut region: Option<RegionId> = None;
    let mut as_of: Option<NaiveDate> = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    // First rejection is held back until the region has been checked.
    let mut invalid: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let (flag, inline) = match args[i].split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (args[i].as_str(), None),
        };

        match flag {
            "-h" | "--help" => return Err(CliError::Help),
            "--id" | "-id" | "--as-of" | "--config" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        args.get(i).cloned()
                    }
                };

                match (flag, value) {
                    ("--as-of", Some(value)) => {
                        match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                            Ok(date) => as_of = Some(date),
                            Err(_) => {
                                invalid.get_or_insert(format!(
                                    "--as-of expects YYYY-MM-DD, got '{}'",
                                    value
                                ));
                            }
                        }
                    }
                    ("--config", Some(value)) => config_path = PathBuf::from(value),
                    ("--id" | "-id", value) => {
                        region = value.and_then(|v| v.parse().ok());
                    }
                    (flag, None) => {
                        invalid.get_or_insert(format!("{} requires a value", flag));
                    }
                    _ => {}
                }
            }
            other => {
                invalid.get_or_insert(format!("unknown argument: {}", other));
            }
        }
        i += 1;
    }

    let region = region.ok_or(CliError::MissingRegion)?;
    if let Some(msg) = invalid {
        return Err(CliError::Invalid(msg));
    }
    Ok(CliArgs {
        region,
        as_of,
        config_path,
    })
}
