//! County COVID Positivity Monitor - scheduled run entry point
//!
//! One invocation per scheduled tick:
//! 1. Loads the last processed feed generation for the county
//! 2. Fetches the CDC county time-series feed
//! 3. Stops early if the feed has not changed
//! 4. Selects the newest day with a populated percent positive
//! 5. Saves the selection and texts it to the configured recipients
//!
//! Usage:
//!   cargo run --release -- --id 17031
//!   cargo run --release -- --id 17031 --as-of 2024-01-10
//!
//! Environment:
//!   TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN - Twilio credentials
//!   TWILIO_PHONE_FROM                     - sending number
//!   TWILIO_PHONE_TO                       - comma-separated recipients
//!   RUST_LOG                              - log filter (default: info)

use chrono::Local;
use covmon_service::cli::{self, CliError};
use covmon_service::config::{self, NotifierConfig};
use covmon_service::error::RunError;
use covmon_service::ingest::cdc::HttpFeedFetcher;
use covmon_service::runner::{self, RunReport, Runner};
use covmon_service::state::StateStore;
use std::env;
use std::process;

fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli_args = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(CliError::Invalid(msg)) => {
            eprintln!("Error: {}\n\n{}", msg, cli::USAGE);
            process::exit(CliError::Invalid(msg).exit_code());
        }
        Err(e) => {
            if e == CliError::MissingRegion {
                println!("--id <FIPS> is required.\n");
            }
            println!("{}", cli::USAGE);
            process::exit(e.exit_code());
        }
    };

    let service_config = match config::load_config(&cli_args.config_path).map_err(RunError::from) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(e.exit_code());
        }
    };

    let fetcher = match HttpFeedFetcher::new(&service_config.feed.base_url, service_config.feed.timeout()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("❌ {}", e);
            process::exit(e.exit_code());
        }
    };

    let notifier = runner::build_notifier(&service_config.notify, NotifierConfig::from_env());
    let runner = Runner::new(StateStore::new(&service_config.state.dir), fetcher)
        .with_notifier(notifier);

    let as_of = cli_args.as_of.unwrap_or_else(|| Local::now().date_naive());
    println!("🦠 County {} - scanning back from {}", cli_args.region, as_of);

    match runner.run(cli_args.region, as_of) {
        Ok(RunReport::Unchanged { generation_id }) => {
            println!("✓ No new data (generation {})", generation_id);
        }
        Ok(RunReport::Selected { record, dispatch, .. }) => {
            println!(
                "✓ {} {}% - {}",
                record.date,
                record.percent_positive,
                record.community_transmission_level.as_deref().unwrap_or("unknown")
            );
            match dispatch {
                Some(report) => println!(
                    "📨 Sent {} of {} messages",
                    report.delivered(),
                    report.deliveries.len()
                ),
                None => println!("📭 Notification disabled"),
            }
        }
        Err(e) => {
            eprintln!("\n❌ Run failed: {}\n", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
