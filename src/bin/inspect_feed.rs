#!/usr/bin/env rust
//! Feed Inspection
//!
//! Dumps the CDC county time-series for one county as the reconciler sees
//! it: one line per date after duplicate collapsing, followed by the
//! backward scan from today (or `--as-of`). Read-only: never touches the
//! state file and never sends messages.
//!
//! Usage:
//!   cargo run --bin inspect_feed -- --id 17031
//!   cargo run --bin inspect_feed -- --id 17031 --as-of 2024-01-10 --days 14

use chrono::Local;
use covmon_service::cli;
use covmon_service::config;
use covmon_service::ingest::FeedFetcher;
use covmon_service::ingest::cdc::HttpFeedFetcher;
use covmon_service::reconcile::{index_by_date, scan_backward, ScanStep};
use std::env;

const DEFAULT_DAYS: usize = 21;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    println!("🔎 Feed Inspection");
    println!("==================\n");

    // Split off --days before handing the rest to the shared parser
    let mut args: Vec<String> = env::args().skip(1).collect();
    let days = match args.iter().position(|a| a == "--days") {
        Some(i) => {
            let value = args.get(i + 1).ok_or("--days requires a value")?.parse::<usize>()?;
            args.drain(i..=i + 1);
            value
        }
        None => DEFAULT_DAYS,
    };

    let cli_args = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("{}\n  --days <N>           dates to print (default: {})", cli::USAGE, DEFAULT_DAYS);
            std::process::exit(e.exit_code());
        }
    };

    let service_config = config::load_config(&cli_args.config_path)?;
    let fetcher = HttpFeedFetcher::new(&service_config.feed.base_url, service_config.feed.timeout())?;

    let snapshot = fetcher.fetch(cli_args.region)?;
    let total = snapshot.records.len();
    let generation_id = snapshot.generation_id;
    let index = index_by_date(snapshot.records);

    println!("📋 Generation {}", generation_id);
    println!("   {} records, {} distinct dates ({} duplicates collapsed)\n",
        total, index.len(), total - index.len());

    for (date, record) in index.iter().rev().take(days) {
        println!(
            "   {}  {:>6}%  {:<12}  cases {:>10}  deaths {:>8}",
            date,
            record.percent_positive,
            record.community_transmission_level.as_deref().unwrap_or("-"),
            record.rolling_avg_new_cases,
            record.rolling_avg_new_deaths,
        );
    }

    let as_of = cli_args.as_of.unwrap_or_else(|| Local::now().date_naive());
    println!("\n🔙 Backward scan from {}", as_of);

    let (selected, report) = scan_backward(&index, as_of);
    for step in &report.steps {
        match step {
            ScanStep::NoData(date) => println!("   {} NO DATA", date),
            ScanStep::Placeholder(date, pct) => println!("   {} {}% (not yet populated)", date, pct),
            ScanStep::Selected(date, pct) => println!("   {} {}% ✓", date, pct),
        }
    }

    match selected {
        Some(record) => println!("\n✓ Would select {} ({}%)", record.date, record.percent_positive),
        None => println!("\n✗ No populated day within {} dates", report.examined()),
    }

    Ok(())
}
