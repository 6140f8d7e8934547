/// One scheduled run for one region.
///
/// The runner owns the `RunState` for the duration of the run and drives:
/// 1. Load the previous state for the region
/// 2. Fetch the current feed snapshot
/// 3. Reconcile snapshot against state
/// 4. On a new selection: save state, then notify each recipient
///
/// Unchanged feeds end the run successfully without touching state. Every
/// other non-selection outcome is an error and leaves state as it was.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::{NotifierConfig, NotifyConfig};
use crate::error::{ConfigError, RunError};
use crate::ingest::FeedFetcher;
use crate::model::{Record, RegionId};
use crate::notify::twilio::TwilioSender;
use crate::notify::{DispatchReport, Notifier};
use crate::reconcile::{self, Outcome, ScanReport, ScanStep};
use crate::state::StateStore;

use std::sync::Arc;

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Successful end states of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    /// Feed generation matched stored state; nothing was done.
    Unchanged { generation_id: i64 },
    /// A new record was selected and saved. `dispatch` is `None` when
    /// notification is disabled.
    Selected {
        generation_id: i64,
        record: Record,
        dispatch: Option<DispatchReport>,
    },
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct Runner<F: FeedFetcher> {
    store: StateStore,
    fetcher: F,
    notifier: Option<Notifier>,
}

impl<F: FeedFetcher> Runner<F> {
    /// Runner without notification.
    pub fn new(store: StateStore, fetcher: F) -> Self {
        Self {
            store,
            fetcher,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Option<Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Executes one run for `region`, scanning back from `as_of`.
    ///
    /// # Errors
    /// Any `RunError` from loading, fetching, reconciling, or saving. State
    /// on disk is unchanged whenever an error is returned.
    pub fn run(&self, region: RegionId, as_of: NaiveDate) -> Result<RunReport, RunError> {
        let previous = self.store.load(region)?;
        debug!(%region, generation = previous.generation_id, "previous state");

        let snapshot = self.fetcher.fetch(region)?;
        let generation_id = snapshot.generation_id;

        let selection = match reconcile::reconcile(&previous, snapshot, as_of) {
            Outcome::Unchanged => {
                info!(%region, generation = generation_id, "no new data");
                return Ok(RunReport::Unchanged { generation_id });
            }
            Outcome::NotFound(scan) => {
                log_scan(&scan);
                return Err(RunError::NotFound {
                    as_of,
                    examined: scan.examined(),
                });
            }
            Outcome::Selected(selection) => selection,
        };

        log_scan(&selection.scan);
        let record = selection.record.clone();
        self.store.save(region, &selection.into_state())?;

        let dispatch = match &self.notifier {
            Some(notifier) => {
                let report = notifier.dispatch(&record);
                info!(
                    delivered = report.delivered(),
                    failed = report.failed(),
                    "notification dispatch complete"
                );
                Some(report)
            }
            None => {
                info!("notification disabled; skipping dispatch");
                None
            }
        };

        Ok(RunReport::Selected {
            generation_id,
            record,
            dispatch,
        })
    }
}

fn log_scan(scan: &ScanReport) {
    for step in &scan.steps {
        match step {
            ScanStep::NoData(date) => debug!(%date, "no data"),
            ScanStep::Placeholder(date, pct) => info!(%date, percent_positive = pct, "not yet populated"),
            ScanStep::Selected(date, pct) => info!(%date, percent_positive = pct, "selected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier wiring
// ---------------------------------------------------------------------------

/// Builds the Twilio-backed notifier, or `None` when notification is
/// disabled by missing configuration.
pub fn build_notifier(
    settings: &NotifyConfig,
    credentials: Result<NotifierConfig, ConfigError>,
) -> Option<Notifier> {
    let config = match credentials {
        Ok(config) => config,
        Err(e) => {
            warn!("{}", e);
            return None;
        }
    };

    match TwilioSender::new(&settings.api_base_url, &config) {
        Ok(sender) => Some(Notifier::with_workers(
            Arc::new(sender),
            config.recipients,
            settings.workers,
        )),
        Err(e) => {
            warn!(error = %e, "unable to build Twilio client; notification disabled");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
