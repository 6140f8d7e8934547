/// Reconciliation of a fetched feed against the previous run's state.
///
/// `reconcile` is pure: it takes the loaded `RunState`, a `FeedSnapshot`
/// and the day to scan back from, and decides one of three outcomes:
///
/// - `Unchanged` - the feed's generation marker equals the stored one.
/// - `Selected`  - the newest day with a populated percent positive.
/// - `NotFound`  - the backward scan ran out of bound without a match.
///
/// The feed publishes a day's row before all of its metrics are final
/// (percent positive stays at `0.0` until then), so the newest *present*
/// day is often not the newest *complete* one. The scan walks back from
/// `as_of` past gaps and placeholders until it finds a populated day.

use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

use crate::model::{FeedSnapshot, Record, RunState};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// What happened at one date during the backward scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    /// No record for this date in the feed.
    NoData(NaiveDate),
    /// A record exists but percent positive is not populated yet.
    Placeholder(NaiveDate, f64),
    /// The record chosen by the scan.
    Selected(NaiveDate, f64),
}

/// Every date the scan examined, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    pub steps: Vec<ScanStep>,
}

impl ScanReport {
    pub fn examined(&self) -> usize {
        self.steps.len()
    }
}

/// A successful selection from a new feed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub generation_id: i64,
    pub record: Record,
    pub scan: ScanReport,
}

impl Selection {
    /// The state to persist for this selection.
    pub fn into_state(self) -> RunState {
        RunState {
            generation_id: self.generation_id,
            last_selected: Some(self.record),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Unchanged,
    Selected(Selection),
    NotFound(ScanReport),
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

/// Collapses feed records into a map keyed by date.
///
/// Records are inserted in feed order, so when the feed repeats a date the
/// last one encountered wins.
pub fn index_by_date(records: Vec<Record>) -> BTreeMap<NaiveDate, Record> {
    let mut index = BTreeMap::new();
    for record in records {
        index.insert(record.date, record);
    }
    index
}

// ---------------------------------------------------------------------------
// Backward scan
// ---------------------------------------------------------------------------

/// Walks back one day at a time from `as_of` and returns the first record
/// whose percent positive is populated.
///
/// At most `index.len() + 1` dates are examined. The report lists every
/// examined date whether or not a record was found.
pub fn scan_backward(
    index: &BTreeMap<NaiveDate, Record>,
    as_of: NaiveDate,
) -> (Option<&Record>, ScanReport) {
    let bound = index.len() + 1;
    let mut report = ScanReport::default();
    let mut day = Some(as_of);

    while let Some(date) = day {
        if report.examined() >= bound {
            break;
        }

        match index.get(&date) {
            None => report.steps.push(ScanStep::NoData(date)),
            Some(record) if !record.is_populated() => {
                report
                    .steps
                    .push(ScanStep::Placeholder(date, record.percent_positive));
            }
            Some(record) => {
                report
                    .steps
                    .push(ScanStep::Selected(date, record.percent_positive));
                return (Some(record), report);
            }
        }

        day = date.checked_sub_days(Days::new(1));
    }

    (None, report)
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Decides what a run should do with a freshly fetched snapshot.
///
/// Never mutates `previous`; on `Selected` the caller persists
/// `Selection::into_state()` and notifies.
pub fn reconcile(previous: &RunState, snapshot: FeedSnapshot, as_of: NaiveDate) -> Outcome {
    if snapshot.generation_id == previous.generation_id {
        return Outcome::Unchanged;
    }

    let generation_id = snapshot.generation_id;
    let index = index_by_date(snapshot.records);

    match scan_backward(&index, as_of) {
        (Some(record), scan) => Outcome::Selected(Selection {
            generation_id,
            record: record.clone(),
            scan,
        }),
        (None, scan) => Outcome::NotFound(scan),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
