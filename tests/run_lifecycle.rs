/// Integration tests for the scheduled-run lifecycle
///
/// These tests drive the public `Runner` across several consecutive
/// invocations, the way cron would, and verify:
/// 1. First run selects, persists and notifies
/// 2. An unchanged feed generation is a cheap no-op
/// 3. A new generation advances state and notifies again
/// 4. Failures (network, decode, not found) never touch persisted state
/// 5. Per-recipient notification failures are isolated
///
/// No network access is needed: the feed and SMS provider are replaced by
/// in-memory fakes behind the `FeedFetcher` and `MessageSender` traits.

use chrono::NaiveDate;
use covmon_service::error::{NotificationError, RunError};
use covmon_service::ingest::FeedFetcher;
use covmon_service::model::{FeedSnapshot, Record, RegionId, RunState};
use covmon_service::notify::{MessageSender, Notifier};
use covmon_service::runner::{RunReport, Runner};
use covmon_service::state::StateStore;
use std::cell::RefCell;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Serves queued responses in order, one per fetch.
struct ScriptedFeed {
    responses: RefCell<Vec<Result<FeedSnapshot, RunError>>>,
}

impl ScriptedFeed {
    fn new(mut responses: Vec<Result<FeedSnapshot, RunError>>) -> Self {
        responses.reverse();
        Self { responses: RefCell::new(responses) }
    }
}

impl FeedFetcher for ScriptedFeed {
    fn fetch(&self, _region: RegionId) -> Result<FeedSnapshot, RunError> {
        self.responses
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| Err(RunError::Network("script exhausted".to_string())))
    }
}

#[derive(Default)]
struct FakeSms {
    sent: Mutex<Vec<(String, String)>>,
    fail_for: Vec<String>,
}

impl FakeSms {
    fn failing_for(numbers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail_for: numbers.iter().map(|n| n.to_string()).collect(),
        })
    }

    fn attempted(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, body)| body.clone()).collect()
    }
}

impl MessageSender for FakeSms {
    fn send(&self, to: &str, body: &str) -> Result<String, NotificationError> {
        self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
        if self.fail_for.iter().any(|n| n == to) {
            return Err(NotificationError::Transport("connection reset".to_string()));
        }
        Ok(format!("SM{:04}", self.sent.lock().unwrap().len()))
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).expect("valid January date")
}

fn record(d: u32, percent_positive: f64, level: &str) -> Record {
    Record {
        date: day(d),
        rolling_avg_new_cases: "120.5".to_string(),
        rolling_avg_new_deaths: "1.2".to_string(),
        percent_positive,
        community_transmission_level: Some(level.to_string()),
        report_window_start: None,
        report_window_end: None,
        county_name: "Peoria County".to_string(),
        state: "Illinois".to_string(),
        region_id: 17143,
    }
}

fn snapshot(generation_id: i64, records: Vec<Record>) -> FeedSnapshot {
    FeedSnapshot { generation_id, records }
}

fn region() -> RegionId {
    RegionId::new(17143).expect("positive FIPS code")
}

fn recipients() -> Vec<String> {
    vec!["+15550000001".into(), "+15550000002".into(), "+15550000003".into()]
}

// ---------------------------------------------------------------------------
// 1. Consecutive scheduled runs
// ---------------------------------------------------------------------------

#[test]
fn test_three_scheduled_runs_select_skip_then_advance() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let sms = FakeSms::failing_for(&[]);

    let first = snapshot(500, vec![
        record(8, 6.1, "substantial"),
        record(9, 5.4, "substantial"),
        record(10, 0.0, "substantial"),
    ]);
    let second = first.clone();
    let third = snapshot(501, vec![
        record(8, 6.1, "substantial"),
        record(9, 5.4, "substantial"),
        record(10, 4.8, "moderate"),
    ]);

    let runner = Runner::new(store.clone(), ScriptedFeed::new(vec![Ok(first), Ok(second), Ok(third)]))
        .with_notifier(Some(Notifier::new(sms.clone(), recipients())));

    // Run 1: 01-10 is a placeholder, 01-09 is selected
    let report = runner.run(region(), day(10)).expect("first run");
    assert!(matches!(
        &report,
        RunReport::Selected { record, .. } if record.date == day(9)
    ));
    assert_eq!(sms.attempted().len(), 3);

    // Run 2: same generation, nothing happens
    let before = fs::read(store.path_for(region())).unwrap();
    let report = runner.run(region(), day(10)).expect("second run");
    assert_eq!(report, RunReport::Unchanged { generation_id: 500 });
    assert_eq!(fs::read(store.path_for(region())).unwrap(), before, "state untouched");
    assert_eq!(sms.attempted().len(), 3, "no messages on unchanged feed");

    // Run 3: feed advanced and 01-10 is now populated
    let report = runner.run(region(), day(10)).expect("third run");
    assert!(matches!(
        &report,
        RunReport::Selected { generation_id: 501, record, .. } if record.date == day(10)
    ));
    assert_eq!(sms.attempted().len(), 6);
    assert!(sms.bodies()[5].contains("2024-01-10 - 4.8% - moderate"));

    let state = store.load(region()).unwrap();
    assert_eq!(state.generation_id, 501);
    assert_eq!(state.last_selected.map(|r| r.percent_positive), Some(4.8));
}

// ---------------------------------------------------------------------------
// 2. Failure paths leave state alone
// ---------------------------------------------------------------------------

#[test]
fn test_network_failure_leaves_state_and_sends_nothing() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let seeded = RunState { generation_id: 77, last_selected: Some(record(5, 3.3, "low")) };
    store.save(region(), &seeded).unwrap();
    let before = fs::read(store.path_for(region())).unwrap();

    let sms = FakeSms::failing_for(&[]);
    let runner = Runner::new(
        store.clone(),
        ScriptedFeed::new(vec![Err(RunError::Network("timed out".to_string()))]),
    )
    .with_notifier(Some(Notifier::new(sms.clone(), recipients())));

    let result = runner.run(region(), day(10));

    assert!(matches!(result, Err(RunError::Network(_))));
    assert!(result.unwrap_err().exit_code() != 0);
    assert_eq!(fs::read(store.path_for(region())).unwrap(), before);
    assert!(sms.attempted().is_empty());
}

#[test]
fn test_not_found_keeps_previous_selection() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let seeded = RunState { generation_id: 77, last_selected: Some(record(5, 3.3, "low")) };
    store.save(region(), &seeded).unwrap();

    let sms = FakeSms::failing_for(&[]);
    let all_placeholders = snapshot(78, vec![
        record(10, 0.0, "low"),
        record(9, 0.0, "low"),
        record(8, 0.0, "low"),
    ]);
    let runner = Runner::new(store.clone(), ScriptedFeed::new(vec![Ok(all_placeholders)]))
        .with_notifier(Some(Notifier::new(sms.clone(), recipients())));

    let result = runner.run(region(), day(10));

    assert!(
        matches!(result, Err(RunError::NotFound { examined: 4, .. })),
        "three placeholders should exhaust a four-date scan, got {:?}",
        result
    );
    assert_eq!(store.load(region()).unwrap(), seeded);
    assert!(sms.attempted().is_empty(), "notifier must not run on NotFound");
}

#[test]
fn test_not_found_then_recovery_on_next_generation() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());

    let runner = Runner::new(
        store.clone(),
        ScriptedFeed::new(vec![
            Ok(snapshot(10, vec![record(10, 0.0, "low")])),
            Ok(snapshot(11, vec![record(10, 0.0, "low"), record(9, 2.2, "low")])),
        ]),
    );

    assert!(runner.run(region(), day(10)).is_err());
    assert_eq!(store.load(region()).unwrap(), RunState::default());

    // Generation 10 was never persisted, so 11 is processed normally.
    let report = runner.run(region(), day(10)).expect("recovers");
    assert!(matches!(report, RunReport::Selected { generation_id: 11, .. }));
}

// ---------------------------------------------------------------------------
// 3. Notification isolation
// ---------------------------------------------------------------------------

#[test]
fn test_second_recipient_failure_does_not_affect_others_or_run() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let sms = FakeSms::failing_for(&["+15550000002"]);

    let runner = Runner::new(
        store.clone(),
        ScriptedFeed::new(vec![Ok(snapshot(900, vec![record(9, 5.4, "substantial")]))]),
    )
    .with_notifier(Some(Notifier::new(sms.clone(), recipients())));

    let report = runner.run(region(), day(10)).expect("run succeeds despite a failed recipient");

    assert_eq!(sms.attempted(), recipients(), "all three recipients attempted in order");
    let RunReport::Selected { dispatch: Some(dispatch), .. } = report else {
        panic!("expected a selection with a dispatch report");
    };
    assert_eq!(dispatch.delivered(), 2);
    assert_eq!(dispatch.failed(), 1);
    assert_eq!(dispatch.deliveries[1].recipient, "+15550000002");
    assert_eq!(store.load(region()).unwrap().generation_id, 900, "state saved before dispatch");
}

#[test]
fn test_message_template_content() {
    let dir = tempdir().unwrap();
    let sms = FakeSms::failing_for(&[]);
    let runner = Runner::new(
        StateStore::new(dir.path()),
        ScriptedFeed::new(vec![Ok(snapshot(1, vec![record(9, 5.4, "substantial")]))]),
    )
    .with_notifier(Some(Notifier::new(sms.clone(), vec!["+15550000009".into()])));

    runner.run(region(), day(10)).unwrap();

    assert_eq!(
        sms.bodies(),
        vec!["Peoria County, Illinois\n2024-01-09 - 5.4% - substantial\n".to_string()]
    );
}

#[test]
fn test_disabled_notification_still_persists_state() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let runner = Runner::new(
        store.clone(),
        ScriptedFeed::new(vec![Ok(snapshot(3, vec![record(10, 1.1, "low")]))]),
    )
    .with_notifier(None);

    let report = runner.run(region(), day(10)).unwrap();

    assert!(matches!(report, RunReport::Selected { dispatch: None, .. }));
    assert_eq!(store.load(region()).unwrap().generation_id, 3);
}

// ---------------------------------------------------------------------------
// 4. Per-region isolation
// ---------------------------------------------------------------------------

#[test]
fn test_state_files_are_scoped_per_region() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let other = RegionId::new(17031).unwrap();

    let runner = Runner::new(
        store.clone(),
        ScriptedFeed::new(vec![Ok(snapshot(42, vec![record(10, 1.1, "low")]))]),
    );
    runner.run(region(), day(10)).unwrap();

    assert!(store.path_for(region()).exists());
    assert!(!store.path_for(other).exists());
    assert_eq!(store.load(other).unwrap(), RunState::default());
}
