use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use maritime_bucket::{BucketError, InMemoryBucketStore};
use maritime_core::error::FetchError;
use maritime_core::fetcher::VesselSource;
use maritime_core::invocation::InvocationResponse;
use maritime_core::notifier::{RecordingNotifier, NO_DATA_MESSAGE, SUBJECT};
use maritime_core::persister::{ContainerStatus, SnapshotPersister};
use maritime_core::pipeline::{OutcomeStatus, Progress};
use maritime_core::{VesselLookup, VesselQuery, VesselRoster, VesselSnapshot, VesselSnapshotPipeline};
use serde_json::{json, Value};

/// Serves canned responses keyed by lookup value; anything unknown fails.
#[derive(Default)]
struct StubSource {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    fn with(mut self, lookup: &str, body: Value) -> Self {
        self.responses.insert(lookup.to_string(), body);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VesselSource for StubSource {
    async fn fetch(&self, lookup: &VesselLookup) -> Result<VesselSnapshot, FetchError> {
        self.calls.lock().unwrap().push(lookup.value());
        match self.responses.get(&lookup.value()) {
            Some(Value::Object(fields)) => Ok(VesselSnapshot::from(fields.clone())),
            Some(_) => Err(FetchError::NotAnObject),
            None => Err(FetchError::Status { status: 503 }),
        }
    }
}

fn roster(names: &[(&str, &str)]) -> VesselRoster {
    VesselRoster::new(
        names
            .iter()
            .map(|(name, imo)| VesselQuery::new(*name, VesselLookup::Imo(imo.to_string())))
            .collect(),
    )
    .unwrap()
}

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap()
}

fn ship_a_body() -> Value {
    json!({
        "main": {"type": "Cargo", "lat": 1.0, "lon": 2.0},
        "maritime": [{"description": "Underway"}]
    })
}

fn pipeline(
    source: Arc<StubSource>,
    store: Arc<InMemoryBucketStore>,
    roster: VesselRoster,
) -> VesselSnapshotPipeline {
    VesselSnapshotPipeline::new(source, SnapshotPersister::new(store), roster)
        .with_clock(Arc::new(fixed_clock))
}

#[tokio::test]
async fn partial_failure_still_broadcasts_every_line() {
    let source = Arc::new(StubSource::default().with("1", ship_a_body()));
    let store = Arc::new(InMemoryBucketStore::new("fleet"));
    let notifier = RecordingNotifier::new();

    let result = pipeline(
        source.clone(),
        store.clone(),
        roster(&[("SHIP-A", "1"), ("SHIP-B", "2")]),
    )
    .broadcast(&notifier)
    .await;
    let response = InvocationResponse::from(&result);
    let report = result.unwrap();

    assert_eq!(report.run.container, ContainerStatus::Created);
    assert_eq!(store.keys(), vec!["maritime/SHIP-A-20250601-123000".to_string()]);
    assert_eq!(
        report.run.summaries(),
        vec![
            "Ship: SHIP-A\nType: Cargo\nLocation: 1.0°N, 2.0°E\nStatus: Underway".to_string(),
            "Failed to fetch data for SHIP-B".to_string(),
        ]
    );

    let expected = "Ship: SHIP-A\nType: Cargo\nLocation: 1.0°N, 2.0°E\nStatus: Underway\n---\nFailed to fetch data for SHIP-B";
    assert_eq!(report.message, expected);
    let published = notifier.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].subject, SUBJECT);
    assert_eq!(published[0].message, expected);

    assert_eq!(response.status_code, 200);
    assert_eq!(source.calls(), vec!["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn one_outcome_per_vessel_and_failures_do_not_stop_the_run() {
    let source = Arc::new(
        StubSource::default()
            .with("2", ship_a_body())
            .with("4", json!({"main": {"type": "Tanker"}})),
    );
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));

    let report = pipeline(
        source,
        store.clone(),
        roster(&[("S1", "1"), ("S2", "2"), ("S3", "3"), ("S4", "4")]),
    )
    .run()
    .await;

    assert_eq!(report.container, ContainerStatus::Existing);
    assert_eq!(report.outcomes.len(), 4);
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["S1", "S2", "S3", "S4"]);
    assert!(matches!(report.outcomes[0].status, OutcomeStatus::FetchFailed { .. }));
    assert!(matches!(report.outcomes[2].status, OutcomeStatus::FetchFailed { .. }));
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 2);

    // Nothing is written for vessels whose fetch failed.
    assert_eq!(
        store.keys(),
        vec![
            "maritime/S2-20250601-123000".to_string(),
            "maritime/S4-20250601-123000".to_string(),
        ]
    );
    assert_eq!(
        report.outcomes[3].summary,
        "Ship: S4\nType: Tanker\nLocation: N/A°N, N/A°E\nStatus: Unknown"
    );
}

#[tokio::test]
async fn all_fetches_failing_publishes_placeholder() {
    let source = Arc::new(StubSource::default());
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));
    let notifier = RecordingNotifier::new();

    let report = pipeline(source, store.clone(), roster(&[("S1", "1"), ("S2", "2")]))
        .broadcast(&notifier)
        .await
        .unwrap();

    assert_eq!(report.message, NO_DATA_MESSAGE);
    assert_eq!(notifier.published()[0].message, NO_DATA_MESSAGE);
    assert_eq!(report.run.outcomes.len(), 2);
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_reported_and_not_stored() {
    let source = Arc::new(StubSource::default().with("1", json!({"maritime": "bad"})));
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));

    let report = pipeline(source, store.clone(), roster(&[("S1", "1")]))
        .run()
        .await;

    assert!(matches!(
        report.outcomes[0].status,
        OutcomeStatus::ExtractionFailed { .. }
    ));
    assert_eq!(
        report.outcomes[0].summary,
        "Error processing data for S1: field `maritime` should be an array"
    );
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn storage_failure_keeps_the_summary() {
    let source = Arc::new(
        StubSource::default()
            .with("1", ship_a_body())
            .with("2", ship_a_body()),
    );
    let store = Arc::new(InMemoryBucketStore::existing("fleet").failing_puts_under("maritime/S1-"));

    let report = pipeline(source, store.clone(), roster(&[("S1", "1"), ("S2", "2")]))
        .run()
        .await;

    assert!(matches!(
        report.outcomes[0].status,
        OutcomeStatus::StorageFailed { .. }
    ));
    assert!(report.outcomes[0].summary.starts_with("Ship: S1\n"));
    assert_eq!(report.outcomes[1].stored_key(), Some("maritime/S2-20250601-123000"));
    assert_eq!(report.stored_keys(), vec!["maritime/S2-20250601-123000"]);
}

#[tokio::test]
async fn publish_failure_is_a_run_level_error() {
    let source = Arc::new(StubSource::default().with("1", ship_a_body()));
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));
    let notifier = RecordingNotifier::failing("topic does not exist");

    let result = pipeline(source, store.clone(), roster(&[("S1", "1")]))
        .broadcast(&notifier)
        .await;
    let response = InvocationResponse::from(&result);

    assert!(result.is_err());
    assert_eq!(response.status_code, 500);
    // The vessel was still processed before the publish attempt.
    assert_eq!(store.keys().len(), 1);
}

#[tokio::test]
async fn empty_bodies_count_as_failed_fetches() {
    let source = Arc::new(
        StubSource::default()
            .with("1", json!({}))
            .with("2", json!({})),
    );
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));
    let notifier = RecordingNotifier::new();

    let report = pipeline(source, store.clone(), roster(&[("S1", "1"), ("S2", "2")]))
        .broadcast(&notifier)
        .await
        .unwrap();

    for outcome in &report.run.outcomes {
        assert!(matches!(outcome.status, OutcomeStatus::FetchFailed { .. }));
        assert!(!outcome.has_data());
    }
    assert_eq!(
        report.run.summaries(),
        vec![
            "Failed to fetch data for S1".to_string(),
            "Failed to fetch data for S2".to_string(),
        ]
    );
    assert_eq!(report.message, NO_DATA_MESSAGE);
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn bucket_creation_failure_does_not_stop_the_run() {
    let source = Arc::new(
        StubSource::default()
            .with("1", ship_a_body())
            .with("3", ship_a_body()),
    );
    let store = Arc::new(
        InMemoryBucketStore::new("fleet").with_create_error(BucketError::Sdk("AccessDenied".into())),
    );

    let report = pipeline(
        source.clone(),
        store.clone(),
        roster(&[("S1", "1"), ("S2", "2"), ("S3", "3")]),
    )
    .run()
    .await;

    assert_eq!(report.container, ContainerStatus::Unavailable);
    assert_eq!(report.outcomes.len(), 3);
    assert!(matches!(report.outcomes[0].status, OutcomeStatus::StorageFailed { .. }));
    assert!(matches!(report.outcomes[1].status, OutcomeStatus::FetchFailed { .. }));
    assert!(matches!(report.outcomes[2].status, OutcomeStatus::StorageFailed { .. }));
    assert!(report.outcomes[2].summary.starts_with("Ship: S3\n"));
    assert_eq!(source.calls(), vec!["1".to_string(), "2".to_string(), "3".to_string()]);
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn progress_is_reported_per_vessel_in_order() {
    let source = Arc::new(StubSource::default().with("1", ship_a_body()));
    let store = Arc::new(InMemoryBucketStore::existing("fleet"));
    let mut events = Vec::new();

    let report = pipeline(source, store, roster(&[("S1", "1"), ("S2", "2")]))
        .run_with(|progress| match progress {
            Progress::Started(vessel) => events.push(format!("start {}", vessel.name())),
            Progress::Finished(outcome) => events.push(format!("done {}", outcome.name)),
        })
        .await;

    assert_eq!(events, ["start S1", "done S1", "start S2", "done S2"]);
    assert_eq!(report.outcomes.len(), 2);
}
