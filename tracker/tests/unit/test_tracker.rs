//! Poll session tests

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arm_models::{Operation, ProvisioningState};
use deploytrack::errors::TrackerError;
use deploytrack::track::tracker::run;
use deploytrack::track::{DeployTracker, Options, SessionState, TrackerEvent};
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_test::{assert_err, assert_ok};

use crate::support::{deployment, ids, nested, network_error, op, FakeSource};

fn never() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(std::future::pending())
}

fn options() -> Options {
    Options {
        interval: Duration::from_millis(10),
        ..Default::default()
    }
}

async fn run_to_end(source: &FakeSource) -> (Vec<TrackerEvent>, SessionState) {
    let (tx, mut rx) = mpsc::channel(128);
    let session = run(&options(), source, "rg", "D1", &tx, |_| async {}, never()).await;
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (events, session.state())
}

fn names(events: &[TrackerEvent]) -> Vec<&'static str> {
    events.iter().map(TrackerEvent::name).collect()
}

fn operations(events: &[TrackerEvent]) -> Vec<Operation> {
    events
        .iter()
        .filter_map(|event| match event {
            TrackerEvent::Operation(op) => Some(op.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_two_cycle_success() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .deployment(Ok(deployment("D1", "Succeeded")))
        .operations("D1", Ok(vec![op("1", 1, "Accepted")]))
        .operations("D1", Ok(vec![op("1", 1, "Succeeded")]));

    let (events, state) = run_to_end(&source).await;

    assert_eq!(names(&events), vec!["start", "operation", "operation", "done"]);
    let ops = operations(&events);
    assert_eq!(ops[0].properties.provisioning_state, ProvisioningState::Accepted);
    assert_eq!(ops[1].properties.provisioning_state, ProvisioningState::Succeeded);
    match events.last() {
        Some(TrackerEvent::Done(d)) => {
            assert_eq!(d.provisioning_state(), &ProvisioningState::Succeeded)
        }
        other => panic!("expected done, got {:?}", other),
    }

    assert_eq!(state, SessionState::Done);
    assert_eq!(source.count("get:"), 2);
    assert_eq!(source.count("list:"), 2);
}

#[tokio::test]
async fn test_unchanged_operations_are_not_repeated() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .deployment(Ok(deployment("D1", "Running")))
        .deployment(Ok(deployment("D1", "Succeeded")))
        .operations("D1", Ok(vec![op("1", 1, "Succeeded"), op("2", 2, "Running")]))
        .operations("D1", Ok(vec![op("1", 1, "Succeeded"), op("2", 2, "Running")]))
        .operations("D1", Ok(vec![op("1", 1, "Succeeded"), op("2", 2, "Succeeded")]));

    let (events, _) = run_to_end(&source).await;

    assert_eq!(ids(&operations(&events)), vec!["1", "2", "2"]);
    assert_eq!(source.count("get:"), 3);
}

#[tokio::test]
async fn test_nested_operations_are_emitted_in_timestamp_order() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Succeeded")))
        .operations("D1", Ok(vec![op("A", 1, "Succeeded"), nested("B", 5, "inner")]))
        .operations("inner", Ok(vec![op("C", 2, "Succeeded"), op("D", 3, "Succeeded")]));

    let (events, state) = run_to_end(&source).await;

    assert_eq!(ids(&operations(&events)), vec!["A", "C", "D", "B"]);
    let timestamps: Vec<_> = operations(&events)
        .iter()
        .map(|op| op.properties.timestamp.clone())
        .collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(state, SessionState::Done);
}

#[tokio::test]
async fn test_terminal_states_end_the_session() {
    for terminal in ["Failed", "Canceled", "Deleted"] {
        let source = FakeSource::new()
            .deployment(Ok(deployment("D1", terminal)))
            .operations("D1", Ok(vec![]));

        let (events, state) = run_to_end(&source).await;

        assert_eq!(names(&events), vec!["start", "done"], "state {}", terminal);
        assert_eq!(state, SessionState::Done);
        assert_eq!(source.count("get:"), 1);
    }
}

#[tokio::test]
async fn test_initial_fetch_error() {
    let source = FakeSource::new().deployment(Err(network_error()));

    let (events, state) = run_to_end(&source).await;

    assert_eq!(names(&events), vec!["error"]);
    assert_eq!(state, SessionState::Failed);
    assert_eq!(source.count("list:"), 0);
}

#[tokio::test]
async fn test_nested_fetch_error_fails_the_session() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .operations("D1", Ok(vec![op("A", 1, "Succeeded"), nested("B", 2, "N1")]))
        .operations("N1", Err(network_error()));

    let (events, state) = run_to_end(&source).await;

    assert_eq!(names(&events), vec!["start", "error"]);
    assert_eq!(state, SessionState::Failed);
    assert_eq!(source.count("get:"), 1);
}

#[tokio::test]
async fn test_refetch_error_fails_the_session() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .deployment(Err(network_error()))
        .operations("D1", Ok(vec![op("1", 1, "Running")]));

    let (events, state) = run_to_end(&source).await;

    assert_eq!(names(&events), vec!["start", "operation", "error"]);
    assert_eq!(state, SessionState::Failed);
    assert_eq!(source.count("list:"), 1);
}

#[tokio::test]
async fn test_shutdown_before_start() {
    let source = FakeSource::new().deployment(Ok(deployment("D1", "Running")));
    let (tx, mut rx) = mpsc::channel(8);

    let session = run(&options(), &source, "rg", "D1", &tx, |_| async {}, Box::pin(async {})).await;
    drop(tx);

    assert_eq!(session.state(), SessionState::Cancelled);
    assert!(rx.recv().await.is_none());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_closed_event_channel_cancels() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .operations("D1", Ok(vec![]));
    let (tx, rx) = mpsc::channel(8);
    drop(rx);

    let session = run(&options(), &source, "rg", "D1", &tx, |_| async {}, never()).await;

    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(source.count("list:"), 0);
}

#[tokio::test]
async fn test_shutdown_mid_cycle_stops_remaining_operations() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .operations("D1", Ok(vec![op("1", 1, "Running"), op("2", 2, "Running"), op("3", 3, "Running")]));
    let (tx, mut rx) = mpsc::channel(1);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let shutdown: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
        let _ = stop_rx.await;
    });

    let source = &source;
    let poller = async move {
        let session = run(&options(), source, "rg", "D1", &tx, |_| async {}, shutdown).await;
        drop(tx);
        session
    };
    let consumer = async move {
        let mut received = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        stop_tx.send(()).unwrap();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        received
    };
    let (session, received) = tokio::join!(poller, consumer);

    assert_eq!(names(&received), vec!["start", "operation"]);
    assert_eq!(ids(&operations(&received)), vec!["1"]);
    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(source.count("get:"), 1);
}

#[tokio::test]
async fn test_tracker_stream_ends_after_done() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .deployment(Ok(deployment("D1", "Succeeded")))
        .operations("D1", Ok(vec![op("1", 1, "Running")]))
        .operations("D1", Ok(vec![op("1", 1, "Succeeded")]));
    let tracker = DeployTracker::new(Arc::new(source), options());

    let handle = tracker.start_polling("rg", "D1");
    let events: Vec<TrackerEvent> = handle.collect().await;

    assert_eq!(names(&events), vec!["start", "operation", "operation", "done"]);
}

#[tokio::test]
async fn test_tracker_wait() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Failed")))
        .operations("D1", Ok(vec![op("1", 1, "Failed")]));
    let tracker = DeployTracker::new(Arc::new(source), options());

    let deployment = assert_ok!(tracker.start_polling("rg", "D1").wait().await);
    assert_eq!(deployment.provisioning_state(), &ProvisioningState::Failed);

    let failing = DeployTracker::new(
        Arc::new(FakeSource::new().deployment(Err(network_error()))),
        options(),
    );
    let err = assert_err!(failing.start_polling("rg", "D1").wait().await);
    assert!(matches!(err, TrackerError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn test_cancel_running_session() {
    let source = FakeSource::new()
        .deployment(Ok(deployment("D1", "Running")))
        .operations("D1", Ok(vec![op("1", 1, "Running")]));
    let tracker = DeployTracker::new(Arc::new(source), options());

    let mut handle = tracker.start_polling("rg", "D1");
    assert_eq!(handle.recv().await.map(|e| e.name()), Some("start"));
    assert_eq!(handle.recv().await.map(|e| e.name()), Some("operation"));

    handle.cancel();
    let session = assert_ok!(handle.join().await);

    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(session.snapshot().len(), 1);
}
