#![allow(clippy::unwrap_used)]
// End-to-end: poller driving a real `TrackerClient` against wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mappulse_api::{TrackerClient, TransportConfig};
use mappulse_core::{DevicePoller, PollState, PollerConfig, ProjectionConfig, StateProjection};

const DEVICE_PATH: &str = "/v3/api/public/device";

fn poller_for(server: &MockServer) -> DevicePoller {
    let client = TrackerClient::new(
        format!("{}{DEVICE_PATH}", server.uri()),
        SecretString::from("test-key".to_string()),
        &TransportConfig::default(),
    )
    .unwrap();
    DevicePoller::new(client, PollerConfig::new(Duration::from_millis(50)).unwrap())
}

fn body() -> serde_json::Value {
    json!({
        "result_list": [{
            "device_id": "a1",
            "display_name": "Truck 1",
            "updated_at": "2025-04-21T10:15:30Z",
            "latest_device_point": {
                "dt_tracker": "2025-04-21T10:15:30Z",
                "lat": 40.0,
                "lng": -74.0,
                "speed": 12.0
            }
        }]
    })
}

/// Wait until `pred` holds for the published state.
async fn wait_for<T: Clone>(
    rx: &mut tokio::sync::watch::Receiver<PollState<T>>,
    pred: impl Fn(&PollState<T>) -> bool,
) -> PollState<T> {
    timeout(Duration::from_secs(5), async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_poller_publishes_devices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .mount(&server)
        .await;

    let poller = poller_for(&server);
    let mut rx = poller.subscribe();
    poller.start().unwrap();

    let state = wait_for(&mut rx, |s| s.success().is_some()).await;
    let devices = state.success().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "Truck 1");

    poller.shutdown().await;
    assert!(poller.state().is_idle());
}

#[tokio::test]
async fn test_poller_reports_http_failure_and_keeps_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let poller = poller_for(&server);
    let mut rx = poller.subscribe();
    poller.start().unwrap();

    let state = wait_for(&mut rx, |s| s.failure().is_some()).await;
    assert_eq!(state.failure().and_then(mappulse_api::Error::status), Some(503));

    // Interval is 50ms, so a few more attempts land quickly.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 3, "only {} requests", requests.len());

    poller.shutdown().await;
}

#[tokio::test]
async fn test_projection_delivers_device_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .mount(&server)
        .await;

    let poller = poller_for(&server);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let config = ProjectionConfig::new(Duration::from_millis(100)).unwrap();
    let task = StateProjection::new(poller.subscribe(), &config).spawn(tx, cancel.clone());

    poller.start().unwrap();
    let snapshot = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0].id, "a1");

    cancel.cancel();
    task.await.unwrap();
    poller.shutdown().await;
}
