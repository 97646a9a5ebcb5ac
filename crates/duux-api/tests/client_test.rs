#![allow(clippy::unwrap_used)]
// Integration tests for `DuuxClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use duux_api::{Credentials, DeviceId, DuuxClient, Error, Field, Protocol, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const DEVICE: &str = "34:5f:45:ec:b8:34";
const TOKEN: &str = "test_jwt_token_12345";

async fn setup(protocol: Protocol) -> (MockServer, DuuxClient) {
    let server = MockServer::start().await;
    let client = client_for(&server, protocol);
    (server, client)
}

fn client_for(server: &MockServer, protocol: Protocol) -> DuuxClient {
    DuuxClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials::new(DeviceId::new(DEVICE).unwrap(), TOKEN),
        protocol,
    )
}

fn status_path() -> String {
    format!("/data/{DEVICE}/status")
}

fn commands_path() -> String {
    format!("/sensor/{DEVICE}/commands")
}

fn status_body() -> serde_json::Value {
    json!({
        "data": {
            "power": 1,
            "speed": 15,
            "mode": 0,
            "night": 0,
            "lock": 0,
            "horosc": 1,
            "verosc": 0
        }
    })
}

// ── Status tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_status() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .and(path(status_path()))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.fetch_status().await.unwrap();

    assert!(state.power);
    assert_eq!(state.speed, 15);
    assert_eq!(state.horizontal_oscillation, 1);
    assert_eq!(state.vertical_oscillation, 0);
    assert!(!state.night_mode);
    assert!(!state.lock);
}

#[tokio::test]
async fn test_fetch_status_missing_field() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "power": 1, "speed": 15 } })),
        )
        .mount(&server)
        .await;

    let result = client.fetch_status().await;

    match result {
        Err(Error::Deserialization { ref message, .. }) => {
            assert!(message.contains("missing field"), "got: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_status_without_envelope() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .and(path(status_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    assert!(matches!(
        client.fetch_status().await,
        Err(Error::Deserialization { .. })
    ));
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_auth_failure() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "token expired" })),
        )
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(err.is_auth_failure(), "expected auth failure, got: {err:?}");
    assert!(matches!(err, Error::Authentication { status: 401, .. }));
}

#[tokio::test]
async fn test_forbidden_is_auth_failure() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: 403, .. }));
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 502, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: Duration::from_millis(200),
        ..TransportConfig::default()
    };
    let client = DuuxClient::new(
        Url::parse(&server.uri()).unwrap(),
        Credentials::new(DeviceId::new(DEVICE).unwrap(), TOKEN),
        Protocol::Text,
        &transport,
    )
    .unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Grab a free port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DuuxClient::with_client(
        reqwest::Client::new(),
        Url::parse(&format!("http://{addr}")).unwrap(),
        Credentials::new(DeviceId::new(DEVICE).unwrap(), TOKEN),
        Protocol::Text,
    );

    let err = client.fetch_status().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_text_command_body() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("POST"))
        .and(path(commands_path()))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "command": "tune set speed 15" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.send_command(Field::Speed, 15).await.unwrap();
}

#[tokio::test]
async fn test_numeric_command_body() {
    let (server, client) = setup(Protocol::Numeric).await;

    Mock::given(method("POST"))
        .and(path(commands_path()))
        .and(body_json(json!({ "command": { "horosc": 2 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_command(Field::HorizontalOscillation, 2)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_text_protocol_sends_one_request_per_field() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(2)
        .mount(&server)
        .await;

    let commands = [
        duux_api::Command::power(true),
        duux_api::Command::new(Field::Speed, 9).unwrap(),
    ];
    client.send_commands(&commands).await.unwrap();
}

#[tokio::test]
async fn test_out_of_range_command_never_hits_network() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.send_command(Field::Speed, 35).await.unwrap_err();
    assert!(
        matches!(err, Error::Validation { field: "speed", value: 35, .. }),
        "got: {err:?}"
    );

    let err = client.send_command(Field::Power, -1).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_rejected_command_with_expired_token() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = client.send_command(Field::Power, 1).await.unwrap_err();
    match err {
        Error::Authentication { status, ref message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_command_payload() {
    let (server, client) = setup(Protocol::Text).await;

    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "bad command" })))
        .mount(&server)
        .await;

    let err = client.send_command(Field::Mode, 1).await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 400, .. }));
    assert!(!err.is_transient());
}
