//! Integration tests for the `duux` CLI binary.
//!
//! Offline tests cover argument parsing, help output, completions and
//! configuration errors; the rest drive the binary against a wiremock
//! stand-in for the Duux cloud.
#![allow(clippy::unwrap_used)]

use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICE: &str = "34:5f:45:ec:b8:34";
const TOKEN: &str = "cli_test_jwt";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `duux` binary with env isolation.
///
/// Clears all `DUUX_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn duux_cmd() -> assert_cmd::Command {
    duux_cmd_with_home("/tmp/duux-cli-test-nonexistent")
}

fn duux_cmd_with_home(home: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("duux");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("DUUX_PROFILE")
        .env_remove("DUUX_DEVICE_ID")
        .env_remove("DUUX_TOKEN")
        .env_remove("DUUX_API_URL")
        .env_remove("DUUX_PROTOCOL")
        .env_remove("DUUX_OUTPUT")
        .env_remove("DUUX_TIMEOUT")
        .env_remove("DUUX_SETTLE_DELAY_MS")
        .env_remove("DUUX_DEFAULTS__TIMEOUT")
        .env_remove("DUUX_DEFAULTS__POLL_INTERVAL");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` with explicit device + token flags.
///
/// The child process blocks, so it runs off the runtime's worker threads
/// while the mock server keeps answering.
async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    let uri = server.uri();
    let mut cmd = duux_cmd();
    cmd.args([
        "--device-id",
        DEVICE,
        "--token",
        TOKEN,
        "--api-url",
        uri.as_str(),
        "--settle-delay-ms",
        "0",
        "--timeout",
        "5",
    ])
    .args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn status_body(speed: u8) -> serde_json::Value {
    json!({
        "data": {
            "power": 1,
            "speed": speed,
            "mode": 0,
            "night": 0,
            "lock": 0,
            "horosc": 1,
            "verosc": 0
        }
    })
}

async fn mount_status(server: &MockServer, speed: u8) {
    Mock::given(method("GET"))
        .and(path(format!("/data/{DEVICE}/status")))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body(speed)))
        .mount(server)
        .await;
}

fn commands_path() -> String {
    format!("/sensor/{DEVICE}/commands")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = duux_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    duux_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Duux")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("speed"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    duux_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("duux"));
}

#[test]
fn test_config_subcommands_exist() {
    duux_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("set-token"))
                .and(predicate::str::contains("path")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    duux_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    duux_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline error cases ─────────────────────────────────────────────

#[test]
fn test_status_without_config() {
    duux_cmd()
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No fan configured"));
}

#[test]
fn test_unknown_profile() {
    duux_cmd()
        .args(["--profile", "ghost", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'ghost' not found"));
}

#[test]
fn test_malformed_device_id() {
    duux_cmd()
        .args(["--device-id", "not-a-mac", "--token", TOKEN, "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("device_id"));
}

#[test]
fn test_speed_percentage_out_of_range() {
    let output = duux_cmd().args(["speed", "150"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("150"), "Expected the rejected value:\n{text}");
}

#[test]
fn test_unknown_field() {
    let output = duux_cmd().args(["set", "turbo", "1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("turbo"), "Expected the bad field name:\n{text}");
}

#[test]
fn test_config_path_prints_location() {
    duux_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_show_masks_token() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap();

    duux_cmd_with_home(home)
        .args(["config", "set", "device_id", "34-5F-45-EC-B8-34"])
        .assert()
        .success();
    duux_cmd_with_home(home)
        .args(["config", "set", "jwt_token", "very-secret-jwt"])
        .assert()
        .success();

    duux_cmd_with_home(home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#"device_id = "34:5f:45:ec:b8:34""#)
                .and(predicate::str::contains("very-secret-jwt").not()),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    duux_cmd_with_home(home.path().to_str().unwrap())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_zero_timeout_flag_rejected() {
    duux_cmd()
        .args(["--timeout", "0", "--device-id", DEVICE, "--token", TOKEN, "status"])
        .assert()
        .code(2);
}

#[test]
fn test_config_set_rejects_zero_poll_interval() {
    let dir = tempfile::tempdir().unwrap();
    duux_cmd_with_home(dir.path().to_str().unwrap())
        .args(["config", "set", "poll_interval", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("poll_interval"));
}

#[test]
fn test_zero_poll_interval_from_env_is_rejected_before_watching() {
    duux_cmd()
        .env("DUUX_DEFAULTS__POLL_INTERVAL", "0")
        .args([
            "--device-id",
            DEVICE,
            "--token",
            TOKEN,
            "watch",
            "--count",
            "1",
        ])
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("poll_interval")
                .and(predicate::str::contains("panicked").not()),
        );
}

#[test]
fn test_malformed_config_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("duux");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_file = config_dir.join("config.toml");
    let original = "[profiles.bedroom]\ndevice_id = \"34:5f:45:ec:b8:34\"\n[profiles.office\n";
    std::fs::write(&config_file, original).unwrap();

    duux_cmd_with_home(dir.path().to_str().unwrap())
        .args(["config", "set", "protocol", "numeric"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config loading failed"));

    assert_eq!(std::fs::read_to_string(&config_file).unwrap(), original);
}

// ── Against a mock cloud ────────────────────────────────────────────

#[tokio::test]
async fn test_status_json() {
    let server = MockServer::start().await;
    mount_status(&server, 15).await;

    let output = run_against(&server, &["--output", "json", "status"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["device_id"], DEVICE);
    assert_eq!(view["available"], true);
    assert_eq!(view["percentage"], 50);
    assert_eq!(view["state"]["speed"], 15);
    assert_eq!(view["repair"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_status_table() {
    let server = MockServer::start().await;
    mount_status(&server, 30).await;

    let output = run_against(&server, &["status"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("30/30 (100%)"), "{stdout}");
    assert!(stdout.contains("Night mode"), "{stdout}");
}

#[tokio::test]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/data/{DEVICE}/status")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = run_against(&server, &["status"]).await;

    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("set-token"), "Expected recovery hint:\n{text}");
}

#[tokio::test]
async fn test_unknown_device_exits_with_not_found_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/data/{DEVICE}/status")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run_against(&server, &["status"]).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_out_of_range_raw_value_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(&server, &["set", "speed", "35"]).await;

    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("35"), "{text}");
}

#[tokio::test]
async fn test_speed_sends_text_command_and_confirms() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .and(body_json(json!({ "command": "tune set speed 15" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, 15).await;

    let output = run_against(&server, &["--output", "plain", "speed", "50"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("speed=15"), "{stdout}");
}

#[tokio::test]
async fn test_numeric_protocol_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(commands_path()))
        .and(body_json(json!({ "command": { "lock": 1 } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, 10).await;

    let output = run_against(&server, &["--protocol", "numeric", "lock", "on"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test]
async fn test_watch_reports_repair_issue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/data/{DEVICE}/status")))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;

    let output = run_against(&server, &["watch", "--interval", "1", "--count", "3"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("repair issue 'auth_failed' opened after 3"),
        "{stdout}"
    );
}
