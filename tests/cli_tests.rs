mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use support::config::{write_temp_config, UNREACHABLE_TOML};
use support::http::serve_once;

const ORDERS: &str = r#"[
  {"id":"0f8fad5b-d9cb-469f-a165-70867728950e","customer_phone":"+36 30 123 4567",
   "customer_residence":"Block A","customer_apartment":"12",
   "items":[{"id":"p-1","name":"Bread","quantity":2,"price":2.5}],
   "total":5.0,"delivery_method":"delivery","status":"pending",
   "created_at":"2024-05-01T10:00:00+00:00","updated_at":"2024-05-01T10:00:00+00:00"},
  {"id":"7c9e6679-7425-40de-944b-e07fc1f90ae7","customer_phone":"+36 20 555 0000",
   "customer_residence":"","customer_apartment":"",
   "items":[{"id":"p-2","name":"Milk","quantity":1,"price":1.2}],
   "total":1.2,"delivery_method":"pickup","status":"completed",
   "created_at":"2024-04-30T09:00:00+00:00","updated_at":"2024-04-30T09:30:00+00:00"}
]"#;

/// The binary, run from an empty directory with no API key in scope.
fn ordersync(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ordersync").expect("binary built");
    cmd.current_dir(workdir.path())
        .env_remove("ORDERSYNC_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn workdir() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn backend_toml(url: &str) -> String {
    format!("[backend]\nurl = \"{url}\"\n")
}

#[test]
fn help_lists_commands() {
    ordersync(&workdir())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("orders"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_flag() {
    ordersync(&workdir())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn check_config_accepts_valid_file() {
    let config = write_temp_config(&backend_toml("http://localhost:54321"));

    ordersync(&workdir())
        .args(["--color", "never", "check", "config", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("admin-orders-changes"))
        .stdout(predicate::str::contains("ORDERSYNC_API_KEY"));
}

#[test]
fn check_config_detects_api_key() {
    let config = write_temp_config(&backend_toml("http://localhost:54321"));

    ordersync(&workdir())
        .env("ORDERSYNC_API_KEY", "anon-key")
        .args(["check", "config", "-c"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("API key detected"));
}

#[test]
fn check_config_rejects_missing_url() {
    let config = write_temp_config("[realtime]\nchannel = \"orders\"\n");

    ordersync(&workdir())
        .args(["check", "config", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend.url"));
}

#[test]
fn missing_default_config_fails() {
    ordersync(&workdir())
        .args(["check", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn json_mode_emits_one_object_per_line() {
    let config = write_temp_config(&backend_toml("http://localhost:54321"));

    let output = ordersync(&workdir())
        .args(["--json", "check", "config", "--config"])
        .arg(config.path())
        .output()
        .expect("run ordersync");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect();
    assert!(lines.iter().any(|line| line["type"] == "success"));
    assert!(lines
        .iter()
        .any(|line| line["type"] == "field" && line["payload"]["label"] == "Channel"));
}

#[test]
fn unknown_status_is_a_usage_error() {
    ordersync(&workdir())
        .args(["orders", "set-status", "abc", "shipped"])
        .assert()
        .code(2);
}

#[test]
fn orders_list_renders_table() {
    let (url, server) = serve_once(200, ORDERS);
    let config = write_temp_config(&backend_toml(&url));

    ordersync(&workdir())
        .args(["--color", "never", "orders", "list", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0f8fad5b"))
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("2 of 2"));

    let request = server.join().expect("server thread");
    assert!(request.starts_with("GET /rest/v1/orders?select=*&order=created_at.desc "));
}

#[test]
fn orders_list_filters_by_status_in_json() {
    let (url, _server) = serve_once(200, ORDERS);
    let config = write_temp_config(&backend_toml(&url));

    let output = ordersync(&workdir())
        .args(["--json", "orders", "list", "--status", "pending", "--config"])
        .arg(config.path())
        .output()
        .expect("run ordersync");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let orders = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|line| line["type"] == "orders")
        .expect("orders line");
    let rows = orders["payload"].as_array().expect("array payload");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "pending");
}

#[test]
fn orders_stats_counts_statuses() {
    let (url, _server) = serve_once(200, ORDERS);
    let config = write_temp_config(&backend_toml(&url));

    let output = ordersync(&workdir())
        .args(["--json", "orders", "stats", "--config"])
        .arg(config.path())
        .output()
        .expect("run ordersync");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stats = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|line| line["type"] == "stats")
        .expect("stats line");
    assert_eq!(stats["payload"]["total"], 2);
    assert_eq!(stats["payload"]["pending"], 1);
    assert_eq!(stats["payload"]["completed"], 1);
}

#[test]
fn api_error_exits_nonzero() {
    let (url, _server) = serve_once(401, r#"{"message":"JWT expired","code":"PGRST301"}"#);
    let config = write_temp_config(&backend_toml(&url));

    ordersync(&workdir())
        .args(["orders", "list", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("JWT expired"));
}

#[test]
fn delete_in_json_mode_requires_yes() {
    let config = write_temp_config(UNREACHABLE_TOML);

    ordersync(&workdir())
        .args(["--json", "orders", "delete", "abc", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
}

#[test]
fn unreachable_backend_fails_list() {
    let config = write_temp_config(UNREACHABLE_TOML);

    ordersync(&workdir())
        .args(["orders", "list", "--config"])
        .arg(config.path())
        .assert()
        .failure();
}

#[test]
fn check_connection_reports_unreachable_backend() {
    let config = write_temp_config(UNREACHABLE_TOML);

    ordersync(&workdir())
        .args(["--color", "never", "check", "connection", "--timeout", "1", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP error"));
}
