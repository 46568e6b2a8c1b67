//! Basic CLI tests for the kioskwatch command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: &[&str] = &[
    "KIOSKWATCH_BACKEND",
    "KIOSKWATCH_STORE_NAME",
    "KIOSKWATCH_STORE_TOKEN",
    "KIOSKWATCH_SITE_ID",
    "KIOSKWATCH_DATA_PATH",
    "KIOSKWATCH_REMOTE_URL",
    "KIOSKWATCH_REMOTE_TIMEOUT_SECS",
    "KIOSKWATCH_API_KEY",
    "KIOSKWATCH_HOST",
    "KIOSKWATCH_PORT",
    "KIOSKWATCH_CORS",
];

/// Binary run from an empty directory with a clean environment.
fn kioskwatch(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kioskwatch").unwrap();
    cmd.current_dir(dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("check-config"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kioskwatch"));
}

#[test]
fn test_no_subcommand_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir).assert().failure().code(2);
}

#[test]
fn test_check_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"backend = "memory""#))
        .stdout(predicate::str::contains(r#"store_name = "kiosk-status""#))
        .stdout(predicate::str::contains("port = 8888"));
}

#[test]
fn test_check_config_masks_secrets() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("check-config")
        .env("KIOSKWATCH_API_KEY", "topsecret-key")
        .env("KIOSKWATCH_STORE_TOKEN", "topsecret-token")
        .assert()
        .success()
        .stdout(predicate::str::contains("(set)"))
        .stdout(predicate::str::contains("topsecret").not())
        .stderr(predicate::str::contains("topsecret").not());
}

#[test]
fn test_check_config_reads_file_and_env_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector.toml");
    std::fs::write(
        &path,
        "[server]\nport = 9100\n\n[store]\nbackend = \"redb\"\npath = \"state/status.redb\"\n",
    )
    .unwrap();

    kioskwatch(&dir)
        .args(["check-config", "--config"])
        .arg(&path)
        .env("KIOSKWATCH_PORT", "9200")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"backend = "redb""#))
        .stdout(predicate::str::contains("state/status.redb"))
        .stdout(predicate::str::contains("port = 9200"));
}

#[test]
fn test_unknown_backend_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("check-config")
        .env("KIOSKWATCH_BACKEND", "cassandra")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown backend type"));
}

#[test]
fn test_remote_without_url_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    kioskwatch(&dir)
        .arg("check-config")
        .env("KIOSKWATCH_BACKEND", "remote")
        .assert()
        .failure()
        .stderr(predicate::str::contains("store.base_url"));
}

#[test]
fn test_unknown_config_key_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[store]\nbackedn = \"redb\"\n").unwrap();

    kioskwatch(&dir)
        .args(["check-config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse"));
}

#[test]
fn test_report_rejects_invalid_json_locally() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, "{\"Device\": ").unwrap();

    kioskwatch(&dir)
        .arg("report")
        .arg(&path)
        .args(["--url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn test_report_unreachable_collector() {
    let dir = tempfile::tempdir().unwrap();
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    kioskwatch(&dir)
        .args(["report", "-", "--url"])
        .arg(format!("http://{addr}"))
        .write_stdin(r#"{"Device":"kiosk-07"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach collector"));
}
