//! Command line tests against the built binary

mod common;

use assert_cmd::Command;
use common::diagnostic_fixture;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("es-cost-report").unwrap();
    cmd.env("LOG_LEVEL", "ERROR")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_costs_is_the_default_command() {
    let (dir, prices) = diagnostic_fixture().unwrap();

    cli()
        .current_dir(dir.path())
        .arg("--dir")
        .arg(dir.path())
        .arg("--pricing")
        .arg(&prices)
        .assert()
        .success()
        .stdout(predicate::str::contains("logs-2024.01.01"))
        .stdout(predicate::str::contains("primary+replica"))
        .stdout(predicate::str::contains("7008.00"))
        .stdout(predicate::str::contains(".kibana").not());
}

#[test]
fn test_costs_json_output() {
    let (dir, prices) = diagnostic_fixture().unwrap();

    let output = cli()
        .current_dir(dir.path())
        .args(["--json", "costs", "--dir"])
        .arg(dir.path())
        .arg("--pricing")
        .arg(&prices)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let indices = value["indices"].as_array().unwrap();
    assert_eq!(indices.len(), 4);
    assert_eq!(indices[1]["index"], "metrics");
    assert_eq!(indices[1]["shard_type"], "primary-only");
    assert_eq!(indices[1]["standard/yr"].as_f64().map(|v| v.round()), Some(3504.0));
}

#[test]
fn test_csv_export() {
    let (dir, prices) = diagnostic_fixture().unwrap();
    let csv_path = dir.path().join("report.csv");

    cli()
        .current_dir(dir.path())
        .arg("--dir")
        .arg(dir.path())
        .arg("--pricing")
        .arg(&prices)
        .arg("--csv")
        .arg(&csv_path)
        .arg("costs")
        .assert()
        .success();

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("index,instance_configuration/product,shard_type,total_index_size"));
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn test_nodes_command_shows_role_matrix() {
    let (dir, prices) = diagnostic_fixture().unwrap();

    cli()
        .current_dir(dir.path())
        .args(["nodes", "--dir"])
        .arg(dir.path())
        .arg("--pricing")
        .arg(&prices)
        .assert()
        .success()
        .stdout(predicate::str::contains("es-n3"))
        .stdout(predicate::str::contains("Nodes Metrics fixture"))
        .stdout(predicate::str::contains("data_frozen"))
        .stdout(predicate::str::contains("Node Roles Matrix"));
}

#[test]
fn test_shards_command_json() {
    let (dir, prices) = diagnostic_fixture().unwrap();

    let output = cli()
        .current_dir(dir.path())
        .args(["shards", "--json", "--dir"])
        .arg(dir.path())
        .arg("--pricing")
        .arg(&prices)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let shards = value["shards"].as_array().unwrap();
    assert_eq!(shards.len(), 5);
    assert!(shards
        .iter()
        .any(|s| s["raw_ingest_size"] == "not applicable: replica"));
}

#[test]
fn test_ilm_command() {
    let (dir, _) = diagnostic_fixture().unwrap();

    cli()
        .current_dir(dir.path())
        .args(["ilm", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Policy: logs-policy"))
        .stdout(predicate::str::contains("Number of days analyzed: 2"));
}

#[test]
fn test_ilm_command_rejects_csv_export() {
    let (dir, _) = diagnostic_fixture().unwrap();
    let csv_path = dir.path().join("ilm.csv");

    cli()
        .current_dir(dir.path())
        .args(["ilm", "--dir"])
        .arg(dir.path())
        .arg("--csv")
        .arg(&csv_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with `ilm`"));

    assert!(!csv_path.exists());
}

#[test]
fn test_missing_bundle_fails() {
    let dir = tempfile::tempdir().unwrap();

    cli()
        .current_dir(dir.path())
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("shard placement"));
}

#[test]
fn test_missing_bundle_fails_with_json_error() {
    let dir = tempfile::tempdir().unwrap();

    cli()
        .current_dir(dir.path())
        .args(["--json", "--dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""));
}
