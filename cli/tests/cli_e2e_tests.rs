//! CLI end-to-end tests that run the binary against the shared CRD fixtures.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../tests");

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("crd-schema-fuzz").expect("binary should exist")
}

// ── E2E: Fuzz fixtures ──────────────────────────────────────────────────────

#[test]
fn test_cli_e2e_fuzz_clean_fixtures() {
    for name in ["widget-crd.yaml", "widget-crd-v1beta1.yaml", "widget-crd.json"] {
        let input = format!("{FIXTURES_DIR}/crds/{name}");
        cmd()
            .args(["fuzz", &input, "-n", "100", "--seed", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("0 failure(s)"));
    }
}

#[test]
fn test_cli_e2e_fuzz_reports_version_without_schema() {
    let input = format!("{FIXTURES_DIR}/crds/gadget-crd.yaml");
    cmd()
        .args(["fuzz", &input, "-n", "100", "--seed", "2", "--max-depth", "20"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ok   example.com/v1, Kind=Gadget"))
        .stdout(predicate::str::contains("ok   example.com/v2, Kind=Gadget"))
        .stdout(predicate::str::contains(
            "FAIL example.com/v3, Kind=Gadget: version v3 of gadgets.example.com has no openAPIV3Schema",
        ))
        .stderr(predicate::str::contains("1 fuzz failure(s)"));
}

#[test]
fn test_cli_e2e_fuzz_reports_malformed_schema() {
    let input = format!("{FIXTURES_DIR}/crds/malformed-schema-crd.yaml");
    cmd()
        .args(["fuzz", &input, "-n", "20", "--seed", "3"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("#/properties/spec/$ref"))
        .stdout(predicate::str::contains("ok   example.com/v2, Kind=Sprocket"));
}

// ── E2E: Prune fixture object ───────────────────────────────────────────────

#[test]
fn test_cli_e2e_prune_widget_object() {
    let dir = TempDir::new().unwrap();
    let crd = format!("{FIXTURES_DIR}/crds/widget-crd.yaml");
    let object = format!("{FIXTURES_DIR}/objects/widget.yaml");
    let output = dir.path().join("pruned.json");

    cmd()
        .args(["prune", &crd, &object, "--version", "v1"])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("pruned: /spec/internalID"))
        .stderr(predicate::str::contains("pruned: /status"));

    let content = fs::read_to_string(&output).expect("output file should exist");
    let data: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(data["metadata"]["labels"]["app"], serde_json::json!("demo"));
    assert_eq!(data["spec"], serde_json::json!({ "name": "demo-widget" }));
    assert!(data.get("status").is_none());
}

#[test]
fn test_cli_e2e_prune_to_stdout_uses_storage_version() {
    let crd = format!("{FIXTURES_DIR}/crds/widget-crd-v1beta1.yaml");
    let object = format!("{FIXTURES_DIR}/objects/widget.yaml");

    cmd()
        .args(["prune", &crd, &object])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"demo-widget\""))
        .stdout(predicate::str::contains("internalID").not());
}
