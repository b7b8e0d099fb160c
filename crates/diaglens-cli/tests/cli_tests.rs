use assert_cmd::Command;
use diaglens_testing::{BundleFixture, RED_HEALTH, RED_INDICES};
use predicates::prelude::*;
use std::io::Write;

fn diaglens() -> Command {
    Command::cargo_bin("diaglens").expect("binary builds")
}

#[test]
fn missing_archive_exits_1() {
    diaglens()
        .arg("/no/such/bundle.zip")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("bundle not found"));
}

#[test]
fn healthy_bundle_writes_reports_and_exits_0() {
    let (_bundle_guard, root) = BundleFixture::healthy().into_dir();
    let output = tempfile::tempdir().unwrap();

    diaglens()
        .arg(&root)
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Score:   100/100"))
        .stdout(predicate::str::contains("0 critical"));

    assert!(output.path().join("health_report.json").exists());
    assert!(output.path().join("health_report.md").exists());
}

#[test]
fn zip_bundle_is_accepted() {
    let (_bundle_guard, zip_path) = BundleFixture::healthy().into_zip();
    let output = tempfile::tempdir().unwrap();

    diaglens()
        .arg(&zip_path)
        .arg("--output")
        .arg(output.path())
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    assert!(output.path().join("health_report.json").exists());
    assert!(!output.path().join("health_report.md").exists());
}

#[test]
fn red_bundle_reports_critical_issues() {
    let (_bundle_guard, root) = BundleFixture::new()
        .with_manifest("prod-logs", "2024-05-02T10:00:00Z")
        .with_health(RED_HEALTH)
        .with_indices_table(RED_INDICES)
        .into_dir();
    let output = tempfile::tempdir().unwrap();

    diaglens()
        .arg(&root)
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[critical]"));

    let markdown =
        std::fs::read_to_string(output.path().join("health_report.md")).unwrap();
    assert!(markdown.contains("cluster_status_red"));
    assert!(markdown.contains("unassigned_shards"));
    assert!(markdown.contains("## Skipped Checks"));

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(output.path().join("health_report.json")).unwrap(),
    )
    .unwrap();
    assert!(json["summary"]["critical_count"].as_u64().unwrap() >= 2);
    assert!(json["summary"]["score"].as_u64().unwrap() < 100);
}

#[test]
fn malformed_config_exits_2() {
    let (_bundle_guard, root) = BundleFixture::healthy().into_dir();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "thresholds: [broken").unwrap();

    diaglens()
        .arg(&root)
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("malformed config"));
}

#[test]
fn threshold_override_changes_verdict() {
    // Healthy fixture nodes sit around 11-16% CPU; an aggressive override
    // turns them into findings.
    let (_bundle_guard, root) = BundleFixture::healthy().into_dir();
    let output = tempfile::tempdir().unwrap();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        config,
        "thresholds:\n  node:\n    cpu_percent:\n      warning: 5\n      critical: 10\n"
    )
    .unwrap();

    diaglens()
        .arg(&root)
        .arg("--output")
        .arg(output.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[critical]"));
}

#[test]
fn batch_flag_is_unimplemented_extension_point() {
    let (_bundle_guard, root) = BundleFixture::healthy().into_dir();

    diaglens()
        .arg(&root)
        .arg("--batch")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not implemented"));
}
