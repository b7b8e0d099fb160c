use diaglens_sources::{ArchiveError, ExtractLimits, snapshot_from_path};
use diaglens_testing::BundleFixture;
use diaglens_types::HealthStatus;

#[test]
fn directory_bundle_builds_full_snapshot() {
    let (_guard, root) = BundleFixture::healthy().into_dir();

    let snapshot = snapshot_from_path(&root, ExtractLimits::default()).unwrap();

    assert_eq!(snapshot.cluster_name, "prod-logs");
    assert!(snapshot.collected_at.is_some());
    assert_eq!(snapshot.health.as_ref().unwrap().status, HealthStatus::Green);
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.indices.len(), 2);
    assert_eq!(snapshot.shards.len(), 2);
    assert!(snapshot.warnings.is_empty());

    // All nodes were present in JSON, so all carry canonical ids
    assert!(snapshot.nodes.iter().all(|n| !n.partial));
    assert!(snapshot.node("aaa111").is_some());
    assert!(snapshot.node("bbb222").is_some());
    assert!(snapshot.node("ccc333").is_some());
}

#[test]
fn zip_bundle_builds_same_snapshot_as_directory() {
    let (_guard_dir, root) = BundleFixture::healthy().into_dir();
    let (_guard_zip, zip_path) = BundleFixture::healthy().into_zip();

    let from_dir = snapshot_from_path(&root, ExtractLimits::default()).unwrap();
    let from_zip = snapshot_from_path(&zip_path, ExtractLimits::default()).unwrap();

    assert_eq!(from_dir.cluster_name, from_zip.cluster_name);
    assert_eq!(from_dir.nodes.len(), from_zip.nodes.len());
    assert_eq!(from_dir.indices.len(), from_zip.indices.len());
    assert_eq!(from_dir.shards.len(), from_zip.shards.len());
}

#[test]
fn missing_sources_degrade_instead_of_failing() {
    // Only a manifest: everything else absent
    let (_guard, root) = BundleFixture::new()
        .with_manifest("lonely", "2024-05-02T10:00:00Z")
        .into_dir();

    let snapshot = snapshot_from_path(&root, ExtractLimits::default()).unwrap();
    assert_eq!(snapshot.cluster_name, "lonely");
    assert!(snapshot.health.is_none());
    assert!(snapshot.nodes.is_empty());
    assert!(snapshot.logs.is_empty());
    assert!(snapshot.gc.is_none());
}

#[test]
fn malformed_json_source_records_warning() {
    let (_guard, root) = BundleFixture::new()
        .with_health(diaglens_testing::HEALTHY_HEALTH)
        .with_nodes_table(diaglens_testing::HEALTHY_NODES)
        .with_nodes_json("{not json")
        .into_dir();

    let snapshot = snapshot_from_path(&root, ExtractLimits::default()).unwrap();
    // Table nodes survive with synthetic identities
    assert_eq!(snapshot.nodes.len(), 3);
    assert!(snapshot.nodes.iter().all(|n| n.partial));
    assert!(snapshot.warnings.iter().any(|w| w.contains("nodes.json")));
}

#[test]
fn oversized_bundle_hits_extraction_cap() {
    let big_log = "x".repeat(64 * 1024);
    let (_guard, zip_path) = BundleFixture::healthy()
        .with_log("server", &big_log)
        .into_zip();

    let limits = ExtractLimits {
        max_total_bytes: 8 * 1024,
    };
    match snapshot_from_path(&zip_path, limits) {
        Err(ArchiveError::SizeLimit { .. }) => {}
        other => panic!("expected size-limit failure, got {:?}", other.map(|s| s.cluster_name)),
    }
}

#[test]
fn gc_log_flows_into_snapshot_digest() {
    let gc_log = "\
[2024-05-02T10:00:00.000+0000][info][gc,start] GC(10) Pause Full
[2024-05-02T10:00:35.000+0000][info][gc] GC(10) Pause Full 35000.0ms
";
    let (_guard, root) = BundleFixture::healthy().with_log("gc", gc_log).into_dir();

    let snapshot = snapshot_from_path(&root, ExtractLimits::default()).unwrap();
    let gc = snapshot.gc.expect("gc digest");
    assert_eq!(gc.pauses.len(), 1);
    assert!((gc.pauses[0].duration_ms - 35000.0).abs() < 0.001);
}
