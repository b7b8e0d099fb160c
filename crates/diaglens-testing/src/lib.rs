//! Testing infrastructure for diaglens integration tests.
//!
//! `BundleFixture` fabricates diagnostic bundles (directory trees or ZIP
//! files) with whatever mix of sources a test needs.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Declarative diagnostic-bundle builder.
///
/// Starts empty; add sources with the `with_*` methods, then materialize
/// with [`BundleFixture::into_dir`] or [`BundleFixture::into_zip`]. Keep
/// the returned `TempDir` alive for the duration of the test.
#[derive(Default)]
pub struct BundleFixture {
    entries: Vec<(String, String)>,
}

impl BundleFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixture resembling a small healthy two-node cluster.
    pub fn healthy() -> Self {
        Self::new()
            .with_manifest("prod-logs", "2024-05-02T10:00:00Z")
            .with_health(HEALTHY_HEALTH)
            .with_nodes_table(HEALTHY_NODES)
            .with_nodes_json(HEALTHY_NODES_JSON)
            .with_indices_table(HEALTHY_INDICES)
            .with_shards_table(HEALTHY_SHARDS)
    }

    pub fn with_entry(mut self, path: &str, content: &str) -> Self {
        self.entries.push((path.to_string(), content.to_string()));
        self
    }

    pub fn with_manifest(self, cluster_name: &str, collected_at: &str) -> Self {
        let manifest = serde_json::json!({
            "cluster_name": cluster_name,
            "collected_at": collected_at,
        });
        self.with_entry("manifest.json", &manifest.to_string())
    }

    pub fn with_health(self, table: &str) -> Self {
        self.with_entry("cat/cat_health.txt", table)
    }

    pub fn with_nodes_table(self, table: &str) -> Self {
        self.with_entry("cat/cat_nodes.txt", table)
    }

    pub fn with_nodes_json(self, json: &str) -> Self {
        self.with_entry("nodes.json", json)
    }

    pub fn with_indices_table(self, table: &str) -> Self {
        self.with_entry("cat/cat_indices.txt", table)
    }

    pub fn with_indices_stats(self, json: &str) -> Self {
        self.with_entry("indices_stats.json", json)
    }

    pub fn with_shards_table(self, table: &str) -> Self {
        self.with_entry("cat/cat_shards.txt", table)
    }

    pub fn with_log(self, name: &str, text: &str) -> Self {
        self.with_entry(&format!("logs/{}.log", name), text)
    }

    /// Write the bundle as a directory tree.
    pub fn into_dir(self) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create tempdir");
        for (path, content) in &self.entries {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).expect("create bundle dirs");
            }
            std::fs::write(&full, content).expect("write bundle entry");
        }
        let root = dir.path().to_path_buf();
        (dir, root)
    }

    /// Write the bundle as a ZIP file.
    pub fn into_zip(self) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create tempdir");
        let zip_path = dir.path().join("diagnostic.zip");
        write_zip(&zip_path, &self.entries);
        (dir, zip_path)
    }
}

fn write_zip(path: &Path, entries: &[(String, String)]) {
    let file = File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(name.as_str(), options).expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}

// --- Canned sources ---

pub const HEALTHY_HEALTH: &str = "\
cluster_name  status  node.total  shards.primary  shards.active  shards.relocating  shards.initializing  shards.unassigned  shards.active_percent  pending_tasks
prod-logs     green   3           10              20             0                  0                  0                  100.0                  0
";

pub const HEALTHY_NODES: &str = "\
name    node.role    cpu    heap.percent    disk.used_percent    load_1m
node-1  master,data  10     40              35                   0.5
node-2  master,data  15     45              42                   0.9
node-3  master,data  12     38              30                   0.4
";

pub const HEALTHY_NODES_JSON: &str = r#"{
  "nodes": {
    "aaa111": {
      "name": "node-1",
      "roles": ["master", "data"],
      "jvm": { "mem": { "heap_used_percent": 41 } },
      "os": { "cpu": { "percent": 11, "load_average": { "1m": 0.5 } } },
      "thread_pool": { "search": { "queue": 1, "rejected": 0 } }
    },
    "bbb222": {
      "name": "node-2",
      "roles": ["master", "data"],
      "jvm": { "mem": { "heap_used_percent": 44 } },
      "os": { "cpu": { "percent": 16, "load_average": { "1m": 0.9 } } },
      "thread_pool": { "search": { "queue": 0, "rejected": 0 } }
    },
    "ccc333": {
      "name": "node-3",
      "roles": ["master", "data"],
      "jvm": { "mem": { "heap_used_percent": 39 } },
      "os": { "cpu": { "percent": 13, "load_average": { "1m": 0.4 } } },
      "thread_pool": { "search": { "queue": 0, "rejected": 0 } }
    }
  }
}"#;

pub const HEALTHY_INDICES: &str = "\
index   health  pri  rep  docs.count  store.size
logs-1  green   1    1    100000      2gb
logs-2  green   1    1    250000      4gb
";

pub const HEALTHY_SHARDS: &str = "\
shard  index   prirep  state    docs   store  node    unassigned.reason
0      logs-1  p       STARTED  50000  1gb    node-1
0      logs-1  r       STARTED  50000  1gb    node-2
";

/// Health table for a degraded cluster: red status, unassigned shards.
pub const RED_HEALTH: &str = "\
cluster_name  status  node.total  shards.primary  shards.active  shards.relocating  shards.initializing  shards.unassigned  shards.active_percent  pending_tasks
prod-logs     red     2           10              17             0                  0                  3                  85.0                   12
";

pub const RED_INDICES: &str = "\
index   health  pri  rep  docs.count  store.size
logs-1  red     1    1    100000      2gb
logs-2  green   1    1    250000      4gb
";
