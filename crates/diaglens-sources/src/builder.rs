use crate::error::ParseError;
use crate::extract::SourceSet;
use crate::jsonpath::{EntityPaths, JsonPathExtractor, TargetKind};
use crate::logscan::{LogEvent, LogScanner};
use crate::table::{TableParser, TableRecord};
use chrono::{DateTime, Utc};
use diaglens_types::{
    ClusterHealth, ClusterSnapshot, GcDigest, HealthStatus, IndexRecord, LogLevel, LogLine,
    NodeRecord, ShardRecord, ShardState, ThreadPoolStats, BreakerStats, format_bytes,
    parse_f64, parse_percent, parse_u64, synthetic_node_id,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Aggregates parser outputs into a single immutable `ClusterSnapshot`.
///
/// Identity rule: a node's canonical id is the one the JSON source
/// reports; table-only nodes get a name-derived synthetic id and are
/// flagged partial. Merge rule: where both sources carry the same metric,
/// the JSON value wins and the tabular value is only a fallback.
///
/// Building never fails outright on a missing or malformed source: the
/// category stays absent, a warning is recorded, and downstream checks
/// that need it are skipped rather than failed.
pub struct SnapshotBuilder {
    cluster_name: Option<String>,
    collected_at: Option<DateTime<Utc>>,
    health: Option<ClusterHealth>,
    nodes: Vec<NodeRecord>,
    indices: Vec<IndexRecord>,
    shards: Vec<ShardRecord>,
    logs: BTreeMap<String, Vec<LogLine>>,
    gc: Option<GcDigest>,
    facts: BTreeMap<String, String>,
    warnings: Vec<String>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            cluster_name: None,
            collected_at: None,
            health: None,
            nodes: Vec::new(),
            indices: Vec::new(),
            shards: Vec::new(),
            logs: BTreeMap::new(),
            gc: None,
            facts: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Build a snapshot from an extracted source set.
    pub fn from_sources(sources: &SourceSet) -> ClusterSnapshot {
        let mut builder = Self::new();

        if let Some(text) = sources.json("manifest") {
            builder.ingest_manifest(text);
        }
        if let Some(text) = sources.table("cat_health") {
            builder.ingest_health(text);
        }

        let nodes_json = sources.json("nodes").and_then(|t| builder.parse_json("nodes.json", t));
        builder.ingest_nodes(sources.table("cat_nodes"), nodes_json.as_ref());

        let stats_json = sources
            .json("indices_stats")
            .and_then(|t| builder.parse_json("indices_stats.json", t));
        builder.ingest_indices(sources.table("cat_indices"), stats_json.as_ref());

        if let Some(text) = sources.table("cat_shards") {
            builder.ingest_shards(text);
        }

        for (name, text) in &sources.logs {
            builder.ingest_log(name, text);
        }

        builder.build()
    }

    fn record_warning(&mut self, err: ParseError) {
        warn!(source = %err.source, "source degraded: {}", err.message);
        self.warnings.push(err.to_string());
    }

    fn parse_json(&mut self, source: &str, text: &str) -> Option<Value> {
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_warning(ParseError::new(source, err.to_string()));
                None
            }
        }
    }

    pub fn ingest_manifest(&mut self, text: &str) {
        let Some(manifest) = self.parse_json("manifest.json", text) else {
            return;
        };
        if self.cluster_name.is_none() {
            self.cluster_name = manifest
                .get("cluster_name")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        self.collected_at = manifest
            .get("collected_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
    }

    pub fn ingest_health(&mut self, text: &str) {
        let records = match TableParser::parse("cat_health", text) {
            Ok(records) => records,
            Err(err) => {
                self.record_warning(err);
                return;
            }
        };
        let Some(row) = records.first() else {
            self.record_warning(ParseError::new("cat_health", "no data rows"));
            return;
        };

        if let Some(name) = row.get("cluster_name") {
            self.cluster_name = Some(name.to_string());
        }

        let count = |column: &str| row.get(column).and_then(parse_u64).unwrap_or(0);
        self.health = Some(ClusterHealth {
            status: row
                .get("status")
                .map(HealthStatus::parse)
                .unwrap_or(HealthStatus::Unknown),
            number_of_nodes: count("node.total"),
            active_primary_shards: count("shards.primary"),
            active_shards: count("shards.active"),
            relocating_shards: count("shards.relocating"),
            initializing_shards: count("shards.initializing"),
            unassigned_shards: count("shards.unassigned"),
            active_shards_percent: row
                .get("shards.active_percent")
                .and_then(parse_percent)
                .unwrap_or(100.0),
            pending_tasks: count("pending_tasks"),
            documents_count: count("docs.count"),
            store_size: row.get("store.size").map(str::to_string),
        });
    }

    pub fn ingest_nodes(&mut self, table: Option<&str>, json: Option<&Value>) {
        if let Some(text) = table {
            match TableParser::parse("cat_nodes", text) {
                Ok(records) => {
                    for row in &records {
                        if let Some(node) = node_from_row(row) {
                            self.nodes.push(node);
                        }
                    }
                }
                Err(err) => self.record_warning(err),
            }
        }

        let Some(doc) = json else { return };
        for (id, paths) in JsonPathExtractor::extract(doc, TargetKind::Node) {
            let name = paths.text("name").unwrap_or(id.as_str()).to_string();

            let position = self.nodes.iter().position(|n| n.name == name);
            match position {
                Some(pos) => {
                    let node = &mut self.nodes[pos];
                    node.id = id;
                    node.partial = false;
                    apply_node_paths(node, &paths);
                }
                None => {
                    let mut node = NodeRecord::new(id, name);
                    apply_node_paths(&mut node, &paths);
                    self.nodes.push(node);
                }
            }
        }
    }

    pub fn ingest_indices(&mut self, table: Option<&str>, stats: Option<&Value>) {
        if let Some(text) = table {
            match TableParser::parse("cat_indices", text) {
                Ok(records) => {
                    for row in &records {
                        let Some(name) = row.get("index") else { continue };
                        let mut index = IndexRecord::new(name);
                        index.health = row
                            .get("health")
                            .map(HealthStatus::parse)
                            .unwrap_or(HealthStatus::Unknown);
                        index.primary_shards = row.get("pri").and_then(parse_u64);
                        index.replica_shards = row.get("rep").and_then(parse_u64);
                        index.docs_count = row.get("docs.count").and_then(parse_u64);
                        index.store_size = row.get("store.size").map(str::to_string);
                        self.indices.push(index);
                    }
                }
                Err(err) => self.record_warning(err),
            }
        }

        let Some(doc) = stats else { return };
        for (name, paths) in JsonPathExtractor::extract(doc, TargetKind::Index) {
            let pos = match self.indices.iter().position(|i| i.name == name) {
                Some(pos) => pos,
                None => {
                    self.indices.push(IndexRecord::new(&name));
                    self.indices.len() - 1
                }
            };
            let index = &mut self.indices[pos];
            let (field_count, mapping_depth) = mapping_stats(&paths);
            if field_count > 0 {
                index.field_count = Some(field_count);
            }
            if mapping_depth > 0 {
                index.mapping_depth = Some(mapping_depth);
            }
        }
    }

    pub fn ingest_shards(&mut self, text: &str) {
        let records =
            match TableParser::parse_guarded("cat_shards", text, |t| t.parse::<u64>().is_ok()) {
                Ok(records) => records,
                Err(err) => {
                    self.record_warning(err);
                    return;
                }
            };

        for row in &records {
            let Some(index) = row.get("index") else { continue };
            let state = row
                .get("state")
                .map(ShardState::parse)
                .unwrap_or(ShardState::Unknown);

            let mut reason = row.get("unassigned.reason").map(str::to_string);
            if let Some(extra) = row.extra() {
                reason = Some(match reason {
                    Some(mut existing) => {
                        existing.push(' ');
                        existing.push_str(extra);
                        existing
                    }
                    None => extra.to_string(),
                });
            }

            self.shards.push(ShardRecord {
                index: index.to_string(),
                shard: row.get("shard").and_then(parse_u64).unwrap_or(0),
                primary: row.get("prirep") == Some("p"),
                state,
                node: row.get("node").map(str::to_string),
                unassigned_reason: if state == ShardState::Unassigned {
                    reason
                } else {
                    None
                },
                docs: row.get("docs").and_then(parse_u64),
                store: row.get("store").map(str::to_string),
            });
        }
    }

    pub fn ingest_log(&mut self, name: &str, text: &str) {
        let scanner = LogScanner::new(text);
        let mut scan = scanner.scan();
        let mut entries = Vec::new();
        let mut pauses = Vec::new();

        for event in scan.by_ref() {
            match event {
                LogEvent::Entry(entry) => {
                    if matches!(entry.level, LogLevel::Error | LogLevel::Warn) {
                        self.derive_facts(&entry.message);
                        entries.push(entry);
                    }
                }
                LogEvent::GcPause(pause) => pauses.push(pause),
            }
        }
        let truncated = scan.truncated();

        if name.starts_with("gc") || !pauses.is_empty() || truncated > 0 {
            let digest = self.gc.get_or_insert_with(GcDigest::default);
            digest.total_pause_ms += pauses.iter().map(|p| p.duration_ms).sum::<f64>();
            digest.pauses.extend(pauses);
            digest.truncated += truncated;
        }

        self.logs.insert(name.to_string(), entries);
    }

    fn derive_facts(&mut self, message: &str) {
        let lower = message.to_ascii_lowercase();
        if lower.contains("swap") && lower.contains("enabled") {
            self.facts
                .insert("swap.enabled".to_string(), "true".to_string());
        }
        if lower.contains("max file descriptors") || lower.contains("too many open files") {
            let count = self
                .facts
                .get("fd.limit_warnings")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            self.facts
                .insert("fd.limit_warnings".to_string(), (count + 1).to_string());
        }
    }

    /// Finish and hand over the immutable snapshot.
    pub fn build(self) -> ClusterSnapshot {
        ClusterSnapshot {
            cluster_name: self.cluster_name.unwrap_or_else(|| "unknown".to_string()),
            collected_at: self.collected_at,
            health: self.health,
            nodes: self.nodes,
            indices: self.indices,
            shards: self.shards,
            logs: self.logs,
            gc: self.gc,
            facts: self.facts,
            warnings: self.warnings,
        }
    }
}

fn node_from_row(row: &TableRecord) -> Option<NodeRecord> {
    let name = row.get("name")?;
    let mut node = NodeRecord::new(synthetic_node_id(name), name);
    node.partial = true;
    if let Some(roles) = row.get("node.role") {
        node.roles = roles
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<String>>();
    }
    node.cpu_percent = row.get("cpu").and_then(parse_percent);
    node.heap_used_percent = row.get("heap.percent").and_then(parse_percent);
    node.heap_used = row.get("heap.current").map(str::to_string);
    node.heap_max = row.get("heap.max").map(str::to_string);
    node.disk_used_percent = row.get("disk.used_percent").and_then(parse_percent);
    node.disk_used = row.get("disk.used").map(str::to_string);
    node.disk_total = row.get("disk.total").map(str::to_string);
    node.load_1m = row.get("load_1m").and_then(parse_f64);
    node.load_5m = row.get("load_5m").and_then(parse_f64);
    node.load_15m = row.get("load_15m").and_then(parse_f64);
    node.version = row.get("version").map(str::to_string);
    Some(node)
}

/// Apply JSON-sourced metrics onto `node`. JSON values overwrite; table
/// values survive only where JSON is silent.
fn apply_node_paths(node: &mut NodeRecord, paths: &EntityPaths) {
    let roles: BTreeSet<String> = paths
        .with_prefix("roles.")
        .filter_map(|(_, v)| v.as_str().map(str::to_string))
        .collect();
    if !roles.is_empty() {
        node.roles = roles;
    }

    if let Some(percent) = paths.number("jvm.mem.heap_used_percent") {
        node.heap_used_percent = Some(percent);
    } else if node.heap_used_percent.is_none() {
        let used = paths.number("jvm.mem.heap_used_in_bytes");
        let max = paths.number("jvm.mem.heap_max_in_bytes");
        if let (Some(used), Some(max)) = (used, max) {
            if max > 0.0 {
                node.heap_used_percent = Some(used / max * 100.0);
            }
        }
    }
    if let Some(used) = paths.number("jvm.mem.heap_used_in_bytes") {
        node.heap_used = Some(format_bytes(used as u64));
    }
    if let Some(max) = paths.number("jvm.mem.heap_max_in_bytes") {
        node.heap_max = Some(format_bytes(max as u64));
    }
    if let Some(cpu) = paths.number("os.cpu.percent") {
        node.cpu_percent = Some(cpu);
    }
    if let Some(load) = paths.number("os.cpu.load_average.1m") {
        node.load_1m = Some(load);
    }
    if let Some(load) = paths.number("os.cpu.load_average.5m") {
        node.load_5m = Some(load);
    }
    if let Some(load) = paths.number("os.cpu.load_average.15m") {
        node.load_15m = Some(load);
    }
    if let Some(ms) = paths.number("jvm.gc.collectors.old.collection_time_in_millis") {
        node.gc_old_collection_ms = Some(ms);
    }
    if let Some(ms) = paths.number("jvm.gc.collectors.young.collection_time_in_millis") {
        node.gc_young_collection_ms = Some(ms);
    }
    if let Some(version) = paths.text("version") {
        node.version = Some(version.to_string());
    }

    let mut pools: BTreeMap<String, ThreadPoolStats> = BTreeMap::new();
    for (rest, value) in paths.with_prefix("thread_pool.") {
        let Some((pool, field)) = rest.rsplit_once('.') else {
            continue;
        };
        let Some(number) = value.as_f64() else { continue };
        let stats = pools.entry(pool.to_string()).or_default();
        match field {
            "queue" => stats.queue = number as u64,
            "rejected" => stats.rejected = number as u64,
            _ => {}
        }
    }
    if !pools.is_empty() {
        node.thread_pools = pools;
    }

    let mut breakers: BTreeMap<String, BreakerStats> = BTreeMap::new();
    for (rest, value) in paths.with_prefix("breakers.") {
        let Some((breaker, field)) = rest.rsplit_once('.') else {
            continue;
        };
        if field != "tripped" {
            continue;
        }
        let tripped = value.as_f64().unwrap_or(0.0) as u64;
        if tripped == 0 {
            continue;
        }
        breakers.insert(
            breaker.to_string(),
            BreakerStats {
                tripped,
                limit: paths
                    .number(&format!("breakers.{}.limit_size_in_bytes", breaker))
                    .map(|b| format_bytes(b as u64)),
                estimated: paths
                    .number(&format!("breakers.{}.estimated_size_in_bytes", breaker))
                    .map(|b| format_bytes(b as u64)),
            },
        );
    }
    if !breakers.is_empty() {
        node.breakers = breakers;
    }
}

/// Field count (top-level mapped fields) and mapping depth (nested
/// `properties` levels), computed straight off the flattened paths.
fn mapping_stats(paths: &EntityPaths) -> (u64, u64) {
    let mut top_level: BTreeSet<&str> = BTreeSet::new();
    let mut depth: u64 = 0;

    for (rest, _) in paths.with_prefix("mappings.properties.") {
        if let Some(field) = rest.split('.').next() {
            top_level.insert(field);
        }
    }
    for path in paths.values.keys() {
        if path.starts_with("mappings.") {
            let levels = path.split('.').filter(|s| *s == "properties").count() as u64;
            if levels > depth {
                depth = levels;
            }
        }
    }

    (top_level.len() as u64, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NODES_TABLE: &str = "\
name    node.role    cpu    heap.percent    heap.current    heap.max    disk.used_percent    load_1m
node-1  master,data  12     45              2.1gb           4gb         40                   0.8
node-2  data         93     81              3.8gb           4gb         85                   11.2
";

    fn nodes_json() -> Value {
        json!({
            "nodes": {
                "uZfA1Qkq": {
                    "name": "node-1",
                    "roles": ["master", "data"],
                    "jvm": {
                        "mem": {
                            "heap_used_percent": 47,
                            "heap_used_in_bytes": 2254857830u64,
                            "heap_max_in_bytes": 4294967296u64
                        },
                        "gc": { "collectors": {
                            "old": { "collection_time_in_millis": 1200 },
                            "young": { "collection_time_in_millis": 340 }
                        }}
                    },
                    "os": { "cpu": { "percent": 14, "load_average": { "1m": 0.9 } } },
                    "thread_pool": {
                        "search": { "queue": 2, "rejected": 0 },
                        "write": { "queue": 0, "rejected": 7 }
                    },
                    "breakers": {
                        "parent": {
                            "tripped": 3,
                            "limit_size_in_bytes": 4080218931u64,
                            "estimated_size_in_bytes": 3900000000u64
                        },
                        "fielddata": { "tripped": 0 }
                    }
                }
            }
        })
    }

    #[test]
    fn test_node_in_both_sources_gets_json_identity() {
        let mut builder = SnapshotBuilder::new();
        let json = nodes_json();
        builder.ingest_nodes(Some(NODES_TABLE), Some(&json));
        let snapshot = builder.build();

        let node = snapshot.node("uZfA1Qkq").expect("merged node");
        assert_eq!(node.name, "node-1");
        assert!(!node.partial);
        // JSON wins over the table's 45
        assert_eq!(node.heap_used_percent, Some(47.0));
        assert_eq!(node.cpu_percent, Some(14.0));
        // Table-only metric survives as fallback
        assert_eq!(node.disk_used_percent, Some(40.0));
        assert_eq!(node.thread_pools["write"].rejected, 7);
        assert_eq!(node.breakers.len(), 1);
        assert_eq!(node.breakers["parent"].tripped, 3);
    }

    #[test]
    fn test_table_only_node_gets_synthetic_partial_id() {
        let mut builder = SnapshotBuilder::new();
        let json = nodes_json();
        builder.ingest_nodes(Some(NODES_TABLE), Some(&json));
        let snapshot = builder.build();

        let node = snapshot.node("node-2").expect("table-only node");
        assert!(node.partial);
        assert_eq!(node.id, synthetic_node_id("node-2"));
        assert_eq!(node.heap_used_percent, Some(81.0));
    }

    #[test]
    fn test_json_only_node_is_added() {
        let mut builder = SnapshotBuilder::new();
        let json = nodes_json();
        builder.ingest_nodes(None, Some(&json));
        let snapshot = builder.build();

        assert_eq!(snapshot.nodes.len(), 1);
        let node = &snapshot.nodes[0];
        assert_eq!(node.id, "uZfA1Qkq");
        assert!(!node.partial);
        assert_eq!(node.gc_old_collection_ms, Some(1200.0));
    }

    #[test]
    fn test_health_row_parsed() {
        let text = "\
cluster_name  status  node.total  shards.primary  shards.active  shards.relocating  shards.initializing  shards.unassigned  shards.active_percent  pending_tasks
prod-logs     yellow  3           12              22             0                  0                  2                  91.7                   4
";
        let mut builder = SnapshotBuilder::new();
        builder.ingest_health(text);
        let snapshot = builder.build();

        assert_eq!(snapshot.cluster_name, "prod-logs");
        let health = snapshot.health.expect("health");
        assert_eq!(health.status, HealthStatus::Yellow);
        assert_eq!(health.unassigned_shards, 2);
        assert!((health.active_shards_percent - 91.7).abs() < 0.001);
        assert_eq!(health.pending_tasks, 4);
    }

    #[test]
    fn test_mapping_stats_from_index_stats() {
        let stats = json!({
            "indices": {
                "logs-1": {
                    "mappings": { "properties": {
                        "user": { "properties": {
                            "address": { "properties": { "city": { "type": "keyword" } } }
                        }},
                        "message": { "type": "text" }
                    }}
                }
            }
        });
        let table = "\
index   health  pri  rep  docs.count  store.size
logs-1  green   2    1    1000        5gb
";
        let mut builder = SnapshotBuilder::new();
        builder.ingest_indices(Some(table), Some(&stats));
        let snapshot = builder.build();

        let index = snapshot.index("logs-1").expect("index");
        assert_eq!(index.field_count, Some(2));
        assert_eq!(index.mapping_depth, Some(3));
        assert_eq!(index.health, HealthStatus::Green);
    }

    #[test]
    fn test_shards_with_unassigned_reason() {
        let text = "\
shard  index   prirep  state       docs  store  node    unassigned.reason
0      logs-1  p       STARTED     1000  1gb    node-1
1      logs-1  r       UNASSIGNED
";
        let mut builder = SnapshotBuilder::new();
        builder.ingest_shards(text);
        let snapshot = builder.build();

        assert_eq!(snapshot.shards.len(), 2);
        assert_eq!(snapshot.shards[0].state, ShardState::Started);
        assert!(snapshot.shards[0].primary);
        assert_eq!(snapshot.shards[1].state, ShardState::Unassigned);
        assert!(!snapshot.shards[1].primary);
    }

    #[test]
    fn test_malformed_source_degrades_with_warning() {
        let mut builder = SnapshotBuilder::new();
        builder.ingest_health("");
        builder.ingest_nodes(None, None);
        let snapshot = builder.build();

        assert!(snapshot.health.is_none());
        assert!(snapshot.nodes.is_empty());
        assert_eq!(snapshot.warnings.len(), 1);
        assert!(snapshot.warnings[0].contains("cat_health"));
    }

    #[test]
    fn test_gc_log_produces_digest() {
        let text = "\
[2024-05-02T10:00:00.000+0000][info][gc,start] GC(1) Pause Young
[2024-05-02T10:00:00.000+0000][info][gc] GC(1) Pause Young 11000.0ms
[2024-05-02T10:00:30.000+0000][info][gc,start] GC(2) Pause Full
";
        let mut builder = SnapshotBuilder::new();
        builder.ingest_log("gc", text);
        let snapshot = builder.build();

        let gc = snapshot.gc.expect("gc digest");
        assert_eq!(gc.pauses.len(), 1);
        assert_eq!(gc.truncated, 1);
        assert!((gc.total_pause_ms - 11000.0).abs() < 0.001);
    }

    #[test]
    fn test_server_log_keeps_only_findings() {
        let text = "\
[2024-05-02T10:00:00,100][INFO ][o.e.n.Node] [node-1] started
[2024-05-02T10:00:01,200][WARN ][o.e.b.BootstrapChecks] [node-1] memory locking requested but swap is enabled
";
        let mut builder = SnapshotBuilder::new();
        builder.ingest_log("server", text);
        let snapshot = builder.build();

        assert_eq!(snapshot.logs["server"].len(), 1);
        assert_eq!(snapshot.facts.get("swap.enabled").map(String::as_str), Some("true"));
        assert!(snapshot.gc.is_none());
    }
}
