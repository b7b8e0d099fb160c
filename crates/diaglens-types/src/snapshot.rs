use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Health status reported for the cluster or an individual index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl HealthStatus {
    /// Parse the status token used by the tabular sources ("green"/"yellow"/"red").
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "green" => HealthStatus::Green,
            "yellow" => HealthStatus::Yellow,
            "red" => HealthStatus::Red,
            _ => HealthStatus::Unknown,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
            HealthStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Cluster-wide health summary parsed from the health table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub status: HealthStatus,
    pub number_of_nodes: u64,
    pub active_primary_shards: u64,
    pub active_shards: u64,
    pub relocating_shards: u64,
    pub initializing_shards: u64,
    pub unassigned_shards: u64,
    pub active_shards_percent: f64,
    pub pending_tasks: u64,
    pub documents_count: u64,
    /// Human-readable store size as reported by the source (e.g. "1.2gb").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_size: Option<String>,
}

/// Per-pool queue depth and lifetime rejection count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThreadPoolStats {
    pub queue: u64,
    pub rejected: u64,
}

/// Circuit-breaker state for one breaker on one node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakerStats {
    /// Lifetime trip count; nonzero means the breaker has fired.
    pub tripped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated: Option<String>,
}

/// One node of the cluster, reconciled across tabular and JSON sources.
///
/// The canonical `id` is the identity reported by the JSON source. Nodes seen
/// only in a tabular source carry a synthetic id derived from their name and
/// are flagged `partial`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    /// True when no JSON identity was available for this node.
    pub partial: bool,
    /// Role tags (master/data/ingest/...); a node may hold several.
    pub roles: BTreeSet<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap_used_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heap_max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_1m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_5m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_15m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_used_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_total: Option<String>,

    /// Thread-pool stats keyed by pool name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub thread_pools: BTreeMap<String, ThreadPoolStats>,
    /// Circuit breakers keyed by breaker name; only tripped breakers are kept.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub breakers: BTreeMap<String, BreakerStats>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_old_collection_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_young_collection_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            partial: false,
            roles: BTreeSet::new(),
            heap_used_percent: None,
            heap_used: None,
            heap_max: None,
            cpu_percent: None,
            load_1m: None,
            load_5m: None,
            load_15m: None,
            disk_used_percent: None,
            disk_used: None,
            disk_total: None,
            thread_pools: BTreeMap::new(),
            breakers: BTreeMap::new(),
            gc_old_collection_ms: None,
            gc_young_collection_ms: None,
            version: None,
        }
    }

    /// Total rejections across all thread pools.
    pub fn total_rejections(&self) -> u64 {
        self.thread_pools.values().map(|p| p.rejected).sum()
    }
}

/// One index with its shard layout and optional mapping stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub name: String,
    pub health: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_shards: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_shards: Option<u64>,
    /// Top-level mapped field count, from the stats JSON when collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_count: Option<u64>,
    /// Maximum mapping nesting depth, from the stats JSON when collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_depth: Option<u64>,
}

impl IndexRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: HealthStatus::Unknown,
            docs_count: None,
            store_size: None,
            primary_shards: None,
            replica_shards: None,
            field_count: None,
            mapping_depth: None,
        }
    }
}

/// Allocation state of a single shard copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardState {
    Started,
    Relocating,
    Initializing,
    Unassigned,
    Unknown,
}

impl ShardState {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "STARTED" => ShardState::Started,
            "RELOCATING" => ShardState::Relocating,
            "INITIALIZING" => ShardState::Initializing,
            "UNASSIGNED" => ShardState::Unassigned,
            _ => ShardState::Unknown,
        }
    }
}

/// One shard copy. `node` is a lookup-only reference into the node set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardRecord {
    pub index: String,
    pub shard: u64,
    pub primary: bool,
    pub state: ShardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unassigned_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

/// Severity of a scanned log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Unknown,
}

impl LogLevel {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "ERROR" | "FATAL" => LogLevel::Error,
            "WARN" | "WARNING" => LogLevel::Warn,
            "INFO" => LogLevel::Info,
            "DEBUG" => LogLevel::Debug,
            "TRACE" => LogLevel::Trace,
            _ => LogLevel::Unknown,
        }
    }
}

/// One scanned log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub message: String,
    /// Operation duration extracted from the message, when one is reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

/// A stitched garbage-collection pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcPause {
    /// Collector-assigned pause id, when the source reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// GC activity digest built from the GC log.
///
/// Present only when a GC log was collected; an empty pause list then means
/// "scanned and clean", which downstream checks treat differently from "no
/// GC data at all".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GcDigest {
    pub pauses: Vec<GcPause>,
    pub total_pause_ms: f64,
    /// Pauses whose end marker never appeared; reported, never emitted.
    pub truncated: usize,
}

/// Point-in-time normalized view of one diagnostic bundle.
///
/// Built once per bundle and immutable afterwards. Entity collections keep
/// first-seen order and have unique ids within their type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<ClusterHealth>,
    pub nodes: Vec<NodeRecord>,
    pub indices: Vec<IndexRecord>,
    pub shards: Vec<ShardRecord>,
    /// Scanned error/warning entries per log name. Empty when no logs were
    /// collected, which makes log-dependent checks inapplicable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub logs: BTreeMap<String, Vec<LogLine>>,
    /// GC digest; `None` when no GC log was collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc: Option<GcDigest>,
    /// Arbitrary configuration facts derived during extraction
    /// (e.g. "swap.enabled", "fd.limit_warnings").
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facts: BTreeMap<String, String>,
    /// Per-source degradation notes recorded while building the snapshot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ClusterSnapshot {
    pub fn empty(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
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

    /// Look up a node by canonical id, then by name.
    pub fn node(&self, key: &str) -> Option<&NodeRecord> {
        self.nodes
            .iter()
            .find(|n| n.id == key)
            .or_else(|| self.nodes.iter().find(|n| n.name == key))
    }

    pub fn index(&self, name: &str) -> Option<&IndexRecord> {
        self.indices.iter().find(|i| i.name == name)
    }

    /// Whether any index carries mapping stats (field count / depth).
    pub fn has_mapping_stats(&self) -> bool {
        self.indices
            .iter()
            .any(|i| i.field_count.is_some() || i.mapping_depth.is_some())
    }

    /// All scanned log entries across log files, in per-file order.
    pub fn log_entries(&self) -> impl Iterator<Item = &LogLine> {
        self.logs.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_parse() {
        assert_eq!(HealthStatus::parse("green"), HealthStatus::Green);
        assert_eq!(HealthStatus::parse(" RED "), HealthStatus::Red);
        assert_eq!(HealthStatus::parse("purple"), HealthStatus::Unknown);
    }

    #[test]
    fn test_shard_state_parse() {
        assert_eq!(ShardState::parse("STARTED"), ShardState::Started);
        assert_eq!(ShardState::parse("unassigned"), ShardState::Unassigned);
        assert_eq!(ShardState::parse("???"), ShardState::Unknown);
    }

    #[test]
    fn test_node_lookup_by_id_then_name() {
        let mut snapshot = ClusterSnapshot::empty("test");
        snapshot.nodes.push(NodeRecord::new("abc123", "node-1"));

        assert!(snapshot.node("abc123").is_some());
        assert!(snapshot.node("node-1").is_some());
        assert!(snapshot.node("node-2").is_none());
    }

    #[test]
    fn test_total_rejections_sums_pools() {
        let mut node = NodeRecord::new("id", "n");
        node.thread_pools.insert(
            "search".to_string(),
            ThreadPoolStats {
                queue: 10,
                rejected: 3,
            },
        );
        node.thread_pools.insert(
            "write".to_string(),
            ThreadPoolStats {
                queue: 0,
                rejected: 4,
            },
        );
        assert_eq!(node.total_rejections(), 7);
    }
}
