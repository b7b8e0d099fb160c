use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Warning/critical bounds for one metric. Either bound may be absent;
/// an absent bound is simply never breached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

impl Bounds {
    pub fn warn(warning: f64) -> Self {
        Self {
            warning: Some(warning),
            critical: None,
        }
    }

    pub fn warn_crit(warning: f64, critical: f64) -> Self {
        Self {
            warning: Some(warning),
            critical: Some(critical),
        }
    }

    pub fn crit(critical: f64) -> Self {
        Self {
            warning: None,
            critical: Some(critical),
        }
    }
}

/// Threshold sections, one per metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSection {
    Cluster,
    Node,
    Index,
}

/// Per-category metric bounds. Metrics absent from a loaded config fall
/// back to the documented defaults at lookup time, so a partial override
/// file never loses the rest of the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub cluster: BTreeMap<String, Bounds>,
    #[serde(default)]
    pub node: BTreeMap<String, Bounds>,
    #[serde(default)]
    pub index: BTreeMap<String, Bounds>,
}

impl ThresholdConfig {
    /// Documented default bounds.
    pub fn defaults() -> Self {
        let mut cluster = BTreeMap::new();
        cluster.insert("active_shards_percent".to_string(), Bounds::warn_crit(90.0, 70.0));
        cluster.insert("relocating_shards".to_string(), Bounds::crit(50.0));
        cluster.insert("pending_tasks".to_string(), Bounds::warn(100.0));

        let mut node = BTreeMap::new();
        node.insert("heap_used_percent".to_string(), Bounds::warn_crit(75.0, 85.0));
        node.insert("cpu_percent".to_string(), Bounds::warn_crit(70.0, 90.0));
        node.insert("disk_used_percent".to_string(), Bounds::warn_crit(80.0, 90.0));
        node.insert("load_1m".to_string(), Bounds::warn(10.0));
        node.insert("gc_duration_s".to_string(), Bounds::warn_crit(10.0, 30.0));
        node.insert("long_gc_pause_s".to_string(), Bounds::crit(30.0));

        let mut index = BTreeMap::new();
        index.insert("large_index_gb".to_string(), Bounds::warn(100.0));
        index.insert("many_small_indices_count".to_string(), Bounds::warn(1000.0));
        index.insert("many_small_indices_avg_gb".to_string(), Bounds::warn(1.0));
        index.insert("field_count".to_string(), Bounds::warn(1000.0));
        index.insert("nesting_depth".to_string(), Bounds::warn(20.0));

        Self {
            cluster,
            node,
            index,
        }
    }

    fn section(&self, section: ThresholdSection) -> &BTreeMap<String, Bounds> {
        match section {
            ThresholdSection::Cluster => &self.cluster,
            ThresholdSection::Node => &self.node,
            ThresholdSection::Index => &self.index,
        }
    }

    /// Bounds for `metric`, falling back to the defaults table when the
    /// metric is absent from this config.
    pub fn bounds(&self, section: ThresholdSection, metric: &str) -> Bounds {
        if let Some(bounds) = self.section(section).get(metric) {
            return *bounds;
        }
        static DEFAULTS: OnceLock<ThresholdConfig> = OnceLock::new();
        DEFAULTS
            .get_or_init(ThresholdConfig::defaults)
            .section(section)
            .get(metric)
            .copied()
            .unwrap_or_default()
    }
}

/// Remediation guidance for one check id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Mapping from check id to remediation guidance, loaded once at startup.
/// An id with no entry resolves to an empty list, never a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationLibrary {
    pub entries: BTreeMap<String, Recommendation>,
}

impl RecommendationLibrary {
    /// Built-in guidance for the checks that ship with the tool.
    pub fn defaults() -> Self {
        let mut entries = BTreeMap::new();

        entries.insert(
            "high_heap_usage".to_string(),
            Recommendation {
                message: "JVM heap usage exceeds threshold".to_string(),
                recommendations: vec![
                    "Increase heap size via the -Xmx parameter".to_string(),
                    "Check for memory leaks via heap dump analysis".to_string(),
                    "Reduce concurrent query or indexing load".to_string(),
                    "Review field data cache size".to_string(),
                ],
            },
        );
        entries.insert(
            "cluster_status_red".to_string(),
            Recommendation {
                message: "Cluster is not healthy".to_string(),
                recommendations: vec![
                    "Check unassigned shards and node failures".to_string(),
                    "Ensure all nodes are healthy and running".to_string(),
                    "Review cluster state".to_string(),
                ],
            },
        );
        entries.insert(
            "cluster_status_yellow".to_string(),
            Recommendation {
                message: "Cluster has unassigned replicas".to_string(),
                recommendations: vec![
                    "Check for unassigned shards or replica allocation issues".to_string(),
                ],
            },
        );
        entries.insert(
            "unassigned_shards".to_string(),
            Recommendation {
                message: "Unassigned shards detected".to_string(),
                recommendations: vec![
                    "Use the allocation explain API to determine the cause".to_string(),
                    "Check disk space on all nodes".to_string(),
                    "Verify node capacity and health".to_string(),
                    "Review shard allocation settings".to_string(),
                ],
            },
        );
        entries.insert(
            "thread_pool_rejections".to_string(),
            Recommendation {
                message: "Thread pool rejections detected".to_string(),
                recommendations: vec![
                    "Increase thread pool sizes".to_string(),
                    "Reduce concurrent operations".to_string(),
                    "Check for resource saturation".to_string(),
                ],
            },
        );
        entries.insert(
            "circuit_breakers".to_string(),
            Recommendation {
                message: "Circuit breakers tripped".to_string(),
                recommendations: vec![
                    "Reduce request size".to_string(),
                    "Increase circuit breaker limits".to_string(),
                    "Check for memory leaks".to_string(),
                ],
            },
        );
        entries.insert(
            "red_indices".to_string(),
            Recommendation {
                message: "Red indices detected".to_string(),
                recommendations: vec![
                    "Investigate shard allocation issues".to_string(),
                    "Check node health and disk space".to_string(),
                    "Check for failed shard recovery".to_string(),
                ],
            },
        );

        Self { entries }
    }

    /// Remediation steps for `check_id`; empty when unknown.
    pub fn lookup(&self, check_id: &str) -> Vec<String> {
        self.entries
            .get(check_id)
            .map(|r| r.recommendations.clone())
            .unwrap_or_default()
    }
}
