use crate::checks::resolve_high;
use crate::registry::{CheckDefinition, DataRequirement};
use diaglens_types::{
    Bounds, CheckCategory, ClusterSnapshot, Issue, NodeRecord, Severity, Subject,
    ThresholdConfig, ThresholdSection,
};

const CATEGORY: CheckCategory = CheckCategory::Node;

pub(crate) fn definitions() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "high_heap_usage",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: high_heap_usage,
        },
        CheckDefinition {
            id: "high_cpu_usage",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: high_cpu_usage,
        },
        CheckDefinition {
            id: "high_disk_usage",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: high_disk_usage,
        },
        CheckDefinition {
            id: "high_load_average",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: high_load_average,
        },
        CheckDefinition {
            id: "thread_pool_rejections",
            category: CATEGORY,
            requires: DataRequirement::ThreadPoolStats,
            eval: thread_pool_rejections,
        },
        CheckDefinition {
            id: "circuit_breakers",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: circuit_breakers,
        },
        CheckDefinition {
            id: "gc_duration",
            category: CATEGORY,
            requires: DataRequirement::GcEvents,
            eval: gc_duration,
        },
        CheckDefinition {
            id: "long_gc_pause",
            category: CATEGORY,
            requires: DataRequirement::GcEvents,
            eval: long_gc_pause,
        },
    ]
}

/// One issue per breaching node; breaches are never aggregated across
/// nodes.
fn per_node_gauge(
    check_id: &'static str,
    label: &str,
    snapshot: &ClusterSnapshot,
    bounds: Bounds,
    metric: impl Fn(&NodeRecord) -> Option<f64>,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    for node in &snapshot.nodes {
        let Some(value) = metric(node) else { continue };
        let Some((severity, bound)) = resolve_high(value, bounds) else {
            continue;
        };
        issues.push(
            Issue::new(
                check_id,
                CATEGORY,
                severity,
                Subject::node(&node.id),
                format!("{} at {:.1} on node {} (bound {:.1})", label, value, node.name, bound),
            )
            .with_measurement(value, bound),
        );
    }
    issues
}

fn high_heap_usage(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    per_node_gauge(
        "high_heap_usage",
        "Heap usage %",
        snapshot,
        thresholds.bounds(ThresholdSection::Node, "heap_used_percent"),
        |n| n.heap_used_percent,
    )
}

fn high_cpu_usage(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    per_node_gauge(
        "high_cpu_usage",
        "CPU usage %",
        snapshot,
        thresholds.bounds(ThresholdSection::Node, "cpu_percent"),
        |n| n.cpu_percent,
    )
}

fn high_disk_usage(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    per_node_gauge(
        "high_disk_usage",
        "Disk usage %",
        snapshot,
        thresholds.bounds(ThresholdSection::Node, "disk_used_percent"),
        |n| n.disk_used_percent,
    )
}

fn high_load_average(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    per_node_gauge(
        "high_load_average",
        "1m load average",
        snapshot,
        thresholds.bounds(ThresholdSection::Node, "load_1m"),
        |n| n.load_1m,
    )
}

/// Any rejection anywhere is critical: requests were already dropped.
fn thread_pool_rejections(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for node in &snapshot.nodes {
        let rejected: Vec<(&str, u64)> = node
            .thread_pools
            .iter()
            .filter(|(_, stats)| stats.rejected > 0)
            .map(|(pool, stats)| (pool.as_str(), stats.rejected))
            .collect();
        if rejected.is_empty() {
            continue;
        }
        let total: u64 = rejected.iter().map(|(_, n)| n).sum();
        let pools: Vec<String> = rejected
            .iter()
            .map(|(pool, n)| format!("{}={}", pool, n))
            .collect();
        issues.push(
            Issue::new(
                "thread_pool_rejections",
                CATEGORY,
                Severity::Critical,
                Subject::node(&node.id),
                format!(
                    "Thread pool rejections on node {}: {}",
                    node.name,
                    pools.join(", ")
                ),
            )
            .with_measurement(total as f64, 0.0),
        );
    }
    issues
}

fn circuit_breakers(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for node in &snapshot.nodes {
        if node.breakers.is_empty() {
            continue;
        }
        let total: u64 = node.breakers.values().map(|b| b.tripped).sum();
        let names: Vec<&str> = node.breakers.keys().map(String::as_str).collect();
        issues.push(
            Issue::new(
                "circuit_breakers",
                CATEGORY,
                Severity::Critical,
                Subject::node(&node.id),
                format!(
                    "Circuit breaker(s) tripped on node {}: {}",
                    node.name,
                    names.join(", ")
                ),
            )
            .with_measurement(total as f64, 0.0),
        );
    }
    issues
}

/// Rolled up per severity bucket rather than per pause: one critical
/// issue when any pause crosses the critical bound, else one warning.
fn gc_duration(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(gc) = &snapshot.gc else {
        return Vec::new();
    };
    let bounds = thresholds.bounds(ThresholdSection::Node, "gc_duration_s");
    let warning_s = bounds.warning.unwrap_or(10.0);
    let critical_s = bounds.critical.unwrap_or(30.0);

    let over_warning: Vec<f64> = gc
        .pauses
        .iter()
        .map(|p| p.duration_ms / 1000.0)
        .filter(|s| *s >= warning_s)
        .collect();
    if over_warning.is_empty() {
        return Vec::new();
    }
    let longest = over_warning.iter().cloned().fold(0.0, f64::max);
    let critical_count = over_warning.iter().filter(|s| **s >= critical_s).count();

    let (severity, bound, count) = if critical_count > 0 {
        (Severity::Critical, critical_s, critical_count)
    } else {
        (Severity::Warning, warning_s, over_warning.len())
    };
    vec![
        Issue::new(
            "gc_duration",
            CATEGORY,
            severity,
            Subject::Cluster,
            format!(
                "Found {} GC pause(s) over {:.0}s (longest {:.1}s)",
                count, bound, longest
            ),
        )
        .with_measurement(longest, bound),
    ]
}

fn long_gc_pause(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(gc) = &snapshot.gc else {
        return Vec::new();
    };
    let bounds = thresholds.bounds(ThresholdSection::Node, "long_gc_pause_s");
    let critical_s = bounds.critical.unwrap_or(30.0);

    let over: Vec<f64> = gc
        .pauses
        .iter()
        .map(|p| p.duration_ms / 1000.0)
        .filter(|s| *s >= critical_s)
        .collect();
    if over.is_empty() {
        return Vec::new();
    }
    let longest = over.iter().cloned().fold(0.0, f64::max);
    vec![
        Issue::new(
            "long_gc_pause",
            CATEGORY,
            Severity::Critical,
            Subject::Cluster,
            format!(
                "Found {} GC pause(s) over {:.0}s; investigate memory pressure immediately",
                over.len(),
                critical_s
            ),
        )
        .with_measurement(longest, critical_s),
    ]
}
