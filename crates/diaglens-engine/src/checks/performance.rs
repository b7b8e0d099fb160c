use crate::registry::{CheckDefinition, DataRequirement};
use diaglens_types::{
    CheckCategory, ClusterSnapshot, Issue, Severity, Subject, ThresholdConfig,
};

const CATEGORY: CheckCategory = CheckCategory::Performance;

// Fixed operational bounds for the performance family. These are not part
// of the three configurable threshold sections.
const SLOW_QUERY_MS: f64 = 5_000.0;
const REJECTION_RATE_PERCENT: f64 = 1.0;
const QUEUE_DEPTH_LIMIT: u64 = 1_000;

pub(crate) fn definitions() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "slow_queries",
            category: CATEGORY,
            requires: DataRequirement::Logs,
            eval: slow_queries,
        },
        CheckDefinition {
            id: "high_rejection_rate",
            category: CATEGORY,
            requires: DataRequirement::ThreadPoolStats,
            eval: high_rejection_rate,
        },
        CheckDefinition {
            id: "thread_pool_contention",
            category: CATEGORY,
            requires: DataRequirement::ThreadPoolStats,
            eval: thread_pool_contention,
        },
        CheckDefinition {
            id: "search_latency",
            category: CATEGORY,
            requires: DataRequirement::ThreadPoolStats,
            eval: search_latency,
        },
        CheckDefinition {
            id: "indexing_latency",
            category: CATEGORY,
            requires: DataRequirement::ThreadPoolStats,
            eval: indexing_latency,
        },
    ]
}

fn slow_queries(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let slow: Vec<f64> = snapshot
        .log_entries()
        .filter_map(|entry| entry.duration_ms)
        .filter(|ms| *ms > SLOW_QUERY_MS)
        .collect();
    if slow.is_empty() {
        return Vec::new();
    }
    let worst = slow.iter().cloned().fold(0.0, f64::max);
    vec![
        Issue::new(
            "slow_queries",
            CATEGORY,
            Severity::Warning,
            Subject::Cluster,
            format!(
                "Found {} slow quer{} over {:.0}s in logs (worst {:.1}s)",
                slow.len(),
                if slow.len() == 1 { "y" } else { "ies" },
                SLOW_QUERY_MS / 1000.0,
                worst / 1000.0
            ),
        )
        .with_measurement(worst / 1000.0, SLOW_QUERY_MS / 1000.0),
    ]
}

/// Share of nodes reporting any rejection; a cluster-wide saturation
/// signal on top of the per-node rejection check.
fn high_rejection_rate(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    if snapshot.nodes.is_empty() {
        return Vec::new();
    }
    let affected: Vec<&str> = snapshot
        .nodes
        .iter()
        .filter(|n| n.total_rejections() > 0)
        .map(|n| n.name.as_str())
        .collect();
    let rate = affected.len() as f64 / snapshot.nodes.len() as f64 * 100.0;
    if rate <= REJECTION_RATE_PERCENT {
        return Vec::new();
    }
    vec![
        Issue::new(
            "high_rejection_rate",
            CATEGORY,
            Severity::Critical,
            Subject::Cluster,
            format!(
                "{:.1}% of nodes report thread pool rejections ({})",
                rate,
                affected.join(", ")
            ),
        )
        .with_measurement(rate, REJECTION_RATE_PERCENT),
    ]
}

fn queue_issues(
    check_id: &'static str,
    label: &str,
    snapshot: &ClusterSnapshot,
    pool_filter: impl Fn(&str) -> bool,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    for node in &snapshot.nodes {
        let deepest = node
            .thread_pools
            .iter()
            .filter(|(pool, _)| pool_filter(pool))
            .map(|(_, stats)| stats.queue)
            .max()
            .unwrap_or(0);
        if deepest <= QUEUE_DEPTH_LIMIT {
            continue;
        }
        issues.push(
            Issue::new(
                check_id,
                CATEGORY,
                Severity::Warning,
                Subject::node(&node.id),
                format!(
                    "{} on node {}: queue depth {} (limit {})",
                    label, node.name, deepest, QUEUE_DEPTH_LIMIT
                ),
            )
            .with_measurement(deepest as f64, QUEUE_DEPTH_LIMIT as f64),
        );
    }
    issues
}

fn thread_pool_contention(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    queue_issues(
        "thread_pool_contention",
        "Thread pool contention",
        snapshot,
        |_| true,
    )
}

fn search_latency(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    queue_issues("search_latency", "Search backlog", snapshot, |pool| {
        pool.starts_with("search")
    })
}

fn indexing_latency(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    queue_issues("indexing_latency", "Indexing backlog", snapshot, |pool| {
        pool.starts_with("write") || pool.starts_with("index")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diaglens_types::{LogLevel, LogLine, NodeRecord, ThreadPoolStats};

    fn node_with_pool(id: &str, pool: &str, queue: u64, rejected: u64) -> NodeRecord {
        let mut node = NodeRecord::new(id, id);
        node.thread_pools
            .insert(pool.to_string(), ThreadPoolStats { queue, rejected });
        node
    }

    #[test]
    fn test_slow_queries_from_log_durations() {
        let mut snapshot = ClusterSnapshot::empty("test");
        snapshot.logs.insert(
            "server".to_string(),
            vec![
                LogLine {
                    timestamp: None,
                    level: LogLevel::Warn,
                    message: "slow search took[6.2s]".to_string(),
                    duration_ms: Some(6_200.0),
                },
                LogLine {
                    timestamp: None,
                    level: LogLevel::Warn,
                    message: "fine search took[200ms]".to_string(),
                    duration_ms: Some(200.0),
                },
            ],
        );

        let issues = slow_queries(&snapshot, &ThresholdConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].value, Some(6.2));
    }

    #[test]
    fn test_rejection_rate_over_one_percent() {
        let mut snapshot = ClusterSnapshot::empty("test");
        snapshot.nodes.push(node_with_pool("n1", "write", 0, 9));
        snapshot.nodes.push(node_with_pool("n2", "write", 0, 0));

        let issues = high_rejection_rate(&snapshot, &ThresholdConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].value, Some(50.0));
    }

    #[test]
    fn test_queue_depth_checks_scope_by_pool() {
        let mut snapshot = ClusterSnapshot::empty("test");
        snapshot
            .nodes
            .push(node_with_pool("n1", "search", 4_000, 0));
        snapshot.nodes.push(node_with_pool("n2", "write", 2_000, 0));

        let search = search_latency(&snapshot, &ThresholdConfig::default());
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].subject, Subject::node("n1"));

        let indexing = indexing_latency(&snapshot, &ThresholdConfig::default());
        assert_eq!(indexing.len(), 1);
        assert_eq!(indexing[0].subject, Subject::node("n2"));

        let contention = thread_pool_contention(&snapshot, &ThresholdConfig::default());
        assert_eq!(contention.len(), 2);
    }
}
