use crate::checks::resolve_low;
use crate::registry::{CheckDefinition, DataRequirement};
use diaglens_types::{
    CheckCategory, ClusterSnapshot, HealthStatus, Issue, Severity, ShardState, Subject,
    ThresholdConfig, ThresholdSection,
};

const CATEGORY: CheckCategory = CheckCategory::Cluster;

pub(crate) fn definitions() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "cluster_status_red",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: cluster_status_red,
        },
        CheckDefinition {
            id: "cluster_status_yellow",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: cluster_status_yellow,
        },
        CheckDefinition {
            id: "active_shards_percent",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: active_shards_percent,
        },
        CheckDefinition {
            id: "unassigned_shards",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: unassigned_shards,
        },
        CheckDefinition {
            id: "relocating_shards",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: relocating_shards,
        },
        CheckDefinition {
            id: "pending_tasks",
            category: CATEGORY,
            requires: DataRequirement::ClusterHealth,
            eval: pending_tasks,
        },
    ]
}

fn cluster_status_red(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    if health.status != HealthStatus::Red {
        return Vec::new();
    }
    vec![Issue::new(
        "cluster_status_red",
        CATEGORY,
        Severity::Critical,
        Subject::Cluster,
        "Cluster status is RED: one or more primary shards are unavailable",
    )]
}

fn cluster_status_yellow(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    if health.status != HealthStatus::Yellow {
        return Vec::new();
    }
    vec![Issue::new(
        "cluster_status_yellow",
        CATEGORY,
        Severity::Warning,
        Subject::Cluster,
        "Cluster status is YELLOW: replica shards are not fully allocated",
    )]
}

fn active_shards_percent(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    let bounds = thresholds.bounds(ThresholdSection::Cluster, "active_shards_percent");
    let Some((severity, bound)) = resolve_low(health.active_shards_percent, bounds) else {
        return Vec::new();
    };
    vec![
        Issue::new(
            "active_shards_percent",
            CATEGORY,
            severity,
            Subject::Cluster,
            format!(
                "Active shards at {:.1}% (below {:.1}%)",
                health.active_shards_percent, bound
            ),
        )
        .with_measurement(health.active_shards_percent, bound),
    ]
}

/// Any nonzero unassigned count is critical, regardless of configured
/// numeric thresholds. Overlaps with `active_shards_percent` by design;
/// both fire independently.
fn unassigned_shards(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    if health.unassigned_shards == 0 {
        return Vec::new();
    }

    let mut summary = format!("Found {} unassigned shard(s)", health.unassigned_shards);
    let detail: Vec<String> = snapshot
        .shards
        .iter()
        .filter(|s| s.state == ShardState::Unassigned)
        .take(3)
        .map(|s| {
            format!(
                "{}[{}]: {}",
                s.index,
                s.shard,
                s.unassigned_reason.as_deref().unwrap_or("unknown")
            )
        })
        .collect();
    if !detail.is_empty() {
        summary.push_str(&format!(" ({})", detail.join(", ")));
    }

    vec![
        Issue::new(
            "unassigned_shards",
            CATEGORY,
            Severity::Critical,
            Subject::Cluster,
            summary,
        )
        .with_measurement(health.unassigned_shards as f64, 0.0),
    ]
}

/// Any relocation is worth a warning; sustained mass relocation escalates
/// at the configured critical bound.
fn relocating_shards(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    if health.relocating_shards == 0 {
        return Vec::new();
    }
    let bounds = thresholds.bounds(ThresholdSection::Cluster, "relocating_shards");
    let count = health.relocating_shards as f64;
    let (severity, bound) = match bounds.critical {
        Some(critical) if count >= critical => (Severity::Critical, critical),
        _ => (Severity::Warning, 0.0),
    };
    vec![
        Issue::new(
            "relocating_shards",
            CATEGORY,
            severity,
            Subject::Cluster,
            format!("Found {} relocating shard(s)", health.relocating_shards),
        )
        .with_measurement(count, bound),
    ]
}

fn pending_tasks(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let Some(health) = &snapshot.health else {
        return Vec::new();
    };
    let bounds = thresholds.bounds(ThresholdSection::Cluster, "pending_tasks");
    let count = health.pending_tasks as f64;
    if count == 0.0 {
        return Vec::new();
    }
    let Some((severity, bound)) = crate::checks::resolve_high(count, bounds) else {
        return Vec::new();
    };
    vec![
        Issue::new(
            "pending_tasks",
            CATEGORY,
            severity,
            Subject::Cluster,
            format!(
                "Pending task queue at {} (bound {})",
                health.pending_tasks, bound
            ),
        )
        .with_measurement(count, bound),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use diaglens_types::ClusterHealth;

    fn snapshot_with_health(health: ClusterHealth) -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot::empty("test");
        snapshot.health = Some(health);
        snapshot
    }

    fn green_health() -> ClusterHealth {
        ClusterHealth {
            status: HealthStatus::Green,
            number_of_nodes: 3,
            active_primary_shards: 10,
            active_shards: 20,
            relocating_shards: 0,
            initializing_shards: 0,
            unassigned_shards: 0,
            active_shards_percent: 100.0,
            pending_tasks: 0,
            documents_count: 1000,
            store_size: None,
        }
    }

    #[test]
    fn test_green_cluster_is_clean() {
        let snapshot = snapshot_with_health(green_health());
        let thresholds = ThresholdConfig::default();
        for def in definitions() {
            assert!(
                (def.eval)(&snapshot, &thresholds).is_empty(),
                "{} fired on a green cluster",
                def.id
            );
        }
    }

    #[test]
    fn test_red_status_is_critical() {
        let mut health = green_health();
        health.status = HealthStatus::Red;
        let snapshot = snapshot_with_health(health);
        let issues = cluster_status_red(&snapshot, &ThresholdConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].check_id, "cluster_status_red");
    }

    #[test]
    fn test_single_unassigned_shard_is_critical_regardless_of_config() {
        let mut health = green_health();
        health.unassigned_shards = 1;
        let snapshot = snapshot_with_health(health);

        // Even a config that tries to relax the metric cannot demote it
        let mut thresholds = ThresholdConfig::default();
        thresholds.cluster.insert(
            "unassigned_shards".to_string(),
            diaglens_types::Bounds::warn_crit(10.0, 100.0),
        );

        let issues = unassigned_shards(&snapshot, &thresholds);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].value, Some(1.0));
    }

    #[test]
    fn test_relocating_escalates_at_critical_bound() {
        let mut health = green_health();
        health.relocating_shards = 3;
        let snapshot = snapshot_with_health(health);
        let thresholds = ThresholdConfig::default();
        assert_eq!(
            relocating_shards(&snapshot, &thresholds)[0].severity,
            Severity::Warning
        );

        let mut health = green_health();
        health.relocating_shards = 50;
        let snapshot = snapshot_with_health(health);
        assert_eq!(
            relocating_shards(&snapshot, &thresholds)[0].severity,
            Severity::Critical
        );
    }

    #[test]
    fn test_active_shards_below_warning() {
        let mut health = green_health();
        health.active_shards_percent = 85.0;
        let snapshot = snapshot_with_health(health);
        let issues = active_shards_percent(&snapshot, &ThresholdConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].threshold, Some(90.0));
    }
}
