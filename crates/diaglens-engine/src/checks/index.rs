use crate::checks::resolve_high;
use crate::registry::{CheckDefinition, DataRequirement};
use diaglens_types::{
    CheckCategory, ClusterSnapshot, HealthStatus, Issue, Severity, Subject, ThresholdConfig,
    ThresholdSection, parse_size_to_gb,
};

const CATEGORY: CheckCategory = CheckCategory::Index;

pub(crate) fn definitions() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "red_indices",
            category: CATEGORY,
            requires: DataRequirement::Indices,
            eval: red_indices,
        },
        CheckDefinition {
            id: "yellow_indices",
            category: CATEGORY,
            requires: DataRequirement::Indices,
            eval: yellow_indices,
        },
        CheckDefinition {
            id: "large_index",
            category: CATEGORY,
            requires: DataRequirement::Indices,
            eval: large_index,
        },
        CheckDefinition {
            id: "many_small_indices",
            category: CATEGORY,
            requires: DataRequirement::Indices,
            eval: many_small_indices,
        },
        CheckDefinition {
            id: "too_many_fields",
            category: CATEGORY,
            requires: DataRequirement::MappingStats,
            eval: too_many_fields,
        },
        CheckDefinition {
            id: "deep_nesting",
            category: CATEGORY,
            requires: DataRequirement::MappingStats,
            eval: deep_nesting,
        },
        CheckDefinition {
            id: "replication_delay",
            category: CATEGORY,
            requires: DataRequirement::Indices,
            eval: replication_delay,
        },
    ]
}

/// Any red index is critical; one issue per index.
fn red_indices(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    snapshot
        .indices
        .iter()
        .filter(|i| i.health == HealthStatus::Red)
        .map(|i| {
            Issue::new(
                "red_indices",
                CATEGORY,
                Severity::Critical,
                Subject::index(&i.name),
                format!("Index {} is RED: primary shard data is unavailable", i.name),
            )
        })
        .collect()
}

fn yellow_indices(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    snapshot
        .indices
        .iter()
        .filter(|i| i.health == HealthStatus::Yellow)
        .map(|i| {
            Issue::new(
                "yellow_indices",
                CATEGORY,
                Severity::Warning,
                Subject::index(&i.name),
                format!("Index {} is YELLOW: replicas are not fully allocated", i.name),
            )
        })
        .collect()
}

fn large_index(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let bounds = thresholds.bounds(ThresholdSection::Index, "large_index_gb");
    let mut issues = Vec::new();
    for index in &snapshot.indices {
        let Some(size_gb) = index.store_size.as_deref().and_then(parse_size_to_gb) else {
            continue;
        };
        let Some((severity, bound)) = resolve_high(size_gb, bounds) else {
            continue;
        };
        issues.push(
            Issue::new(
                "large_index",
                CATEGORY,
                severity,
                Subject::index(&index.name),
                format!(
                    "Index {} stores {:.1}GB (bound {:.0}GB); consider rollover or ILM",
                    index.name, size_gb, bound
                ),
            )
            .with_measurement(size_gb, bound),
        );
    }
    issues
}

/// Cluster-wide oversharding signal: a large population of tiny indices.
fn many_small_indices(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let count_bound = thresholds
        .bounds(ThresholdSection::Index, "many_small_indices_count")
        .warning
        .unwrap_or(1000.0);
    let avg_bound = thresholds
        .bounds(ThresholdSection::Index, "many_small_indices_avg_gb")
        .warning
        .unwrap_or(1.0);

    let sized: Vec<f64> = snapshot
        .indices
        .iter()
        .filter_map(|i| i.store_size.as_deref().and_then(parse_size_to_gb))
        .collect();
    if (sized.len() as f64) < count_bound || sized.is_empty() {
        return Vec::new();
    }
    let avg_gb = sized.iter().sum::<f64>() / sized.len() as f64;
    if avg_gb >= avg_bound {
        return Vec::new();
    }

    vec![
        Issue::new(
            "many_small_indices",
            CATEGORY,
            Severity::Warning,
            Subject::Cluster,
            format!(
                "{} indices with average size {:.2}GB; consolidate or use rollover",
                sized.len(),
                avg_gb
            ),
        )
        .with_measurement(avg_gb, avg_bound),
    ]
}

fn too_many_fields(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let bounds = thresholds.bounds(ThresholdSection::Index, "field_count");
    let mut issues = Vec::new();
    for index in &snapshot.indices {
        let Some(fields) = index.field_count else { continue };
        let Some((severity, bound)) = resolve_high(fields as f64, bounds) else {
            continue;
        };
        issues.push(
            Issue::new(
                "too_many_fields",
                CATEGORY,
                severity,
                Subject::index(&index.name),
                format!(
                    "Index {} maps {} fields (bound {:.0}); review mapping strategy",
                    index.name, fields, bound
                ),
            )
            .with_measurement(fields as f64, bound),
        );
    }
    issues
}

fn deep_nesting(snapshot: &ClusterSnapshot, thresholds: &ThresholdConfig) -> Vec<Issue> {
    let bounds = thresholds.bounds(ThresholdSection::Index, "nesting_depth");
    let mut issues = Vec::new();
    for index in &snapshot.indices {
        let Some(depth) = index.mapping_depth else { continue };
        let Some((severity, bound)) = resolve_high(depth as f64, bounds) else {
            continue;
        };
        issues.push(
            Issue::new(
                "deep_nesting",
                CATEGORY,
                severity,
                Subject::index(&index.name),
                format!(
                    "Index {} nests mappings {} levels deep (bound {:.0})",
                    index.name, depth, bound
                ),
            )
            .with_measurement(depth as f64, bound),
        );
    }
    issues
}

fn replication_delay(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for index in &snapshot.indices {
        let (Some(pri), Some(rep)) = (index.primary_shards, index.replica_shards) else {
            continue;
        };
        if pri <= rep {
            continue;
        }
        issues.push(
            Issue::new(
                "replication_delay",
                CATEGORY,
                Severity::Warning,
                Subject::index(&index.name),
                format!(
                    "Index {} has {} primaries but only {} replica(s)",
                    index.name, pri, rep
                ),
            )
            .with_measurement((pri - rep) as f64, 0.0),
        );
    }
    issues
}
