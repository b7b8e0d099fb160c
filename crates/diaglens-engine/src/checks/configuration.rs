use crate::registry::{CheckDefinition, DataRequirement};
use diaglens_types::{
    CheckCategory, ClusterSnapshot, Issue, Severity, Subject, ThresholdConfig,
};

const CATEGORY: CheckCategory = CheckCategory::Configuration;

pub(crate) fn definitions() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            id: "master_eligible_nodes",
            category: CATEGORY,
            requires: DataRequirement::Nodes,
            eval: master_eligible_nodes,
        },
        CheckDefinition {
            id: "swap_enabled",
            category: CATEGORY,
            requires: DataRequirement::Logs,
            eval: swap_enabled,
        },
        CheckDefinition {
            id: "file_descriptors",
            category: CATEGORY,
            requires: DataRequirement::Logs,
            eval: file_descriptors,
        },
    ]
}

/// An even or single-node master quorum invites split brain; 3 or 5 is
/// the recommended layout.
fn master_eligible_nodes(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let masters: Vec<&str> = snapshot
        .nodes
        .iter()
        .filter(|n| n.roles.contains("master"))
        .map(|n| n.name.as_str())
        .collect();
    if masters.len() == 3 || masters.len() == 5 {
        return Vec::new();
    }
    vec![
        Issue::new(
            "master_eligible_nodes",
            CATEGORY,
            Severity::Warning,
            Subject::Cluster,
            format!(
                "Found {} master-eligible node(s) (recommended: 3 or 5)",
                masters.len()
            ),
        )
        .with_measurement(masters.len() as f64, 3.0),
    ]
}

fn swap_enabled(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    if snapshot.facts.get("swap.enabled").map(String::as_str) != Some("true") {
        return Vec::new();
    }
    vec![Issue::new(
        "swap_enabled",
        CATEGORY,
        Severity::Warning,
        Subject::Cluster,
        "Swap appears to be enabled on one or more nodes; disable it with `swapoff -a`",
    )]
}

fn file_descriptors(snapshot: &ClusterSnapshot, _thresholds: &ThresholdConfig) -> Vec<Issue> {
    let warnings = snapshot
        .facts
        .get("fd.limit_warnings")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    if warnings == 0 {
        return Vec::new();
    }
    vec![
        Issue::new(
            "file_descriptors",
            CATEGORY,
            Severity::Warning,
            Subject::Cluster,
            format!(
                "File descriptor limit issues in logs ({} warning(s)); raise the ulimit to at least 65535",
                warnings
            ),
        )
        .with_measurement(warnings as f64, 0.0),
    ]
}
