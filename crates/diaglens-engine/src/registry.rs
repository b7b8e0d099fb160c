use diaglens_types::{CheckCategory, ClusterSnapshot, Issue, ThresholdConfig};

/// Snapshot data a check needs before it can run.
///
/// Applicability is phase one of evaluation: a requirement that is not
/// satisfied skips the check, which is recorded separately from both a
/// pass and an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequirement {
    ClusterHealth,
    Nodes,
    Indices,
    MappingStats,
    ThreadPoolStats,
    Logs,
    GcEvents,
}

impl DataRequirement {
    pub fn satisfied_by(&self, snapshot: &ClusterSnapshot) -> bool {
        match self {
            DataRequirement::ClusterHealth => snapshot.health.is_some(),
            DataRequirement::Nodes => !snapshot.nodes.is_empty(),
            DataRequirement::Indices => !snapshot.indices.is_empty(),
            DataRequirement::MappingStats => snapshot.has_mapping_stats(),
            DataRequirement::ThreadPoolStats => {
                snapshot.nodes.iter().any(|n| !n.thread_pools.is_empty())
            }
            DataRequirement::Logs => !snapshot.logs.is_empty(),
            DataRequirement::GcEvents => snapshot.gc.is_some(),
        }
    }

    /// Short description of the data that was missing.
    pub fn describe(&self) -> &'static str {
        match self {
            DataRequirement::ClusterHealth => "no cluster health summary",
            DataRequirement::Nodes => "no node records",
            DataRequirement::Indices => "no index records",
            DataRequirement::MappingStats => "no index mapping stats",
            DataRequirement::ThreadPoolStats => "no thread pool stats",
            DataRequirement::Logs => "no log files collected",
            DataRequirement::GcEvents => "no GC log collected",
        }
    }
}

/// Evaluation payload: a pure function of the snapshot and thresholds.
pub type EvalFn = fn(&ClusterSnapshot, &ThresholdConfig) -> Vec<Issue>;

/// Declarative check record. Behavior varies only by the function
/// payload; there is no check hierarchy.
pub struct CheckDefinition {
    pub id: &'static str,
    pub category: CheckCategory,
    pub requires: DataRequirement,
    pub eval: EvalFn,
}

/// Ordered registry of all known checks, grouped by category.
///
/// Declaration order within a category is the evaluation order; it only
/// pins output ordering, since checks never interact.
pub struct CheckRegistry {
    checks: Vec<CheckDefinition>,
}

impl CheckRegistry {
    /// Registry with every built-in check, in fixed category order.
    pub fn builtin() -> Self {
        let mut checks = Vec::new();
        checks.extend(crate::checks::cluster::definitions());
        checks.extend(crate::checks::node::definitions());
        checks.extend(crate::checks::index::definitions());
        checks.extend(crate::checks::configuration::definitions());
        checks.extend(crate::checks::performance::definitions());
        Self { checks }
    }

    pub fn checks(&self) -> &[CheckDefinition] {
        &self.checks
    }

    pub fn in_category(
        &self,
        category: CheckCategory,
    ) -> impl Iterator<Item = &CheckDefinition> {
        self.checks.iter().filter(move |c| c.category == category)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.checks.iter().any(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
