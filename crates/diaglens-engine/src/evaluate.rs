use crate::registry::CheckRegistry;
use crate::score::ScoreAggregator;
use diaglens_types::{
    CheckCategory, ClusterSnapshot, Issue, RecommendationLibrary, Severity, SkippedCheck,
    ThresholdConfig,
};
use serde::Serialize;
use tracing::debug;

/// Issue counts plus the composite score.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub score: u8,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub checks_run: usize,
    pub checks_skipped: usize,
}

/// Engine output contract, consumed by report renderers.
///
/// Issues are ordered by category, then declaration order within the
/// category, then per-subject emission order; running the engine twice on
/// the same inputs yields identical ordering.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub issues: Vec<Issue>,
    pub skipped: Vec<SkippedCheck>,
    pub summary: EvaluationSummary,
}

impl EvaluationReport {
    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}

/// Runs the registry against a completed snapshot.
///
/// Two phases per check: applicability (does the snapshot carry the data
/// this check needs?) then evaluation. An inapplicable check contributes
/// no issue and no error; it is recorded as skipped so the report can
/// distinguish silence from a clean pass.
pub struct EvaluationEngine<'a> {
    registry: &'a CheckRegistry,
}

impl<'a> EvaluationEngine<'a> {
    pub fn new(registry: &'a CheckRegistry) -> Self {
        Self { registry }
    }

    pub fn run(
        &self,
        snapshot: &ClusterSnapshot,
        thresholds: &ThresholdConfig,
        recommendations: &RecommendationLibrary,
    ) -> EvaluationReport {
        let mut issues: Vec<Issue> = Vec::new();
        let mut skipped: Vec<SkippedCheck> = Vec::new();
        let mut checks_run = 0usize;

        for category in CheckCategory::ALL {
            for check in self.registry.in_category(category) {
                if !check.requires.satisfied_by(snapshot) {
                    debug!(check = check.id, "skipped: missing data");
                    skipped.push(SkippedCheck {
                        check_id: check.id.to_string(),
                        category,
                        reason: format!("missing data: {}", check.requires.describe()),
                    });
                    continue;
                }

                checks_run += 1;
                let mut produced = (check.eval)(snapshot, thresholds);
                for issue in &mut produced {
                    debug_assert!(
                        self.registry.contains(&issue.check_id),
                        "issue references unregistered check {}",
                        issue.check_id
                    );
                    issue.recommendations = recommendations.lookup(&issue.check_id);
                }
                issues.extend(produced);
            }
        }

        let score = ScoreAggregator::score(&issues);
        let summary = EvaluationSummary {
            score,
            critical_count: issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .count(),
            warning_count: issues
                .iter()
                .filter(|i| i.severity == Severity::Warning)
                .count(),
            info_count: issues
                .iter()
                .filter(|i| i.severity == Severity::Info)
                .count(),
            checks_run,
            checks_skipped: skipped.len(),
        };

        EvaluationReport {
            issues,
            skipped,
            summary,
        }
    }
}
