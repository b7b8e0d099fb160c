// Engine module - rule-based health evaluation
// Sits between the normalized snapshot (types/sources) and report rendering

pub mod checks;
pub mod evaluate;
pub mod registry;
pub mod score;

pub use evaluate::{EvaluationEngine, EvaluationReport, EvaluationSummary};
pub use registry::{CheckDefinition, CheckRegistry, DataRequirement, EvalFn};
pub use score::ScoreAggregator;

use diaglens_types::{ClusterSnapshot, RecommendationLibrary, ThresholdConfig};

// Façade API - stable entry point for the CLI layer

/// Evaluate `snapshot` with the built-in check registry.
pub fn evaluate(
    snapshot: &ClusterSnapshot,
    thresholds: &ThresholdConfig,
    recommendations: &RecommendationLibrary,
) -> EvaluationReport {
    let registry = CheckRegistry::builtin();
    EvaluationEngine::new(&registry).run(snapshot, thresholds, recommendations)
}
