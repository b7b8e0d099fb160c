use diaglens_engine::{EvaluationReport, evaluate};
use diaglens_sources::{ArchiveError, ExtractLimits, snapshot_from_path};
use diaglens_types::{ClusterSnapshot, RecommendationLibrary, ThresholdConfig};
use std::path::Path;
use tracing::{debug, info};

/// One bundle's complete analysis: the snapshot for detail sections plus
/// the evaluation output.
pub struct Analysis {
    pub snapshot: ClusterSnapshot,
    pub report: EvaluationReport,
}

/// Full pipeline for a single bundle: extract → normalize → evaluate.
pub fn analyze_bundle(
    archive: &Path,
    thresholds: &ThresholdConfig,
    recommendations: &RecommendationLibrary,
) -> Result<Analysis, ArchiveError> {
    info!(bundle = %archive.display(), "analyzing diagnostic bundle");

    let snapshot = snapshot_from_path(archive, ExtractLimits::default())?;
    debug!(
        nodes = snapshot.nodes.len(),
        indices = snapshot.indices.len(),
        shards = snapshot.shards.len(),
        warnings = snapshot.warnings.len(),
        "snapshot built"
    );

    let report = evaluate(&snapshot, thresholds, recommendations);
    info!(
        score = report.summary.score,
        critical = report.summary.critical_count,
        warning = report.summary.warning_count,
        skipped = report.summary.checks_skipped,
        "evaluation complete"
    );

    Ok(Analysis { snapshot, report })
}
