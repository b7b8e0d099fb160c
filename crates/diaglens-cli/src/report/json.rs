use crate::analyze::Analysis;
use chrono::{DateTime, Utc};
use diaglens_engine::EvaluationSummary;
use diaglens_types::{ClusterSnapshot, Issue, SkippedCheck};
use serde::Serialize;

/// Serialized report shape, stable for downstream consumers.
#[derive(Serialize)]
struct JsonReport<'a> {
    cluster_name: &'a str,
    generated_at: String,
    summary: &'a EvaluationSummary,
    issues: &'a [Issue],
    skipped: &'a [SkippedCheck],
    snapshot: &'a ClusterSnapshot,
}

/// Render the health report as pretty-printed JSON.
pub fn render(analysis: &Analysis, generated_at: DateTime<Utc>) -> serde_json::Result<String> {
    let report = JsonReport {
        cluster_name: &analysis.snapshot.cluster_name,
        generated_at: generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        summary: &analysis.report.summary,
        issues: &analysis.report.issues,
        skipped: &analysis.report.skipped,
        snapshot: &analysis.snapshot,
    };
    serde_json::to_string_pretty(&report)
}
