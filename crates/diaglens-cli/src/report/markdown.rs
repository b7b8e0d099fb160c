use crate::analyze::Analysis;
use chrono::{DateTime, Utc};
use diaglens_types::{HealthStatus, Severity};

/// Render the health report as Markdown.
///
/// "No issue found" and "check skipped due to missing data" are separate
/// sections: silence must never read as a clean bill of health.
pub fn render(analysis: &Analysis, generated_at: DateTime<Utc>) -> String {
    let snapshot = &analysis.snapshot;
    let report = &analysis.report;
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Cluster Health Report".to_string());
    lines.push(String::new());
    lines.push(format!("**Cluster**: {}", snapshot.cluster_name));
    lines.push(format!(
        "**Generated**: {}",
        generated_at.format("%Y-%m-%dT%H:%M:%SZ")
    ));
    if let Some(collected) = snapshot.collected_at {
        lines.push(format!(
            "**Collected**: {}",
            collected.format("%Y-%m-%dT%H:%M:%SZ")
        ));
    }
    lines.push(String::new());

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    let status = snapshot
        .health
        .as_ref()
        .map(|h| h.status)
        .unwrap_or(HealthStatus::Unknown);
    lines.push(format!("- **Cluster Status**: {}", status));
    lines.push(format!(
        "- **Critical Issues**: {}",
        report.summary.critical_count
    ));
    lines.push(format!("- **Warnings**: {}", report.summary.warning_count));
    lines.push(format!(
        "- **Checks Run / Skipped**: {} / {}",
        report.summary.checks_run, report.summary.checks_skipped
    ));
    lines.push(format!("- **Overall Score**: {}/100", report.summary.score));
    lines.push(String::new());

    for (title, severity) in [
        ("## Critical Issues", Severity::Critical),
        ("## Warnings", Severity::Warning),
    ] {
        let issues: Vec<_> = report.issues_with_severity(severity).collect();
        if issues.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        lines.push(String::new());
        for (i, issue) in issues.iter().enumerate() {
            lines.push(format!("### {}. {} ({})", i + 1, issue.check_id, issue.subject));
            lines.push(format!("- **Finding**: {}", issue.summary));
            if let (Some(value), Some(threshold)) = (issue.value, issue.threshold) {
                lines.push(format!(
                    "- **Measured**: {} (bound {})",
                    trim_float(value),
                    trim_float(threshold)
                ));
            }
            for recommendation in &issue.recommendations {
                lines.push(format!("- **Recommendation**: {}", recommendation));
            }
            lines.push(String::new());
        }
    }

    if !report.skipped.is_empty() {
        lines.push("## Skipped Checks".to_string());
        lines.push(String::new());
        lines.push("These checks did not run; absence of findings here is not a pass.".to_string());
        lines.push(String::new());
        for skip in &report.skipped {
            lines.push(format!(
                "- `{}` ({}): {}",
                skip.check_id, skip.category, skip.reason
            ));
        }
        lines.push(String::new());
    }

    if let Some(health) = &snapshot.health {
        lines.push("## Cluster Health".to_string());
        lines.push(String::new());
        lines.push(format!("- **Nodes**: {}", health.number_of_nodes));
        lines.push(format!("- **Active Shards**: {}", health.active_shards));
        lines.push(format!(
            "- **Unassigned Shards**: {}",
            health.unassigned_shards
        ));
        lines.push(format!("- **Pending Tasks**: {}", health.pending_tasks));
        lines.push(String::new());
    }

    if !snapshot.nodes.is_empty() {
        lines.push("## Nodes".to_string());
        lines.push(String::new());
        lines.push("| Node | Heap % | CPU % | Disk % | Rejections | Partial |".to_string());
        lines.push("|------|--------|-------|--------|------------|---------|".to_string());
        for node in &snapshot.nodes {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                node.name,
                opt_float(node.heap_used_percent),
                opt_float(node.cpu_percent),
                opt_float(node.disk_used_percent),
                node.total_rejections(),
                if node.partial { "yes" } else { "" },
            ));
        }
        lines.push(String::new());
    }

    if !snapshot.indices.is_empty() {
        let count = |status: HealthStatus| {
            snapshot
                .indices
                .iter()
                .filter(|i| i.health == status)
                .count()
        };
        lines.push("## Indices".to_string());
        lines.push(String::new());
        lines.push(format!("- **Green**: {}", count(HealthStatus::Green)));
        lines.push(format!("- **Yellow**: {}", count(HealthStatus::Yellow)));
        lines.push(format!("- **Red**: {}", count(HealthStatus::Red)));
        lines.push(String::new());
    }

    if !snapshot.warnings.is_empty() {
        lines.push("## Source Warnings".to_string());
        lines.push(String::new());
        for warning in &snapshot.warnings {
            lines.push(format!("- {}", warning));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn trim_float(value: f64) -> String {
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn opt_float(value: Option<f64>) -> String {
    value.map(trim_float).unwrap_or_else(|| "n/a".to_string())
}
