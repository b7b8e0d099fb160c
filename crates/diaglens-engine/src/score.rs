use diaglens_types::Issue;

/// Deterministic, order-independent reduction of an issue list to a
/// composite health score.
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Start at 100 and subtract each issue's severity weight.
    ///
    /// The running total may go negative internally; it is clamped to
    /// [0, 100] exactly once at the end, so cumulative severity is never
    /// masked by per-step clamping. Repeated breaches of the same check
    /// on different subjects each count: sensitivity to systemic,
    /// cluster-wide problems is the point.
    pub fn score(issues: &[Issue]) -> u8 {
        let mut running: i64 = 100;
        for issue in issues {
            running -= issue.severity.weight() as i64;
        }
        running.clamp(0, 100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diaglens_types::{CheckCategory, Issue, Severity, Subject};

    fn issue(severity: Severity) -> Issue {
        Issue::new(
            "test_check",
            CheckCategory::Cluster,
            severity,
            Subject::Cluster,
            "test",
        )
    }

    #[test]
    fn test_empty_issue_list_scores_100() {
        assert_eq!(ScoreAggregator::score(&[]), 100);
    }

    #[test]
    fn test_weights_subtract() {
        let issues = vec![
            issue(Severity::Critical),
            issue(Severity::Warning),
            issue(Severity::Info),
        ];
        assert_eq!(ScoreAggregator::score(&issues), 100 - 15 - 5 - 1);
    }

    #[test]
    fn test_clamped_once_at_end() {
        // 8 criticals drive the running total to -20; the result is 0,
        // not a per-step-clamped remainder.
        let issues: Vec<Issue> = (0..8).map(|_| issue(Severity::Critical)).collect();
        assert_eq!(ScoreAggregator::score(&issues), 0);
    }

    #[test]
    fn test_one_more_critical_drops_exactly_15_until_clamp() {
        let mut issues: Vec<Issue> = (0..3).map(|_| issue(Severity::Critical)).collect();
        let before = ScoreAggregator::score(&issues);
        issues.push(issue(Severity::Critical));
        let after = ScoreAggregator::score(&issues);
        assert_eq!(before - after, 15);
        assert!(after <= before);
    }
}
