use serde::{Deserialize, Serialize};

/// Severity of a finding. Ordered so that `Critical > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Fixed score weight subtracted per issue of this severity.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 15,
            Severity::Warning => 5,
            Severity::Info => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// Check category. Evaluation order follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Cluster,
    Node,
    Index,
    Configuration,
    Performance,
}

impl CheckCategory {
    pub const ALL: [CheckCategory; 5] = [
        CheckCategory::Cluster,
        CheckCategory::Node,
        CheckCategory::Index,
        CheckCategory::Configuration,
        CheckCategory::Performance,
    ];
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckCategory::Cluster => "cluster",
            CheckCategory::Node => "node",
            CheckCategory::Index => "index",
            CheckCategory::Configuration => "configuration",
            CheckCategory::Performance => "performance",
        };
        write!(f, "{}", s)
    }
}

/// What a finding is about. `Cluster` covers cluster-wide findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Cluster,
    Node { id: String },
    Index { name: String },
    Shard { index: String, shard: u64 },
}

impl Subject {
    pub fn node(id: impl Into<String>) -> Self {
        Subject::Node { id: id.into() }
    }

    pub fn index(name: impl Into<String>) -> Self {
        Subject::Index { name: name.into() }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Cluster => write!(f, "cluster"),
            Subject::Node { id } => write!(f, "node {}", id),
            Subject::Index { name } => write!(f, "index {}", name),
            Subject::Shard { index, shard } => write!(f, "shard {}[{}]", index, shard),
        }
    }
}

/// Output of one breached check for one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub check_id: String,
    pub category: CheckCategory,
    pub severity: Severity,
    pub subject: Subject,
    /// Measured value that breached, when the check is numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Configured bound the value was tested against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub summary: String,
    /// Remediation steps resolved from the recommendation library; empty
    /// when the library has no entry for this check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl Issue {
    pub fn new(
        check_id: &str,
        category: CheckCategory,
        severity: Severity,
        subject: Subject,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            check_id: check_id.to_string(),
            category,
            severity,
            subject,
            value: None,
            threshold: None,
            summary: summary.into(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_measurement(mut self, value: f64, threshold: f64) -> Self {
        self.value = Some(value);
        self.threshold = Some(threshold);
        self
    }
}

/// A check that could not run because the snapshot lacks the data it needs.
/// Distinct from both a passing check and an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCheck {
    pub check_id: String,
    pub category: CheckCategory,
    pub reason: String,
}
