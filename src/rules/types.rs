use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rules::catalog::RuleDef;

/// Finding severity. Escalation logic must compare severities through
/// [`Severity::rank`], never through a derived ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Explicit ordinal ranking, least to most severe.
pub const SEVERITY_ORDER: [Severity; 4] = [
    Severity::Low,
    Severity::Medium,
    Severity::High,
    Severity::Critical,
];

impl Severity {
    /// Position in [`SEVERITY_ORDER`].
    pub fn rank(self) -> usize {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }

    /// Return the more severe of `self` and `candidate` by ordinal rank.
    /// Never de-escalates.
    pub fn escalate(self, candidate: Severity) -> Severity {
        if candidate.rank() > self.rank() {
            candidate
        } else {
            self
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// One discrete audit result. Immutable once constructed; collected into
/// ordered lists and never mutated by later pipeline steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub resource_id: String,
    pub resource_type: String,
    pub resource_name: String,
    pub rule_id: String,
    pub rule_name: String,
    pub description: String,
    pub severity: Severity,
    pub recommendation: String,
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Finding {
    /// Build a finding for a security group from a catalog rule definition.
    pub fn for_group(rule: &RuleDef, group_id: &str, group_name: &str, description: String) -> Self {
        Self {
            resource_id: group_id.to_string(),
            resource_type: "SecurityGroup".to_string(),
            resource_name: group_name.to_string(),
            rule_id: rule.id.to_string(),
            rule_name: rule.name.to_string(),
            description,
            severity: rule.severity,
            recommendation: rule.recommendation.to_string(),
            remediation: String::new(),
            compliance_frameworks: rule.compliance.iter().map(|s| s.to_string()).collect(),
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Severity counts across one findings collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub passed: bool,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let (critical, high, medium, low) =
            findings
                .iter()
                .fold((0, 0, 0, 0), |(c, h, m, l), f| match f.severity {
                    Severity::Critical => (c + 1, h, m, l),
                    Severity::High => (c, h + 1, m, l),
                    Severity::Medium => (c, h, m + 1, l),
                    Severity::Low => (c, h, m, l + 1),
                });

        Self {
            critical,
            high,
            medium,
            low,
            passed: critical == 0 && high == 0,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}
