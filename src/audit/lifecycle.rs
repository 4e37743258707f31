//! Usage scoring and deletion-safety classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{AuditContext, Auditor};
use crate::error::Result;
use crate::inventory::model::SecurityGroup;
use crate::rules::catalog;
use crate::rules::Finding;
use crate::usage::{ResourceKind, UsageMap, UsageSummary};

/// Usage-score weights. The four components cap at 40/30/20/10 and the
/// total clamps to [0, 100].
const ATTACHMENT_WEIGHT: f64 = 10.0;
const ATTACHMENT_MAX: f64 = 40.0;
const KIND_WEIGHT: f64 = 10.0;
const KIND_MAX: f64 = 30.0;
const RECENT_ACTIVITY_BONUS: f64 = 20.0;
const RULE_WEIGHT: f64 = 2.0;
const RULE_MAX: f64 = 10.0;
/// A freshly created group carries two rules; only more than that
/// counts as complexity.
const RULE_BASELINE: usize = 2;

/// Window for the recent-activity bonus.
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

const PRODUCTION_KEYWORDS: &[&str] = &["prod", "production", "critical"];

/// Estimated blast radius of deleting a security group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeletionSafety {
    Safe,
    Risky,
    Dangerous,
}

impl DeletionSafety {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionSafety::Safe => "SAFE",
            DeletionSafety::Risky => "RISKY",
            DeletionSafety::Dangerous => "DANGEROUS",
        }
    }
}

impl std::fmt::Display for DeletionSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-group analysis consumed by reporters and the cleanup-script
/// generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAnalysis {
    pub group_id: String,
    pub group_name: String,
    pub vpc_id: Option<String>,
    pub rules_count: usize,
    pub attachments: usize,
    pub resource_kinds: Vec<String>,
    pub usage_score: f64,
    pub deletion_safety: DeletionSafety,
    pub recommendations: Vec<String>,
}

/// Weighted utilization score in [0, 100], evaluated against `now`.
pub fn compute_usage_score_at(
    group: &SecurityGroup,
    usage: &UsageSummary,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = 0.0;

    let attachments = usage.total_attachments();
    if attachments > 0 {
        score += (attachments as f64 * ATTACHMENT_WEIGHT).min(ATTACHMENT_MAX);
    }

    score += (usage.distinct_kinds() as f64 * KIND_WEIGHT).min(KIND_MAX);

    if has_recent_activity(usage, now) {
        score += RECENT_ACTIVITY_BONUS;
    }

    let rules = group.rules_count();
    if rules > RULE_BASELINE {
        score += (rules as f64 * RULE_WEIGHT).min(RULE_MAX);
    }

    score.clamp(0.0, 100.0)
}

/// Weighted utilization score in [0, 100].
pub fn compute_usage_score(group: &SecurityGroup, usage: &UsageSummary) -> f64 {
    compute_usage_score_at(group, usage, Utc::now())
}

fn has_recent_activity(usage: &UsageSummary, now: DateTime<Utc>) -> bool {
    let cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);
    usage.creation_times.iter().any(|created| *created > cutoff)
}

/// Deletion-safety verdict. Pure and deterministic; DANGEROUS
/// conditions are checked strictly before RISKY ones.
pub fn classify_deletion_safety(group: &SecurityGroup, usage: &UsageSummary) -> DeletionSafety {
    if group.group_name == "default" {
        return DeletionSafety::Dangerous;
    }
    if usage.has_kind(ResourceKind::LoadBalancer) {
        return DeletionSafety::Dangerous;
    }
    if usage.has_kind(ResourceKind::Database) {
        return DeletionSafety::Dangerous;
    }
    if usage.any_running_instance() {
        return DeletionSafety::Dangerous;
    }

    if usage.total_attachments() > 0 {
        return DeletionSafety::Risky;
    }
    let name = group.group_name.to_lowercase();
    if PRODUCTION_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return DeletionSafety::Risky;
    }

    DeletionSafety::Safe
}

/// Analyze every group in the snapshot.
pub fn analyze_groups(groups: &[SecurityGroup], usage_map: &UsageMap) -> Vec<GroupAnalysis> {
    let now = Utc::now();
    groups
        .iter()
        .map(|group| analyze_group(group, usage_map.for_group(&group.group_id), now))
        .collect()
}

fn analyze_group(
    group: &SecurityGroup,
    usage: &UsageSummary,
    now: DateTime<Utc>,
) -> GroupAnalysis {
    let usage_score = compute_usage_score_at(group, usage, now);
    let deletion_safety = classify_deletion_safety(group, usage);

    let mut resource_kinds: Vec<String> =
        usage.kinds.iter().map(|k| k.as_str().to_string()).collect();
    resource_kinds.sort_unstable();

    let mut recommendations = Vec::new();
    let name = group.name_or_id();
    match deletion_safety {
        DeletionSafety::Safe if usage_score < 10.0 => {
            recommendations.push(format!("SAFE TO DELETE: '{name}' is unused"));
            recommendations.push("Back up the group definition before deletion".to_string());
        }
        DeletionSafety::Risky if usage_score < 30.0 => {
            recommendations.push(format!("REVIEW FOR DELETION: '{name}' has low usage"));
            recommendations.push("Check whether the attached resources are still needed".to_string());
        }
        DeletionSafety::Dangerous => {
            recommendations.push(format!("DO NOT DELETE: '{name}' guards critical resources"));
        }
        _ => {}
    }
    if group.rules_count() > 10 {
        recommendations
            .push("Consider splitting the complex rule set into multiple groups".to_string());
    }
    if usage_score > 80.0 {
        recommendations.push("Well-utilized security group, keep as is".to_string());
    }

    GroupAnalysis {
        group_id: group.group_id.clone(),
        group_name: group.group_name.clone(),
        vpc_id: group.vpc_id.clone(),
        rules_count: group.rules_count(),
        attachments: usage.total_attachments(),
        resource_kinds,
        usage_score,
        deletion_safety,
        recommendations,
    }
}

/// Emits findings for groups no resource references.
#[derive(Debug, Clone, Default)]
pub struct UsageAuditor;

impl UsageAuditor {
    pub fn new() -> Self {
        Self
    }
}

impl Auditor for UsageAuditor {
    fn name(&self) -> &'static str {
        "usage"
    }

    fn audit(&self, ctx: &AuditContext) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for group in &ctx.inventory.security_groups {
            let usage = ctx.usage.for_group(&group.group_id);
            if usage.total_attachments() > 0 || group.group_name == "default" {
                continue;
            }
            findings.push(
                Finding::for_group(
                    &catalog::UNUSED_GROUP,
                    &group.group_id,
                    group.name_or_id(),
                    format!(
                        "Security group '{}' is not associated with any resource",
                        group.name_or_id()
                    ),
                )
                .with_remediation(format!(
                    "aws ec2 delete-security-group --group-id {}",
                    group.group_id
                ))
                .with_meta("vpc_id", json!(group.vpc_id))
                .with_meta("rule_count", json!(group.rules_count())),
            );
        }
        Ok(findings)
    }
}
