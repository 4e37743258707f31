//! Similarity detection for consolidation candidates.
//!
//! Groups in the same network whose rule-signature sets overlap by at
//! least the similarity threshold are clustered into one candidate.
//! The overlap denominator is deliberately the smaller set: a small
//! group fully covered by a larger one should be flagged.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::inventory::model::SecurityGroup;
use crate::usage::UsageMap;

pub const SIMILARITY_THRESHOLD: f64 = 0.8;
/// Clusters with fewer combined attachments than this are considered
/// safe to consolidate.
pub const SAFE_ATTACHMENT_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupLabel {
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationCandidate {
    pub primary: GroupLabel,
    pub similar: Vec<GroupLabel>,
    pub total_attachments: usize,
    pub safe_to_consolidate: bool,
}

impl ConsolidationCandidate {
    /// Number of groups in the cluster, primary included.
    pub fn cluster_size(&self) -> usize {
        self.similar.len() + 1
    }
}

fn label(group: &SecurityGroup) -> GroupLabel {
    GroupLabel {
        group_id: group.group_id.clone(),
        group_name: group.group_name.clone(),
    }
}

fn rule_signatures(group: &SecurityGroup) -> FxHashSet<String> {
    group.all_rules().map(|rule| rule.signature()).collect()
}

/// Two groups are similar when they share a network and their
/// signature overlap ratio reaches the threshold.
fn are_similar(
    a: &SecurityGroup,
    a_signatures: &FxHashSet<String>,
    b: &SecurityGroup,
    b_signatures: &FxHashSet<String>,
    threshold: f64,
) -> bool {
    if a.vpc_id != b.vpc_id {
        return false;
    }
    if a_signatures.is_empty() || b_signatures.is_empty() {
        return false;
    }
    let overlap = a_signatures.intersection(b_signatures).count();
    let smaller = a_signatures.len().min(b_signatures.len());
    overlap as f64 / smaller as f64 >= threshold
}

/// Cluster similar groups with the default threshold and attachment
/// limit.
pub fn find_consolidation_candidates(
    groups: &[SecurityGroup],
    usage: &UsageMap,
) -> Vec<ConsolidationCandidate> {
    find_with_limits(groups, usage, SIMILARITY_THRESHOLD, SAFE_ATTACHMENT_LIMIT)
}

/// Single pass over all groups; each group lands in at most one
/// cluster via the processed set.
pub fn find_with_limits(
    groups: &[SecurityGroup],
    usage: &UsageMap,
    threshold: f64,
    attachment_limit: usize,
) -> Vec<ConsolidationCandidate> {
    let signatures: Vec<FxHashSet<String>> = groups.iter().map(rule_signatures).collect();
    let mut processed: FxHashSet<usize> = FxHashSet::default();
    let mut candidates = Vec::new();

    for i in 0..groups.len() {
        if processed.contains(&i) {
            continue;
        }
        processed.insert(i);

        let mut cluster = vec![i];
        for j in (i + 1)..groups.len() {
            if processed.contains(&j) {
                continue;
            }
            if are_similar(&groups[i], &signatures[i], &groups[j], &signatures[j], threshold) {
                cluster.push(j);
                processed.insert(j);
            }
        }

        if cluster.len() < 2 {
            continue;
        }

        let total_attachments: usize = cluster
            .iter()
            .map(|&idx| usage.for_group(&groups[idx].group_id).total_attachments())
            .sum();

        candidates.push(ConsolidationCandidate {
            primary: label(&groups[cluster[0]]),
            similar: cluster[1..].iter().map(|&idx| label(&groups[idx])).collect(),
            total_attachments,
            safe_to_consolidate: total_attachments < attachment_limit,
        });
    }

    candidates
}
