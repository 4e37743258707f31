//! Cleanup-script generation.
//!
//! A pure function of the audit report: one delete command per group
//! classified SAFE, consolidation candidates as review comments. The
//! engine never executes the script.

use crate::audit::{AuditReport, DeletionSafety};

pub fn generate_cleanup_script(report: &AuditReport) -> String {
    let safe: Vec<_> = report
        .analyses
        .iter()
        .filter(|a| a.deletion_safety == DeletionSafety::Safe)
        .collect();

    let mut lines = vec![
        "#!/bin/bash".to_string(),
        "# Security group cleanup script".to_string(),
        format!(
            "# Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!("# {} security groups safe to delete", safe.len()),
        String::new(),
        "set -e".to_string(),
        String::new(),
        "echo 'Backing up security group definitions...'".to_string(),
        "aws ec2 describe-security-groups > sg_backup_$(date +%Y%m%d_%H%M%S).json".to_string(),
        String::new(),
    ];

    for analysis in &safe {
        lines.push(format!(
            "# Delete '{}' (usage score: {:.1})",
            analysis.group_name, analysis.usage_score
        ));
        lines.push(format!("echo 'Deleting {}...'", analysis.group_id));
        lines.push(format!(
            "aws ec2 delete-security-group --group-id {}",
            analysis.group_id
        ));
        lines.push(String::new());
    }

    for candidate in &report.candidates {
        let ids: Vec<&str> = candidate
            .similar
            .iter()
            .map(|g| g.group_id.as_str())
            .collect();
        lines.push("# Consolidation opportunity (manual review required)".to_string());
        lines.push(format!("#   keep:  {}", candidate.primary.group_id));
        lines.push(format!("#   merge: {}", ids.join(", ")));
        lines.push(String::new());
    }

    lines.push(format!(
        "echo 'Cleanup complete: {} security groups removed'",
        safe.len()
    ));
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::consolidation::{ConsolidationCandidate, GroupLabel};
    use crate::audit::GroupAnalysis;
    use crate::test_utils::fixtures::report_with_findings;

    fn analysis(id: &str, safety: DeletionSafety) -> GroupAnalysis {
        GroupAnalysis {
            group_id: id.to_string(),
            group_name: id.to_string(),
            vpc_id: Some("vpc-1".to_string()),
            rules_count: 0,
            attachments: 0,
            resource_kinds: Vec::new(),
            usage_score: 0.0,
            deletion_safety: safety,
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn test_one_delete_line_per_safe_group() {
        let mut report = report_with_findings(vec![]);
        report.analyses = vec![
            analysis("sg-1", DeletionSafety::Safe),
            analysis("sg-2", DeletionSafety::Risky),
            analysis("sg-3", DeletionSafety::Dangerous),
            analysis("sg-4", DeletionSafety::Safe),
        ];
        let script = generate_cleanup_script(&report);
        let deletes: Vec<&str> = script
            .lines()
            .filter(|l| l.starts_with("aws ec2 delete-security-group"))
            .collect();
        assert_eq!(deletes.len(), 2);
        assert!(deletes[0].contains("sg-1"));
        assert!(deletes[1].contains("sg-4"));
        assert!(!script.contains("delete-security-group --group-id sg-2"));
        assert!(!script.contains("delete-security-group --group-id sg-3"));
    }

    #[test]
    fn test_script_has_backup_before_deletes() {
        let mut report = report_with_findings(vec![]);
        report.analyses = vec![analysis("sg-1", DeletionSafety::Safe)];
        let script = generate_cleanup_script(&report);
        let backup = script.find("describe-security-groups").unwrap();
        let delete = script.find("delete-security-group").unwrap();
        assert!(backup < delete);
        assert!(script.starts_with("#!/bin/bash"));
    }

    #[test]
    fn test_candidates_rendered_as_comments_only() {
        let mut report = report_with_findings(vec![]);
        report.candidates = vec![ConsolidationCandidate {
            primary: GroupLabel {
                group_id: "sg-1".to_string(),
                group_name: "web".to_string(),
            },
            similar: vec![GroupLabel {
                group_id: "sg-2".to_string(),
                group_name: "web-copy".to_string(),
            }],
            total_attachments: 3,
            safe_to_consolidate: true,
        }];
        let script = generate_cleanup_script(&report);
        assert!(script.contains("#   merge: sg-2"));
        assert!(!script.contains("aws ec2 delete-security-group"));
    }
}
