use crate::audit::{AuditReport, RunStatus};
use crate::report::Reporter;
use crate::rules::SEVERITY_ORDER;

pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for MarkdownReporter {
    fn report(&self, report: &AuditReport) -> String {
        let mut out = String::new();
        out.push_str("# Security Group Audit Report\n\n");
        out.push_str(&format!(
            "**Generated**: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if report.status == RunStatus::EmptyInventory {
            out.push_str("\nNo inventory supplied: nothing to analyze.\n");
            return out;
        }

        out.push_str(&format!("**Total findings**: {}\n\n", report.findings.len()));

        out.push_str("## Summary\n\n");
        out.push_str("| Severity | Count |\n|----------|-------|\n");
        out.push_str(&format!("| Critical | {} |\n", report.summary.critical));
        out.push_str(&format!("| High | {} |\n", report.summary.high));
        out.push_str(&format!("| Medium | {} |\n", report.summary.medium));
        out.push_str(&format!("| Low | {} |\n", report.summary.low));

        for severity in SEVERITY_ORDER.iter().rev() {
            let matching: Vec<_> = report
                .findings
                .iter()
                .filter(|f| f.severity == *severity)
                .collect();
            if matching.is_empty() {
                continue;
            }
            out.push_str(&format!("\n## {severity} Findings\n\n"));
            for finding in matching {
                out.push_str(&format!("### {} — {}\n", finding.rule_id, finding.rule_name));
                out.push_str(&format!(
                    "**Resource**: {} (`{}`)\n",
                    finding.resource_name, finding.resource_id
                ));
                out.push_str(&format!("**Description**: {}\n", finding.description));
                out.push_str(&format!("**Recommendation**: {}\n", finding.recommendation));
                if !finding.remediation.is_empty() {
                    out.push_str(&format!("**Remediation**: `{}`\n", finding.remediation));
                }
                if !finding.compliance_frameworks.is_empty() {
                    out.push_str(&format!(
                        "**Compliance**: {}\n",
                        finding.compliance_frameworks.join(", ")
                    ));
                }
                out.push('\n');
            }
        }

        if !report.analyses.is_empty() {
            out.push_str("\n## Group Usage\n\n");
            out.push_str("| Group | Score | Deletion safety | Attachments |\n");
            out.push_str("|-------|-------|-----------------|-------------|\n");
            for analysis in &report.analyses {
                out.push_str(&format!(
                    "| {} | {:.1} | {} | {} |\n",
                    analysis.group_id,
                    analysis.usage_score,
                    analysis.deletion_safety,
                    analysis.attachments
                ));
            }
        }

        if !report.candidates.is_empty() {
            out.push_str("\n## Consolidation Candidates\n\n");
            for candidate in &report.candidates {
                let ids: Vec<&str> = candidate
                    .similar
                    .iter()
                    .map(|g| g.group_id.as_str())
                    .collect();
                out.push_str(&format!(
                    "- `{}` could absorb {} ({} combined attachments{})\n",
                    candidate.primary.group_id,
                    ids.iter()
                        .map(|id| format!("`{id}`"))
                        .collect::<Vec<_>>()
                        .join(", "),
                    candidate.total_attachments,
                    if candidate.safe_to_consolidate {
                        ", safe to consolidate"
                    } else {
                        ", review before consolidating"
                    }
                ));
            }
        }

        if !report.failures.is_empty() {
            out.push_str("\n## Auditor Failures\n\n");
            for failure in &report.failures {
                out.push_str(&format!("- **{}**: {}\n", failure.auditor, failure.error));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{empty_report, report_with_findings, ssh_open_finding};

    #[test]
    fn test_markdown_structure() {
        let output = MarkdownReporter::new().report(&report_with_findings(vec![ssh_open_finding()]));
        assert!(output.starts_with("# Security Group Audit Report"));
        assert!(output.contains("| Critical | 1 |"));
        assert!(output.contains("## CRITICAL Findings"));
        assert!(output.contains("SG_ADV_001"));
    }

    #[test]
    fn test_markdown_empty_inventory() {
        let output = MarkdownReporter::new().report(&empty_report());
        assert!(output.contains("nothing to analyze"));
        assert!(!output.contains("## Summary"));
    }

    #[test]
    fn test_markdown_omits_empty_severity_sections() {
        let output = MarkdownReporter::new().report(&report_with_findings(vec![ssh_open_finding()]));
        assert!(!output.contains("## LOW Findings"));
    }
}
