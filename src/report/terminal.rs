use colored::Colorize;

use crate::audit::{AuditReport, DeletionSafety, RunStatus};
use crate::report::Reporter;
use crate::rules::{Finding, Severity, SEVERITY_ORDER};

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn severity_label(&self, severity: Severity) -> colored::ColoredString {
        let label = format!("[{severity}]");
        match severity {
            Severity::Critical => label.red().bold(),
            Severity::High => label.yellow().bold(),
            Severity::Medium => label.cyan(),
            Severity::Low => label.white(),
        }
    }

    fn safety_label(&self, safety: DeletionSafety) -> colored::ColoredString {
        match safety {
            DeletionSafety::Safe => safety.as_str().green(),
            DeletionSafety::Risky => safety.as_str().yellow().bold(),
            DeletionSafety::Dangerous => safety.as_str().red().bold(),
        }
    }

    fn score_bar(&self, score: f64) -> String {
        let filled = ((score / 100.0) * 10.0).round() as usize;
        let filled = filled.min(10);
        format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
    }

    fn format_finding(&self, finding: &Finding) -> String {
        let mut out = format!(
            "{} {} {} ({}): {}\n",
            self.severity_label(finding.severity),
            finding.rule_id.bold(),
            finding.resource_name,
            finding.resource_id.dimmed(),
            finding.description
        );
        if self.verbose {
            out.push_str(&format!("    {} {}\n", "→".dimmed(), finding.recommendation));
            if !finding.remediation.is_empty() {
                out.push_str(&format!("    {} {}\n", "$".dimmed(), finding.remediation.dimmed()));
            }
        }
        out
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &AuditReport) -> String {
        let mut out = String::new();

        if report.status == RunStatus::EmptyInventory {
            out.push_str(&format!(
                "{}\n",
                "No inventory supplied: nothing to analyze.".yellow().bold()
            ));
            return out;
        }

        out.push_str(&format!("{}\n\n", "Security Group Audit".bold()));

        // Findings, most severe first.
        for severity in SEVERITY_ORDER.iter().rev() {
            let matching: Vec<&Finding> = report
                .findings
                .iter()
                .filter(|f| f.severity == *severity)
                .collect();
            for finding in matching {
                out.push_str(&self.format_finding(finding));
            }
        }

        if !report.analyses.is_empty() {
            out.push_str(&format!("\n{}\n", "Group usage".bold()));
            for analysis in &report.analyses {
                out.push_str(&format!(
                    "  {} {:>5.1} {} {} ({} attachments)\n",
                    self.score_bar(analysis.usage_score),
                    analysis.usage_score,
                    self.safety_label(analysis.deletion_safety),
                    analysis.group_id,
                    analysis.attachments
                ));
            }
        }

        if !report.candidates.is_empty() {
            out.push_str(&format!("\n{}\n", "Consolidation candidates".bold()));
            for candidate in &report.candidates {
                let ids: Vec<&str> = candidate
                    .similar
                    .iter()
                    .map(|g| g.group_id.as_str())
                    .collect();
                out.push_str(&format!(
                    "  {} absorbs {} ({} attachments{})\n",
                    candidate.primary.group_id,
                    ids.join(", "),
                    candidate.total_attachments,
                    if candidate.safe_to_consolidate {
                        ", safe"
                    } else {
                        ", review first"
                    }
                ));
            }
        }

        if !report.failures.is_empty() {
            out.push_str(&format!("\n{}\n", "Auditor failures".yellow().bold()));
            for failure in &report.failures {
                out.push_str(&format!("  {}: {}\n", failure.auditor, failure.error));
            }
        }

        let summary = &report.summary;
        out.push_str(&format!(
            "\n{} {} critical, {} high, {} medium, {} low\n",
            if summary.passed {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            },
            summary.critical,
            summary.high,
            summary.medium,
            summary.low
        ));

        out
    }
}
