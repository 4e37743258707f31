//! sg-audit: usage and risk analysis for cloud security-group
//! inventories.
//!
//! The engine builds a cross-resource usage map from an inventory
//! snapshot, inspects every group's rules against exposure policies,
//! scores utilization, classifies deletion safety, and clusters
//! similar groups into consolidation candidates. All analysis is pure
//! computation over the snapshot; collection and report persistence
//! live outside this crate.

pub mod audit;
pub mod cidr;
pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod report;
pub mod rules;
pub mod timeutil;
pub mod usage;

#[cfg(test)]
pub mod test_utils;

pub use audit::{
    analyze_groups, classify_deletion_safety, compute_usage_score, find_consolidation_candidates,
    AuditContext, AuditEngine, AuditReport, Auditor, AuditorFailure, ConsolidationCandidate,
    DeletionSafety, ExposureAuditor, GroupAnalysis, RunStatus, UsageAuditor,
};
pub use cli::{Cli, OutputFormat};
pub use config::AuditConfig;
pub use error::{AuditError, Result};
pub use inventory::{Inventory, Section};
pub use report::{JsonReporter, MarkdownReporter, Reporter, TerminalReporter};
pub use rules::{Finding, Severity, Summary};
pub use usage::{AttachmentRecord, ResourceKind, UsageMap, UsageSummary};
