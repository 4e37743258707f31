//! Audit orchestration.
//!
//! The engine holds an explicit registry of auditors sharing one
//! read-only [`AuditContext`]. Each auditor runs on its own thread;
//! an error, panic, or blown deadline contributes zero findings and a
//! failure entry, never aborting the run. Results are merged in
//! registration order, so two runs over the same snapshot produce the
//! same report.

pub mod consolidation;
pub mod exposure;
pub mod lifecycle;

pub use consolidation::{find_consolidation_candidates, ConsolidationCandidate, GroupLabel};
pub use exposure::ExposureAuditor;
pub use lifecycle::{
    analyze_groups, classify_deletion_safety, compute_usage_score, DeletionSafety, GroupAnalysis,
    UsageAuditor,
};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuditConfig;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::rules::{Finding, Summary};
use crate::usage::UsageMap;

/// Read-only data shared by all auditors in one run.
#[derive(Debug)]
pub struct AuditContext {
    pub inventory: Inventory,
    pub usage: UsageMap,
}

impl AuditContext {
    pub fn new(inventory: Inventory) -> Self {
        let usage = UsageMap::build(&inventory);
        Self { inventory, usage }
    }
}

/// One independent audit capability. Implementations must be pure with
/// respect to the context: no state carried between runs.
pub trait Auditor: Send + Sync {
    fn name(&self) -> &'static str;
    fn audit(&self, ctx: &AuditContext) -> Result<Vec<Finding>>;
}

/// Whether a run had anything to look at. Callers must be able to tell
/// "nothing wrong" apart from "nothing to analyze".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Analyzed,
    EmptyInventory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorFailure {
    pub auditor: String,
    pub error: String,
}

/// Complete output of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub status: RunStatus,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub findings: Vec<Finding>,
    pub analyses: Vec<GroupAnalysis>,
    pub candidates: Vec<ConsolidationCandidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AuditorFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_sections: Vec<String>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.summary.passed
    }

    fn empty(status: RunStatus, missing_sections: Vec<String>) -> Self {
        Self {
            status,
            generated_at: Utc::now(),
            summary: Summary::from_findings(&[]),
            findings: Vec::new(),
            analyses: Vec::new(),
            candidates: Vec::new(),
            failures: Vec::new(),
            missing_sections,
        }
    }
}

pub struct AuditEngine {
    auditors: Vec<Arc<dyn Auditor>>,
    config: AuditConfig,
}

impl AuditEngine {
    /// Engine with the default auditor registry, honoring
    /// `disabled_auditors` from the config.
    pub fn new(config: AuditConfig) -> Self {
        let mut engine = Self {
            auditors: Vec::new(),
            config: config.clone(),
        };
        let exposure = ExposureAuditor::new()
            .with_internal_downgrade(config.downgrade_internal_exposure);
        if config.is_auditor_enabled("exposure") {
            engine.register(Arc::new(exposure));
        }
        if config.is_auditor_enabled("usage") {
            engine.register(Arc::new(UsageAuditor::new()));
        }
        engine
    }

    pub fn with_defaults() -> Self {
        Self::new(AuditConfig::default())
    }

    /// Engine with an empty registry; callers register auditors
    /// themselves.
    pub fn bare(config: AuditConfig) -> Self {
        Self {
            auditors: Vec::new(),
            config,
        }
    }

    pub fn register(&mut self, auditor: Arc<dyn Auditor>) {
        self.auditors.push(auditor);
    }

    pub fn auditor_names(&self) -> Vec<&'static str> {
        self.auditors.iter().map(|a| a.name()).collect()
    }

    /// Run every registered auditor against one inventory snapshot.
    pub fn run(&self, inventory: Inventory) -> AuditReport {
        let missing_sections: Vec<String> = inventory
            .missing_sections
            .iter()
            .map(|s| s.key().to_string())
            .collect();

        if inventory.is_empty() {
            warn!("no inventory supplied, nothing to analyze");
            return AuditReport::empty(RunStatus::EmptyInventory, missing_sections);
        }

        info!(
            groups = inventory.security_groups.len(),
            auditors = self.auditors.len(),
            "starting audit run"
        );
        let ctx = Arc::new(AuditContext::new(inventory));

        // Fan out: one thread per auditor, all started before any
        // collection so a slow auditor never delays its peers' work.
        let mut pending = Vec::with_capacity(self.auditors.len());
        for auditor in &self.auditors {
            let name = auditor.name();
            let (tx, rx) = mpsc::channel();
            let auditor = Arc::clone(auditor);
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| auditor.audit(&ctx)));
                let _ = tx.send(outcome);
            });
            pending.push((name, rx));
        }

        let mut findings = Vec::new();
        let mut failures = Vec::new();
        for (name, rx) in pending {
            let received = match self.config.auditor_timeout() {
                Some(limit) => rx.recv_timeout(limit).map_err(|err| match err {
                    RecvTimeoutError::Timeout => {
                        format!("timed out after {}s", limit.as_secs())
                    }
                    RecvTimeoutError::Disconnected => "worker exited before reporting".to_string(),
                }),
                None => rx
                    .recv()
                    .map_err(|_| "worker exited before reporting".to_string()),
            };

            match received {
                Ok(Ok(Ok(batch))) => {
                    debug!(auditor = name, findings = batch.len(), "auditor completed");
                    findings.extend(batch);
                }
                Ok(Ok(Err(err))) => {
                    warn!(auditor = name, error = %err, "auditor failed");
                    failures.push(AuditorFailure {
                        auditor: name.to_string(),
                        error: err.to_string(),
                    });
                }
                Ok(Err(_)) => {
                    warn!(auditor = name, "auditor panicked");
                    failures.push(AuditorFailure {
                        auditor: name.to_string(),
                        error: "panicked".to_string(),
                    });
                }
                Err(message) => {
                    warn!(auditor = name, error = %message, "auditor abandoned");
                    failures.push(AuditorFailure {
                        auditor: name.to_string(),
                        error: message,
                    });
                }
            }
        }

        let analyses = match catch_unwind(AssertUnwindSafe(|| {
            analyze_groups(&ctx.inventory.security_groups, &ctx.usage)
        })) {
            Ok(analyses) => analyses,
            Err(_) => {
                warn!("lifecycle analysis panicked");
                failures.push(AuditorFailure {
                    auditor: "lifecycle".to_string(),
                    error: "panicked".to_string(),
                });
                Vec::new()
            }
        };

        let candidates = match catch_unwind(AssertUnwindSafe(|| {
            consolidation::find_with_limits(
                &ctx.inventory.security_groups,
                &ctx.usage,
                self.config.similarity_threshold,
                self.config.consolidation_attachment_limit,
            )
        })) {
            Ok(candidates) => candidates,
            Err(_) => {
                warn!("consolidation analysis panicked");
                failures.push(AuditorFailure {
                    auditor: "consolidation".to_string(),
                    error: "panicked".to_string(),
                });
                Vec::new()
            }
        };

        findings.retain(|finding| self.config.keeps(finding));
        let summary = Summary::from_findings(&findings);
        info!(
            total = findings.len(),
            critical = summary.critical,
            high = summary.high,
            "audit run complete"
        );

        AuditReport {
            status: RunStatus::Analyzed,
            generated_at: Utc::now(),
            summary,
            findings,
            analyses,
            candidates,
            failures,
            missing_sections,
        }
    }
}
