//! Audit configuration.
//!
//! Loaded from an optional `.sg-audit.yaml`; every field has a default
//! so an absent file means default behavior.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audit::consolidation::{SAFE_ATTACHMENT_LIMIT, SIMILARITY_THRESHOLD};
use crate::error::{AuditError, Result};
use crate::rules::{Finding, Severity};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".sg-audit.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Drop findings below this severity.
    pub min_severity: Option<Severity>,
    /// Rule ids that must not be reported.
    pub skip_rules: Vec<String>,
    /// Auditors to leave out of the default registry, by name.
    pub disabled_auditors: Vec<String>,
    /// Per-auditor deadline; a blown deadline counts as a failure.
    pub auditor_timeout_secs: Option<u64>,
    /// Policy exception: downgrade HIGH exposure findings to MEDIUM
    /// when no attached resource is publicly addressable.
    pub downgrade_internal_exposure: bool,
    /// Minimum rule-signature overlap for consolidation candidates.
    pub similarity_threshold: f64,
    /// Clusters with at least this many combined attachments are not
    /// marked safe to consolidate.
    pub consolidation_attachment_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            min_severity: None,
            skip_rules: Vec::new(),
            disabled_auditors: Vec::new(),
            auditor_timeout_secs: Some(60),
            downgrade_internal_exposure: true,
            similarity_threshold: SIMILARITY_THRESHOLD,
            consolidation_attachment_limit: SAFE_ATTACHMENT_LIMIT,
        }
    }
}

impl AuditConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| AuditError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `.sg-audit.yaml` from `dir` when present, defaults
    /// otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn auditor_timeout(&self) -> Option<Duration> {
        self.auditor_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_auditor_enabled(&self, name: &str) -> bool {
        !self.disabled_auditors.iter().any(|d| d == name)
    }

    /// Post-aggregation finding filter: skip list and minimum
    /// severity, compared by ordinal rank.
    pub fn keeps(&self, finding: &Finding) -> bool {
        if self.skip_rules.iter().any(|id| *id == finding.rule_id) {
            return false;
        }
        if let Some(min) = self.min_severity {
            if finding.severity.rank() < min.rank() {
                return false;
            }
        }
        true
    }
}
