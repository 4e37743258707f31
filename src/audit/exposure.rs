//! Rule inspection: exposure, redundancy, and compliance checks per
//! security group.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde_json::json;
use tracing::warn;

use crate::audit::{AuditContext, Auditor};
use crate::cidr;
use crate::error::Result;
use crate::inventory::model::{SecurityGroup, SgRule};
use crate::rules::catalog;
use crate::rules::{Finding, Severity};
use crate::usage::UsageSummary;

/// Reserved name of the provider-managed default group.
const DEFAULT_GROUP_NAME: &str = "default";

struct CriticalPort {
    port: u16,
    service: &'static str,
    severity: Severity,
    alternatives: &'static [&'static str],
}

const SESSION_MANAGER: &[&str] = &["AWS Systems Manager Session Manager"];
const PRIVATE_NETWORKING: &[&str] = &["VPC peering", "Private subnets"];

/// Well-known service ports that must never face the open internet.
const CRITICAL_PORTS: &[CriticalPort] = &[
    CriticalPort { port: 22, service: "SSH", severity: Severity::Critical, alternatives: SESSION_MANAGER },
    CriticalPort { port: 3389, service: "RDP", severity: Severity::Critical, alternatives: SESSION_MANAGER },
    CriticalPort { port: 21, service: "FTP", severity: Severity::High, alternatives: &["SFTP", "AWS Transfer Family"] },
    CriticalPort { port: 23, service: "Telnet", severity: Severity::High, alternatives: &["SSH"] },
    CriticalPort { port: 135, service: "RPC", severity: Severity::High, alternatives: &["Disable or restrict"] },
    CriticalPort { port: 139, service: "NetBIOS", severity: Severity::High, alternatives: &["Disable or restrict"] },
    CriticalPort { port: 445, service: "SMB", severity: Severity::High, alternatives: &["VPN access only"] },
    CriticalPort { port: 1433, service: "MSSQL", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 3306, service: "MySQL", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 5432, service: "PostgreSQL", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 1521, service: "Oracle", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 27017, service: "MongoDB", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 6379, service: "Redis", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 11211, service: "Memcached", severity: Severity::High, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 9200, service: "Elasticsearch", severity: Severity::Medium, alternatives: PRIVATE_NETWORKING },
    CriticalPort { port: 5984, service: "CouchDB", severity: Severity::Medium, alternatives: PRIVATE_NETWORKING },
];

fn critical_port(port: i32) -> Option<&'static CriticalPort> {
    CRITICAL_PORTS.iter().find(|p| i32::from(p.port) == port)
}

/// The single permitted severity decrease: a HIGH exposure drops to
/// MEDIUM when nothing attached to the group is publicly addressable.
/// Applied once, after all escalations; kept as its own step so the
/// policy can be disabled without touching the escalation logic.
pub fn internal_exposure_downgrade(severity: Severity, usage: &UsageSummary) -> Severity {
    if severity == Severity::High && usage.all_private() {
        Severity::Medium
    } else {
        severity
    }
}

/// Inspects every rule of every group for exposure, redundancy, and
/// default-group compliance issues.
#[derive(Debug, Clone)]
pub struct ExposureAuditor {
    downgrade_internal: bool,
}

impl ExposureAuditor {
    pub fn new() -> Self {
        Self {
            downgrade_internal: true,
        }
    }

    pub fn with_internal_downgrade(mut self, enabled: bool) -> Self {
        self.downgrade_internal = enabled;
        self
    }
}

impl Default for ExposureAuditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Auditor for ExposureAuditor {
    fn name(&self) -> &'static str {
        "exposure"
    }

    fn audit(&self, ctx: &AuditContext) -> Result<Vec<Finding>> {
        // Groups are independent; inspect in parallel and flatten in
        // group order so output stays deterministic.
        let per_group: Vec<Vec<Finding>> = ctx
            .inventory
            .security_groups
            .par_iter()
            .map(|group| self.inspect_group(group, ctx.usage.for_group(&group.group_id)))
            .collect();
        Ok(per_group.into_iter().flatten().collect())
    }
}

impl ExposureAuditor {
    fn inspect_group(&self, group: &SecurityGroup, usage: &UsageSummary) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &group.ingress {
            self.inspect_ingress_rule(group, rule, usage, &mut findings);
        }
        for rule in &group.egress {
            inspect_egress_rule(group, rule, usage, &mut findings);
        }
        check_duplicate_rules(group, &mut findings);
        check_overlapping_rules(group, &mut findings);
        check_default_group(group, &mut findings);
        findings
    }

    fn inspect_ingress_rule(
        &self,
        group: &SecurityGroup,
        rule: &SgRule,
        usage: &UsageSummary,
        findings: &mut Vec<Finding>,
    ) {
        for (source, description) in rule.cidr_sources() {
            if cidr::is_open_to_world(source) {
                findings.push(self.open_ingress_finding(group, rule, source, description, usage));
            } else if cidr::is_broad(source) {
                broad_cidr_findings(group, rule, source, findings);
            }
        }
    }

    fn open_ingress_finding(
        &self,
        group: &SecurityGroup,
        rule: &SgRule,
        source: &str,
        source_description: Option<&str>,
        usage: &UsageSummary,
    ) -> Finding {
        let mut severity = catalog::OPEN_INGRESS.severity;
        let mut alternatives: Vec<&'static str> = Vec::new();
        let mut exposed_services: Vec<&'static str> = Vec::new();

        if rule.protocol == "-1" {
            severity = Severity::Critical;
            alternatives.extend(["Use specific ports", "Implement WAF", "Use VPC peering"]);
        } else if let (Some(from), Some(to)) = (rule.from_port, rule.to_port) {
            for port in from..=to {
                if let Some(entry) = critical_port(port) {
                    severity = severity.escalate(entry.severity);
                    alternatives.extend(entry.alternatives);
                    exposed_services.push(entry.service);
                }
            }
        }

        if self.downgrade_internal {
            severity = internal_exposure_downgrade(severity, usage);
        }

        if severity == Severity::Critical {
            warn!(
                group = %group.name_or_id(),
                rule = %rule.render(),
                "critical service exposed to the internet"
            );
        }

        let port_desc = match (rule.from_port, rule.to_port) {
            _ if rule.protocol == "-1" => "all ports".to_string(),
            (Some(from), Some(to)) if from == to => format!("port {from}"),
            (Some(from), Some(to)) => format!("ports {from}-{to}"),
            _ => "all ports".to_string(),
        };
        let mut description = format!(
            "Security group '{}' allows {} traffic on {} from {}",
            group.name_or_id(),
            rule.protocol,
            port_desc,
            source
        );
        if let Some(note) = source_description {
            if !note.is_empty() {
                description.push_str(&format!(" ({note})"));
            }
        }

        alternatives.sort_unstable();
        alternatives.dedup();
        let mut recommendation = catalog::OPEN_INGRESS.recommendation.to_string();
        if !alternatives.is_empty() {
            recommendation.push_str(&format!(". Alternatives: {}", alternatives.join(", ")));
        }

        let mut remediation = format!(
            "aws ec2 revoke-security-group-ingress --group-id {} --protocol {}",
            group.group_id, rule.protocol
        );
        if let Some(from) = rule.from_port {
            remediation.push_str(&format!(" --port {from}"));
        }
        remediation.push_str(&format!(" --cidr {source}"));

        Finding::for_group(
            &catalog::OPEN_INGRESS,
            &group.group_id,
            group.name_or_id(),
            description,
        )
        .with_severity(severity)
        .with_recommendation(recommendation)
        .with_remediation(remediation)
        .with_meta("protocol", json!(rule.protocol))
        .with_meta(
            "port_range",
            json!(format!(
                "{}-{}",
                rule.from_port.map(|p| p.to_string()).unwrap_or_default(),
                rule.to_port.map(|p| p.to_string()).unwrap_or_default()
            )),
        )
        .with_meta("cidr", json!(source))
        .with_meta("attached_resources", json!(usage.total_attachments()))
        .with_meta("has_public_attachments", json!(!usage.all_private()))
        .with_meta("exposed_services", json!(exposed_services))
        .with_meta("alternatives", json!(alternatives))
    }
}

fn broad_cidr_findings(
    group: &SecurityGroup,
    rule: &SgRule,
    source: &str,
    findings: &mut Vec<Finding>,
) {
    // Malformed CIDRs are skipped for breadth analysis; the rest of
    // the group still gets processed.
    let Some(prefix) = cidr::prefix_length(source) else {
        return;
    };
    let address_count = cidr::ipv4_address_count(prefix);

    let count_desc = address_count
        .map(|n| format!(" ({n} addresses)"))
        .unwrap_or_default();
    let description = format!(
        "Security group '{}' allows access from broad CIDR {}{}",
        group.name_or_id(),
        source,
        count_desc
    );
    let mut remediation = format!(
        "aws ec2 revoke-security-group-ingress --group-id {} --protocol {}",
        group.group_id, rule.protocol
    );
    if let Some(from) = rule.from_port {
        remediation.push_str(&format!(" --port {from}"));
    }
    remediation.push_str(&format!(" --cidr {source}"));

    findings.push(
        Finding::for_group(
            &catalog::BROAD_CIDR,
            &group.group_id,
            group.name_or_id(),
            description,
        )
        .with_remediation(remediation)
        .with_meta("cidr", json!(source))
        .with_meta("prefix_length", json!(prefix))
        .with_meta("ip_count", json!(address_count)),
    );

    if prefix < cidr::OVERHEAD_PREFIX_LIMIT {
        findings.push(
            Finding::for_group(
                &catalog::NETWORK_OVERHEAD,
                &group.group_id,
                group.name_or_id(),
                format!(
                    "Very broad CIDR {source} on '{}' may cause network processing overhead",
                    group.name_or_id()
                ),
            )
            .with_meta("cidr", json!(source))
            .with_meta("prefix_length", json!(prefix)),
        );
    }
}

fn inspect_egress_rule(
    group: &SecurityGroup,
    rule: &SgRule,
    usage: &UsageSummary,
    findings: &mut Vec<Finding>,
) {
    // Broad egress is common; only worth a note when the group is
    // actually in use.
    if rule.protocol != "-1" || usage.total_attachments() == 0 {
        return;
    }
    if !rule.cidr_sources().any(|(source, _)| cidr::is_open_to_world(source)) {
        return;
    }
    findings.push(
        Finding::for_group(
            &catalog::OPEN_EGRESS,
            &group.group_id,
            group.name_or_id(),
            format!(
                "Security group '{}' allows all egress traffic to 0.0.0.0/0",
                group.name_or_id()
            ),
        )
        .with_remediation("Define specific egress rules for the required services")
        .with_meta("attached_resources", json!(usage.total_attachments()))
        .with_meta("egress_type", json!("all_traffic")),
    );
}

fn check_duplicate_rules(group: &SecurityGroup, findings: &mut Vec<Finding>) {
    let mut duplicates: Vec<String> = Vec::new();
    for (direction, rules) in [("ingress", &group.ingress), ("egress", &group.egress)] {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for rule in rules {
            if !seen.insert(rule.signature()) {
                duplicates.push(format!("{direction}: {}", rule.render()));
            }
        }
    }
    if duplicates.is_empty() {
        return;
    }
    findings.push(
        Finding::for_group(
            &catalog::DUPLICATE_RULES,
            &group.group_id,
            group.name_or_id(),
            format!(
                "Security group '{}' contains {} duplicate rules",
                group.name_or_id(),
                duplicates.len()
            ),
        )
        .with_remediation("Review and consolidate the duplicate rules")
        .with_meta("duplicate_count", json!(duplicates.len()))
        .with_meta("duplicate_rules", json!(duplicates)),
    );
}

/// Two ingress rules overlap when their protocols match, their port
/// ranges intersect (absent bounds cover the whole space), and they
/// share at least one CIDR source.
pub fn rules_overlap(a: &SgRule, b: &SgRule) -> bool {
    if a.protocol != b.protocol {
        return false;
    }
    let (a_from, a_to) = a.port_span();
    let (b_from, b_to) = b.port_span();
    if !(a_from <= b_to && b_from <= a_to) {
        return false;
    }
    a.cidr_sources()
        .any(|(source, _)| b.cidr_sources().any(|(other, _)| source == other))
}

fn check_overlapping_rules(group: &SecurityGroup, findings: &mut Vec<Finding>) {
    let rules = &group.ingress;
    let mut pairs = 0usize;
    for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            if rules_overlap(&rules[i], &rules[j]) {
                pairs += 1;
            }
        }
    }
    if pairs == 0 {
        return;
    }
    findings.push(
        Finding::for_group(
            &catalog::OVERLAPPING_RULES,
            &group.group_id,
            group.name_or_id(),
            format!(
                "Security group '{}' has {} overlapping ingress rule pairs",
                group.name_or_id(),
                pairs
            ),
        )
        .with_remediation("Analyze and consolidate rules with intersecting ranges")
        .with_meta("overlapping_pairs", json!(pairs)),
    );
}

/// The canonical default-group rule references the group itself and
/// nothing else.
pub fn is_default_self_reference(rule: &SgRule) -> bool {
    rule.group_refs.len() == 1 && rule.ip_ranges.is_empty() && rule.ipv6_ranges.is_empty()
}

fn check_default_group(group: &SecurityGroup, findings: &mut Vec<Finding>) {
    if group.group_name != DEFAULT_GROUP_NAME {
        return;
    }
    let custom_rules = group
        .ingress
        .iter()
        .filter(|rule| !is_default_self_reference(rule))
        .count();
    if custom_rules == 0 {
        return;
    }
    findings.push(
        Finding::for_group(
            &catalog::DEFAULT_MODIFIED,
            &group.group_id,
            &group.group_name,
            format!("Default security group has {custom_rules} custom ingress rules"),
        )
        .with_remediation("Create dedicated security groups and remove the custom rules from the default group")
        .with_meta("custom_ingress_rules", json!(custom_rules))
        .with_meta("vpc_id", json!(group.vpc_id)),
    );
}
