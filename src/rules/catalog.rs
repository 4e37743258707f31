//! Static catalog of audit rules.
//!
//! Rule ids are stable identifiers consumed by downstream report
//! tooling for deduplication and sorting; they must not change across
//! releases.

use crate::rules::types::Severity;

#[derive(Debug, Clone)]
pub struct RuleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Baseline severity; individual findings may escalate from here.
    pub severity: Severity,
    pub recommendation: &'static str,
    pub compliance: &'static [&'static str],
}

pub const OPEN_INGRESS: RuleDef = RuleDef {
    id: "SG_ADV_001",
    name: "Ingress open to the internet",
    description: "Security group allows inbound traffic from 0.0.0.0/0",
    severity: Severity::Medium,
    recommendation: "Restrict access to specific IP ranges or front the service with a load balancer, CDN, or WAF",
    compliance: &["CIS", "SOC2", "PCI-DSS", "ISO27001"],
};

pub const BROAD_CIDR: RuleDef = RuleDef {
    id: "SG_ADV_002",
    name: "Overly broad CIDR range",
    description: "Security group allows access from a very wide address range",
    severity: Severity::Medium,
    recommendation: "Narrow the CIDR range to only the addresses that need access",
    compliance: &["CIS", "Best Practices"],
};

pub const OPEN_EGRESS: RuleDef = RuleDef {
    id: "SG_ADV_003",
    name: "Egress fully open",
    description: "Security group allows all outbound traffic to 0.0.0.0/0",
    severity: Severity::Low,
    recommendation: "Define specific egress rules for the services the attached resources actually need",
    compliance: &["Defense in Depth"],
};

pub const DUPLICATE_RULES: RuleDef = RuleDef {
    id: "SG_ADV_004",
    name: "Duplicate rules",
    description: "Security group contains rules with identical signatures",
    severity: Severity::Low,
    recommendation: "Remove duplicate rules to simplify management",
    compliance: &["Best Practices"],
};

pub const OVERLAPPING_RULES: RuleDef = RuleDef {
    id: "SG_ADV_005",
    name: "Overlapping rules",
    description: "Security group has ingress rules with intersecting port and address ranges",
    severity: Severity::Low,
    recommendation: "Consolidate overlapping rules to keep the rule set easy to reason about",
    compliance: &["Best Practices"],
};

pub const DEFAULT_MODIFIED: RuleDef = RuleDef {
    id: "SG_COMP_001",
    name: "Default security group modified",
    description: "The default security group carries custom ingress rules",
    severity: Severity::Medium,
    recommendation: "Do not attach workloads to the default security group; create purpose-specific groups and remove the custom rules",
    compliance: &["CIS", "AWS Well-Architected"],
};

pub const UNUSED_GROUP: RuleDef = RuleDef {
    id: "SG_OPT_001",
    name: "Unused security group",
    description: "Security group is not associated with any resource",
    severity: Severity::Low,
    recommendation: "Remove unused security groups to reduce complexity",
    compliance: &["Cost Optimization"],
};

pub const NETWORK_OVERHEAD: RuleDef = RuleDef {
    id: "SG_OPT_002",
    name: "Broad CIDR processing overhead",
    description: "An extremely wide CIDR range can add network processing overhead",
    severity: Severity::Low,
    recommendation: "Narrow down CIDR ranges to reduce network processing",
    compliance: &["Cost Optimization"],
};

/// Every rule this engine can emit, in stable id order.
pub const CATALOG: &[&RuleDef] = &[
    &OPEN_INGRESS,
    &BROAD_CIDR,
    &OPEN_EGRESS,
    &DUPLICATE_RULES,
    &OVERLAPPING_RULES,
    &DEFAULT_MODIFIED,
    &UNUSED_GROUP,
    &NETWORK_OVERHEAD,
];
