//! End-to-end engine scenarios over in-memory inventories.

use std::sync::Arc;

use sg_audit::audit::AuditContext;
use sg_audit::inventory::model::{
    GroupRef, Instance, InstanceState, IpRange, SecurityGroup, SgRule,
};
use sg_audit::{
    classify_deletion_safety, compute_usage_score, AuditConfig, AuditEngine, Auditor,
    DeletionSafety, Finding, Inventory, RunStatus, Severity, UsageMap,
};

fn web_group() -> SecurityGroup {
    SecurityGroup {
        group_id: "sg-1".to_string(),
        group_name: "web".to_string(),
        vpc_id: Some("vpc-1".to_string()),
        description: "web tier".to_string(),
        ingress: vec![SgRule {
            protocol: "tcp".to_string(),
            from_port: Some(22),
            to_port: Some(22),
            ip_ranges: vec![IpRange {
                cidr: "0.0.0.0/0".to_string(),
                description: None,
            }],
            ..SgRule::default()
        }],
        egress: Vec::new(),
    }
}

fn running_public_instance(group_id: &str) -> Instance {
    Instance {
        instance_id: "i-1".to_string(),
        instance_type: Some("t3.micro".to_string()),
        security_groups: vec![GroupRef {
            group_id: group_id.to_string(),
        }],
        state: Some(InstanceState {
            name: "running".to_string(),
        }),
        vpc_id: Some("vpc-1".to_string()),
        launch_time: None,
        public_ip: Some("203.0.113.7".to_string()),
    }
}

#[test]
fn unattached_web_group_with_open_ssh() {
    let inventory = Inventory {
        security_groups: vec![web_group()],
        ..Inventory::default()
    };
    let usage = UsageMap::build(&inventory);
    let group = &inventory.security_groups[0];

    // No attachments: zero score, safe to delete.
    assert_eq!(compute_usage_score(group, usage.for_group("sg-1")), 0.0);
    assert_eq!(
        classify_deletion_safety(group, usage.for_group("sg-1")),
        DeletionSafety::Safe
    );

    // SSH to the world beats the MEDIUM baseline.
    let report = AuditEngine::with_defaults().run(inventory);
    assert_eq!(report.status, RunStatus::Analyzed);
    let open: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "SG_ADV_001")
        .collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::Critical);
    assert_eq!(report.summary.critical, 1);
    assert!(!report.passed());
}

#[test]
fn attaching_running_public_instance_flips_safety_not_severity() {
    let inventory = Inventory {
        security_groups: vec![web_group()],
        instances: vec![running_public_instance("sg-1")],
        ..Inventory::default()
    };
    let usage = UsageMap::build(&inventory);
    let group = &inventory.security_groups[0];

    assert_eq!(
        classify_deletion_safety(group, usage.for_group("sg-1")),
        DeletionSafety::Dangerous
    );

    let report = AuditEngine::with_defaults().run(inventory);
    let open: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "SG_ADV_001")
        .collect();
    // The instance has a public address, so no downgrade applies.
    assert_eq!(open[0].severity, Severity::Critical);
    assert_eq!(report.analyses.len(), 1);
    assert_eq!(report.analyses[0].deletion_safety, DeletionSafety::Dangerous);
}

struct ExplodingAuditor;

impl Auditor for ExplodingAuditor {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn audit(&self, _ctx: &AuditContext) -> sg_audit::Result<Vec<Finding>> {
        panic!("mid-run failure");
    }
}

#[test]
fn failing_auditor_does_not_abort_the_run() {
    let mut engine = AuditEngine::new(AuditConfig::default());
    engine.register(Arc::new(ExplodingAuditor));

    let inventory = Inventory {
        security_groups: vec![web_group()],
        ..Inventory::default()
    };
    let report = engine.run(inventory);

    // Findings from the default auditors survive.
    assert!(report.findings.iter().any(|f| f.rule_id == "SG_ADV_001"));
    assert!(report.findings.iter().any(|f| f.rule_id == "SG_OPT_001"));
    // And the failure is recorded.
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].auditor, "exploding");
}

#[test]
fn consolidation_candidates_share_vpc() {
    let mut a = web_group();
    let mut b = web_group();
    b.group_id = "sg-2".to_string();
    b.group_name = "web-copy".to_string();
    let mut c = web_group();
    c.group_id = "sg-3".to_string();
    c.group_name = "web-other-vpc".to_string();
    c.vpc_id = Some("vpc-2".to_string());
    // Give all three identical rule sets.
    a.ingress = b.ingress.clone();
    c.ingress = b.ingress.clone();

    let inventory = Inventory {
        security_groups: vec![a, b, c],
        ..Inventory::default()
    };
    let report = AuditEngine::with_defaults().run(inventory);
    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.candidates[0].primary.group_id, "sg-1");
    assert_eq!(report.candidates[0].similar.len(), 1);
    assert_eq!(report.candidates[0].similar[0].group_id, "sg-2");
    assert!(report.candidates[0].safe_to_consolidate);
}

#[test]
fn empty_inventory_is_distinguishable_from_clean() {
    let report = AuditEngine::with_defaults().run(Inventory::default());
    assert_eq!(report.status, RunStatus::EmptyInventory);
    assert!(report.findings.is_empty());

    let clean = Inventory {
        security_groups: vec![SecurityGroup {
            group_id: "sg-1".to_string(),
            group_name: "default".to_string(),
            vpc_id: Some("vpc-1".to_string()),
            description: String::new(),
            ingress: Vec::new(),
            egress: Vec::new(),
        }],
        ..Inventory::default()
    };
    let report = AuditEngine::with_defaults().run(clean);
    assert_eq!(report.status, RunStatus::Analyzed);
}

#[test]
fn duplicate_ingress_rules_produce_one_finding() {
    let mut group = web_group();
    group.ingress.push(group.ingress[0].clone());
    let inventory = Inventory {
        security_groups: vec![group],
        ..Inventory::default()
    };
    let report = AuditEngine::with_defaults().run(inventory);
    let dups: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.rule_id == "SG_ADV_004")
        .collect();
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].metadata["duplicate_count"], 1);
}
