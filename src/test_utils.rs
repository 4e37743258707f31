#[cfg(test)]
pub mod fixtures {
    use crate::audit::{AuditReport, RunStatus};
    use crate::inventory::model::{
        Database, GroupRef, Instance, InstanceState, IpRange, LoadBalancer, NetworkInterface,
        SecurityGroup, SgRule, VpcSecurityGroupRef,
    };
    use crate::inventory::Inventory;
    use crate::rules::{catalog, Finding, Severity, Summary};
    use chrono::Utc;

    pub fn make_group(id: &str, name: &str, vpc: Option<&str>) -> SecurityGroup {
        SecurityGroup {
            group_id: id.to_string(),
            group_name: name.to_string(),
            vpc_id: vpc.map(|v| v.to_string()),
            description: String::new(),
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }

    pub fn cidr_rule(protocol: &str, from: Option<i32>, to: Option<i32>, cidrs: &[&str]) -> SgRule {
        SgRule {
            protocol: protocol.to_string(),
            from_port: from,
            to_port: to,
            ip_ranges: cidrs
                .iter()
                .map(|cidr| IpRange {
                    cidr: cidr.to_string(),
                    description: None,
                })
                .collect(),
            ..SgRule::default()
        }
    }

    /// Self-referencing rule in the shape of the provider default.
    pub fn peer_rule(peer_group_id: &str) -> SgRule {
        SgRule {
            protocol: "-1".to_string(),
            group_refs: vec![GroupRef {
                group_id: peer_group_id.to_string(),
            }],
            ..SgRule::default()
        }
    }

    pub fn make_interface(id: &str, group_ids: &[&str]) -> NetworkInterface {
        NetworkInterface {
            interface_id: id.to_string(),
            groups: group_ids
                .iter()
                .map(|g| GroupRef {
                    group_id: g.to_string(),
                })
                .collect(),
            vpc_id: Some("vpc-1".to_string()),
            subnet_id: None,
            status: Some("in-use".to_string()),
            association: None,
            attachment: None,
        }
    }

    pub fn make_instance(id: &str, group_ids: &[&str], state: &str, public: bool) -> Instance {
        Instance {
            instance_id: id.to_string(),
            instance_type: Some("t3.micro".to_string()),
            security_groups: group_ids
                .iter()
                .map(|g| GroupRef {
                    group_id: g.to_string(),
                })
                .collect(),
            state: Some(InstanceState {
                name: state.to_string(),
            }),
            vpc_id: Some("vpc-1".to_string()),
            launch_time: None,
            public_ip: public.then(|| "203.0.113.10".to_string()),
        }
    }

    pub fn attach_instance(
        inventory: &mut Inventory,
        id: &str,
        group_id: &str,
        state: &str,
        public: bool,
    ) {
        inventory
            .instances
            .push(make_instance(id, &[group_id], state, public));
    }

    pub fn attach_load_balancer(inventory: &mut Inventory, name: &str, group_id: &str) {
        inventory.load_balancers.push(LoadBalancer {
            name: name.to_string(),
            arn: format!("arn:lb/{name}"),
            kind: Some("application".to_string()),
            scheme: Some("internal".to_string()),
            security_groups: vec![group_id.to_string()],
            vpc_id: Some("vpc-1".to_string()),
            created_time: None,
        });
    }

    pub fn attach_database(inventory: &mut Inventory, id: &str, group_id: &str) {
        inventory.databases.push(Database {
            identifier: id.to_string(),
            engine: Some("postgres".to_string()),
            status: Some("available".to_string()),
            publicly_accessible: false,
            security_groups: vec![VpcSecurityGroupRef {
                group_id: group_id.to_string(),
            }],
            created_time: None,
        });
    }

    pub fn ssh_open_finding() -> Finding {
        Finding::for_group(
            &catalog::OPEN_INGRESS,
            "sg-1",
            "web",
            "Security group 'web' allows tcp traffic on port 22 from 0.0.0.0/0".to_string(),
        )
        .with_severity(Severity::Critical)
        .with_remediation(
            "aws ec2 revoke-security-group-ingress --group-id sg-1 --protocol tcp --port 22 --cidr 0.0.0.0/0",
        )
    }

    pub fn report_with_findings(findings: Vec<Finding>) -> AuditReport {
        AuditReport {
            status: RunStatus::Analyzed,
            generated_at: Utc::now(),
            summary: Summary::from_findings(&findings),
            findings,
            analyses: Vec::new(),
            candidates: Vec::new(),
            failures: Vec::new(),
            missing_sections: Vec::new(),
        }
    }

    pub fn empty_report() -> AuditReport {
        AuditReport {
            status: RunStatus::EmptyInventory,
            generated_at: Utc::now(),
            summary: Summary::from_findings(&[]),
            findings: Vec::new(),
            analyses: Vec::new(),
            candidates: Vec::new(),
            failures: Vec::new(),
            missing_sections: Vec::new(),
        }
    }
}
