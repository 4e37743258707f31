//! Normalized inventory model.
//!
//! Field names follow the provider-style keys the collection tooling
//! emits (`GroupId`, `IpPermissions`, ...). Records are deserialized
//! once per audit run and never mutated afterwards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(rename = "GroupId")]
    pub group_id: String,
    #[serde(rename = "GroupName", default)]
    pub group_name: String,
    #[serde(rename = "VpcId", default)]
    pub vpc_id: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "IpPermissions", default)]
    pub ingress: Vec<SgRule>,
    #[serde(rename = "IpPermissionsEgress", default)]
    pub egress: Vec<SgRule>,
}

impl SecurityGroup {
    pub fn name_or_id(&self) -> &str {
        if self.group_name.is_empty() {
            &self.group_id
        } else {
            &self.group_name
        }
    }

    pub fn rules_count(&self) -> usize {
        self.ingress.len() + self.egress.len()
    }

    pub fn all_rules(&self) -> impl Iterator<Item = &SgRule> {
        self.ingress.iter().chain(self.egress.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SgRule {
    /// Provider protocol string; `"-1"` means all protocols.
    #[serde(rename = "IpProtocol", default)]
    pub protocol: String,
    /// Absent ports mean the rule covers the whole port space.
    #[serde(rename = "FromPort", default)]
    pub from_port: Option<i32>,
    #[serde(rename = "ToPort", default)]
    pub to_port: Option<i32>,
    #[serde(rename = "IpRanges", default)]
    pub ip_ranges: Vec<IpRange>,
    #[serde(rename = "Ipv6Ranges", default)]
    pub ipv6_ranges: Vec<Ipv6Range>,
    #[serde(rename = "UserIdGroupPairs", default)]
    pub group_refs: Vec<GroupRef>,
}

impl SgRule {
    /// All-traffic rule: protocol `-1` with no port bounds.
    pub fn is_all_traffic(&self) -> bool {
        self.protocol == "-1" && self.from_port.is_none() && self.to_port.is_none()
    }

    /// Effective port range, treating absent bounds as the full space.
    pub fn port_span(&self) -> (i32, i32) {
        (self.from_port.unwrap_or(0), self.to_port.unwrap_or(65535))
    }

    /// Every CIDR source of this rule with its optional description.
    pub fn cidr_sources(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.ip_ranges
            .iter()
            .map(|r| (r.cidr.as_str(), r.description.as_deref()))
            .chain(
                self.ipv6_ranges
                    .iter()
                    .map(|r| (r.cidr.as_str(), r.description.as_deref())),
            )
    }

    /// Canonical signature: protocol, port bounds, sorted CIDR set,
    /// sorted peer-group set. Identical signatures identify duplicate
    /// rules and drive similarity detection.
    pub fn signature(&self) -> String {
        let mut cidrs: Vec<&str> = self.cidr_sources().map(|(cidr, _)| cidr).collect();
        cidrs.sort_unstable();
        let mut refs: Vec<&str> = self.group_refs.iter().map(|r| r.group_id.as_str()).collect();
        refs.sort_unstable();

        let from = self.from_port.map(|p| p.to_string()).unwrap_or_default();
        let to = self.to_port.map(|p| p.to_string()).unwrap_or_default();
        format!(
            "{}:{}:{}:{}:{}",
            self.protocol,
            from,
            to,
            cidrs.join(","),
            refs.join(",")
        )
    }

    /// Human-readable one-line rendering for finding metadata.
    pub fn render(&self) -> String {
        let ports = match (self.from_port, self.to_port) {
            (Some(from), Some(to)) if from == to => from.to_string(),
            (Some(from), Some(to)) => format!("{from}-{to}"),
            _ => "all".to_string(),
        };
        let sources: Vec<&str> = self
            .cidr_sources()
            .map(|(cidr, _)| cidr)
            .chain(self.group_refs.iter().map(|r| r.group_id.as_str()))
            .collect();
        format!("{}:{} from {}", self.protocol, ports, sources.join(","))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpRange {
    #[serde(rename = "CidrIp", default)]
    pub cidr: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ipv6Range {
    #[serde(rename = "CidrIpv6", default)]
    pub cidr: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(rename = "GroupId", default)]
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    #[serde(rename = "NetworkInterfaceId")]
    pub interface_id: String,
    #[serde(rename = "Groups", default)]
    pub groups: Vec<GroupRef>,
    #[serde(rename = "VpcId", default)]
    pub vpc_id: Option<String>,
    #[serde(rename = "SubnetId", default)]
    pub subnet_id: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Association", default, skip_serializing_if = "Option::is_none")]
    pub association: Option<EniAssociation>,
    #[serde(rename = "Attachment", default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<EniAttachment>,
}

impl NetworkInterface {
    pub fn has_public_ip(&self) -> bool {
        self.association
            .as_ref()
            .is_some_and(|a| a.public_ip.is_some())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EniAssociation {
    #[serde(rename = "PublicIp", default)]
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EniAttachment {
    #[serde(rename = "InstanceId", default)]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "InstanceId")]
    pub instance_id: String,
    #[serde(rename = "InstanceType", default)]
    pub instance_type: Option<String>,
    #[serde(rename = "SecurityGroups", default)]
    pub security_groups: Vec<GroupRef>,
    #[serde(rename = "State", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<InstanceState>,
    #[serde(rename = "VpcId", default)]
    pub vpc_id: Option<String>,
    #[serde(rename = "LaunchTime", default)]
    pub launch_time: Option<String>,
    #[serde(rename = "PublicIpAddress", default)]
    pub public_ip: Option<String>,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.name == "running")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(rename = "Name", default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    #[serde(rename = "LoadBalancerName", default)]
    pub name: String,
    #[serde(rename = "LoadBalancerArn", default)]
    pub arn: String,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Scheme", default)]
    pub scheme: Option<String>,
    #[serde(rename = "SecurityGroups", default)]
    pub security_groups: Vec<String>,
    #[serde(rename = "VpcId", default)]
    pub vpc_id: Option<String>,
    #[serde(rename = "CreatedTime", default)]
    pub created_time: Option<String>,
}

impl LoadBalancer {
    pub fn resource_id(&self) -> &str {
        if self.name.is_empty() {
            &self.arn
        } else {
            &self.name
        }
    }

    pub fn is_internet_facing(&self) -> bool {
        self.scheme.as_deref() == Some("internet-facing")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(rename = "DBInstanceIdentifier")]
    pub identifier: String,
    #[serde(rename = "Engine", default)]
    pub engine: Option<String>,
    #[serde(rename = "DBInstanceStatus", default)]
    pub status: Option<String>,
    #[serde(rename = "PubliclyAccessible", default)]
    pub publicly_accessible: bool,
    #[serde(rename = "VpcSecurityGroups", default)]
    pub security_groups: Vec<VpcSecurityGroupRef>,
    #[serde(rename = "InstanceCreateTime", default)]
    pub created_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcSecurityGroupRef {
    #[serde(rename = "VpcSecurityGroupId", default)]
    pub group_id: String,
}
