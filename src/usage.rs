//! Cross-resource usage mapping for security groups.
//!
//! Builds one [`UsageSummary`] per group by scanning every resource
//! section once, O(total group references). Every known group gets an
//! explicit summary — downstream classification never special-cases a
//! group it has not seen.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::inventory::Inventory;
use crate::timeutil::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    NetworkInterface,
    Instance,
    LoadBalancer,
    Database,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::NetworkInterface => "NetworkInterface",
            ResourceKind::Instance => "Instance",
            ResourceKind::LoadBalancer => "LoadBalancer",
            ResourceKind::Database => "Database",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One association between a security group and a resource. The group
/// does not own the resource; records are per-run snapshots.
#[derive(Debug, Clone)]
pub struct AttachmentRecord {
    pub kind: ResourceKind,
    pub resource_id: String,
    pub vpc_id: Option<String>,
    /// Whether the resource is publicly addressable.
    pub public_ip: bool,
    /// True only for instances in the running state.
    pub running: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-group attachment aggregate, rebuilt on every audit run.
#[derive(Debug, Clone, Default)]
pub struct UsageSummary {
    pub records: Vec<AttachmentRecord>,
    pub kinds: FxHashSet<ResourceKind>,
    pub creation_times: Vec<DateTime<Utc>>,
}

impl UsageSummary {
    fn push(&mut self, record: AttachmentRecord) {
        self.kinds.insert(record.kind);
        if let Some(created) = record.created_at {
            self.creation_times.push(created);
        }
        self.records.push(record);
    }

    pub fn total_attachments(&self) -> usize {
        self.records.len()
    }

    pub fn distinct_kinds(&self) -> usize {
        self.kinds.len()
    }

    pub fn has_kind(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn any_running_instance(&self) -> bool {
        self.records.iter().any(|r| r.running)
    }

    /// True when no attached resource is publicly addressable.
    /// Vacuously true for a group with no attachments.
    pub fn all_private(&self) -> bool {
        self.records.iter().all(|r| !r.public_ip)
    }
}

/// Group id → usage summary for one inventory snapshot.
#[derive(Debug, Clone, Default)]
pub struct UsageMap {
    map: FxHashMap<String, UsageSummary>,
}

impl UsageMap {
    pub fn build(inventory: &Inventory) -> Self {
        let mut map: FxHashMap<String, UsageSummary> = FxHashMap::default();

        // Seed every known group so lookups never miss.
        for group in &inventory.security_groups {
            map.entry(group.group_id.clone()).or_default();
        }

        for eni in &inventory.network_interfaces {
            for group in &eni.groups {
                if group.group_id.is_empty() {
                    continue;
                }
                map.entry(group.group_id.clone())
                    .or_default()
                    .push(AttachmentRecord {
                        kind: ResourceKind::NetworkInterface,
                        resource_id: eni.interface_id.clone(),
                        vpc_id: eni.vpc_id.clone(),
                        public_ip: eni.has_public_ip(),
                        running: false,
                        created_at: None,
                    });
            }
        }

        for instance in &inventory.instances {
            let created_at = instance
                .launch_time
                .as_deref()
                .and_then(parse_timestamp);
            for group in &instance.security_groups {
                if group.group_id.is_empty() {
                    continue;
                }
                map.entry(group.group_id.clone())
                    .or_default()
                    .push(AttachmentRecord {
                        kind: ResourceKind::Instance,
                        resource_id: instance.instance_id.clone(),
                        vpc_id: instance.vpc_id.clone(),
                        public_ip: instance.public_ip.is_some(),
                        running: instance.is_running(),
                        created_at,
                    });
            }
        }

        for lb in &inventory.load_balancers {
            let created_at = lb.created_time.as_deref().and_then(parse_timestamp);
            for group_id in &lb.security_groups {
                if group_id.is_empty() {
                    continue;
                }
                map.entry(group_id.clone())
                    .or_default()
                    .push(AttachmentRecord {
                        kind: ResourceKind::LoadBalancer,
                        resource_id: lb.resource_id().to_string(),
                        vpc_id: lb.vpc_id.clone(),
                        public_ip: lb.is_internet_facing(),
                        running: false,
                        created_at,
                    });
            }
        }

        for db in &inventory.databases {
            let created_at = db.created_time.as_deref().and_then(parse_timestamp);
            for group in &db.security_groups {
                if group.group_id.is_empty() {
                    continue;
                }
                map.entry(group.group_id.clone())
                    .or_default()
                    .push(AttachmentRecord {
                        kind: ResourceKind::Database,
                        resource_id: db.identifier.clone(),
                        vpc_id: None,
                        public_ip: db.publicly_accessible,
                        running: false,
                        created_at,
                    });
            }
        }

        Self { map }
    }

    /// Usage summary for a group. Unknown ids resolve to an explicit
    /// empty summary, never a missing entry.
    pub fn for_group(&self, group_id: &str) -> &UsageSummary {
        self.map.get(group_id).unwrap_or_else(|| empty_summary())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn empty_summary() -> &'static UsageSummary {
    static EMPTY: OnceLock<UsageSummary> = OnceLock::new();
    EMPTY.get_or_init(UsageSummary::default)
}
