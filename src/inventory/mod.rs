//! Inventory snapshot loading and normalization.
//!
//! The collection tooling (out of scope here) dumps one JSON file per
//! resource section. The loader accepts either a directory of section
//! files or a single combined snapshot object. Missing sections load
//! as empty and are recorded, so the engine can tell "nothing wrong"
//! from "nothing to analyze".

pub mod model;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{AuditError, Result};
use model::{Database, Instance, LoadBalancer, NetworkInterface, SecurityGroup};

/// Inventory sections, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    SecurityGroups,
    NetworkInterfaces,
    Instances,
    LoadBalancers,
    Databases,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::SecurityGroups,
        Section::NetworkInterfaces,
        Section::Instances,
        Section::LoadBalancers,
        Section::Databases,
    ];

    /// JSON key used in combined snapshots and per-section files.
    pub fn key(&self) -> &'static str {
        match self {
            Section::SecurityGroups => "SecurityGroups",
            Section::NetworkInterfaces => "NetworkInterfaces",
            Section::Instances => "Instances",
            Section::LoadBalancers => "LoadBalancers",
            Section::Databases => "Databases",
        }
    }

    /// File name expected inside an inventory directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Section::SecurityGroups => "security_groups.json",
            Section::NetworkInterfaces => "network_interfaces.json",
            Section::Instances => "instances.json",
            Section::LoadBalancers => "load_balancers.json",
            Section::Databases => "databases.json",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One normalized inventory snapshot. Built fresh per audit run.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub security_groups: Vec<SecurityGroup>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub instances: Vec<Instance>,
    pub load_balancers: Vec<LoadBalancer>,
    pub databases: Vec<Database>,
    /// Sections the snapshot did not contain at all.
    pub missing_sections: Vec<Section>,
}

impl Inventory {
    /// True when the snapshot carries no records in any section.
    pub fn is_empty(&self) -> bool {
        self.security_groups.is_empty()
            && self.network_interfaces.is_empty()
            && self.instances.is_empty()
            && self.load_balancers.is_empty()
            && self.databases.is_empty()
    }

    /// Load from a directory of per-section JSON files. Files may hold
    /// either a bare array or an object keyed by the section name;
    /// instance files may additionally use the raw `Reservations`
    /// nesting the provider API returns.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut inventory = Inventory::default();
        for section in Section::ALL {
            let path = dir.join(section.file_name());
            if !path.exists() {
                debug!(section = %section, "inventory section file missing, treating as empty");
                inventory.missing_sections.push(section);
                continue;
            }
            let value = read_json(&path)?;
            inventory.load_section(section, value, &path)?;
        }
        Ok(inventory)
    }

    /// Load from a single combined snapshot object.
    pub fn from_file(path: &Path) -> Result<Self> {
        let value = read_json(path)?;
        let mut inventory = Inventory::default();
        for section in Section::ALL {
            match value.get(section.key()) {
                Some(section_value) => {
                    inventory.load_section(section, section_value.clone(), path)?;
                }
                None => {
                    debug!(section = %section, "section absent from snapshot, treating as empty");
                    inventory.missing_sections.push(section);
                }
            }
        }
        Ok(inventory)
    }

    fn load_section(&mut self, section: Section, value: Value, path: &Path) -> Result<()> {
        match section {
            Section::SecurityGroups => {
                self.security_groups = parse_records(value, section.key(), path)?;
            }
            Section::NetworkInterfaces => {
                self.network_interfaces = parse_records(value, section.key(), path)?;
            }
            Section::Instances => {
                self.instances = parse_instances(value, path)?;
            }
            Section::LoadBalancers => {
                self.load_balancers = parse_records(value, section.key(), path)?;
            }
            Section::Databases => {
                // Provider dumps use "DBInstances"; accept our section
                // key as well.
                self.databases = match parse_records(value.clone(), "DBInstances", path) {
                    Ok(records) if !records.is_empty() => records,
                    _ => parse_records(value, section.key(), path)?,
                };
            }
        }
        Ok(())
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AuditError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract a record list that may be a bare array or wrapped in an
/// object under `key`.
fn parse_records<T: DeserializeOwned>(value: Value, key: &str, path: &Path) -> Result<Vec<T>> {
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map.remove(key).unwrap_or_else(|| Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list).map_err(|source| AuditError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Instances may arrive flat or nested under reservations.
fn parse_instances(value: Value, path: &Path) -> Result<Vec<Instance>> {
    if let Value::Object(map) = &value {
        if let Some(Value::Array(reservations)) = map.get("Reservations") {
            let mut instances = Vec::new();
            for reservation in reservations {
                if let Some(batch) = reservation.get("Instances") {
                    let mut parsed: Vec<Instance> =
                        serde_json::from_value(batch.clone()).map_err(|source| {
                            AuditError::Json {
                                path: path.to_path_buf(),
                                source,
                            }
                        })?;
                    instances.append(&mut parsed);
                }
            }
            return Ok(instances);
        }
    }
    parse_records(value, "Instances", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        fs::write(dir.join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_from_dir_with_bare_arrays() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "security_groups.json",
            serde_json::json!([{"GroupId": "sg-1", "GroupName": "web"}]),
        );
        let inventory = Inventory::from_dir(dir.path()).unwrap();
        assert_eq!(inventory.security_groups.len(), 1);
        assert!(inventory
            .missing_sections
            .contains(&Section::NetworkInterfaces));
        assert!(!inventory.is_empty());
    }

    #[test]
    fn test_from_dir_with_wrapped_objects() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "security_groups.json",
            serde_json::json!({"SecurityGroups": [{"GroupId": "sg-1"}]}),
        );
        write(
            dir.path(),
            "network_interfaces.json",
            serde_json::json!({"NetworkInterfaces": [
                {"NetworkInterfaceId": "eni-1", "Groups": [{"GroupId": "sg-1"}]}
            ]}),
        );
        let inventory = Inventory::from_dir(dir.path()).unwrap();
        assert_eq!(inventory.security_groups.len(), 1);
        assert_eq!(inventory.network_interfaces.len(), 1);
    }

    #[test]
    fn test_instances_from_reservations() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "instances.json",
            serde_json::json!({"Reservations": [
                {"Instances": [{"InstanceId": "i-1"}, {"InstanceId": "i-2"}]},
                {"Instances": [{"InstanceId": "i-3"}]}
            ]}),
        );
        let inventory = Inventory::from_dir(dir.path()).unwrap();
        assert_eq!(inventory.instances.len(), 3);
    }

    #[test]
    fn test_databases_accept_provider_key() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "databases.json",
            serde_json::json!({"DBInstances": [{"DBInstanceIdentifier": "db-1"}]}),
        );
        let inventory = Inventory::from_dir(dir.path()).unwrap();
        assert_eq!(inventory.databases.len(), 1);
    }

    #[test]
    fn test_empty_dir_is_empty_inventory() {
        let dir = TempDir::new().unwrap();
        let inventory = Inventory::from_dir(dir.path()).unwrap();
        assert!(inventory.is_empty());
        assert_eq!(inventory.missing_sections.len(), 5);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("security_groups.json"), "{not json").unwrap();
        assert!(Inventory::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_from_combined_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(
            &path,
            serde_json::json!({
                "SecurityGroups": [{"GroupId": "sg-1"}],
                "Instances": [{"InstanceId": "i-1", "SecurityGroups": [{"GroupId": "sg-1"}]}]
            })
            .to_string(),
        )
        .unwrap();
        let inventory = Inventory::from_file(&path).unwrap();
        assert_eq!(inventory.security_groups.len(), 1);
        assert_eq!(inventory.instances.len(), 1);
        assert!(inventory.missing_sections.contains(&Section::Databases));
    }
}
