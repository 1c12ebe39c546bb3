//! Device inventory snapshot
//!
//! Read-only list of the devices found on the target machine, in probing order.

use serde::{Deserialize, Serialize};

use crate::common::byte_size;
use crate::config::{FilesystemKind, PartitionTableType};
use crate::error::{LoadError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Disk,
    Multipath,
    DmRaid,
    MdRaid,
    Partition,
}

/// One probed device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable device name (e.g., "/dev/vda", "/dev/vda1")
    pub name: String,

    pub kind: DeviceKind,

    /// Size in bytes
    #[serde(with = "byte_size")]
    pub size: u64,

    /// Partition table, if the device is partitioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_table: Option<PartitionTableType>,

    /// Name of the partitioned device (partitions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Partition number (partitions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,

    /// Existing filesystem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemKind>,
}

impl Device {
    /// Devices a drive search can bind to
    pub fn is_drive(&self) -> bool {
        matches!(
            self.kind,
            DeviceKind::Disk | DeviceKind::Multipath | DeviceKind::DmRaid
        )
    }

    pub fn is_md_raid(&self) -> bool {
        self.kind == DeviceKind::MdRaid
    }

    pub fn is_partition_of(&self, parent: &str) -> bool {
        self.kind == DeviceKind::Partition && self.parent.as_deref() == Some(parent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl Inventory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let inventory: Inventory =
            toml::from_str(raw).map_err(|error| LoadError::Parse(error.to_string()))?;
        inventory.validate()?;
        Ok(inventory)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let inventory: Inventory =
            serde_json::from_str(raw).map_err(|error| LoadError::Parse(error.to_string()))?;
        inventory.validate()?;
        Ok(inventory)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, device) in self.devices.iter().enumerate() {
            let field = format!("devices[{index}]");

            if device.name.is_empty() {
                return Err(LoadError::invalid(
                    format!("{field}.name"),
                    "must not be empty",
                ));
            }

            if self.devices[..index].iter().any(|d| d.name == device.name) {
                return Err(LoadError::invalid(
                    format!("{field}.name"),
                    format!("duplicate device '{}'", device.name),
                ));
            }

            if device.kind == DeviceKind::Partition {
                let Some(parent) = device.parent.as_deref() else {
                    return Err(LoadError::invalid(
                        format!("{field}.parent"),
                        "partitions need a parent",
                    ));
                };

                if !self.devices.iter().any(|d| d.name == parent) {
                    return Err(LoadError::invalid(
                        format!("{field}.parent"),
                        format!("unknown parent '{parent}'"),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|device| device.name == name)
    }

    pub fn partitions_of(&self, parent: &str) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|device| device.is_partition_of(parent))
            .collect()
    }
}
