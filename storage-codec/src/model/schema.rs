//! Serde types of the simplified model document
//!
//! Field names are camelCase on the wire. Unknown keys are rejected.

use serde::{Deserialize, Serialize};
use storage_types::{EncryptionMethod, FilesystemKind, PartitionId, PartitionTableType, SpacePolicy};

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub boot: ModelBoot,

    /// Encryption applied to every new device that can hold it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<ModelEncryption>,

    #[serde(default)]
    pub drives: Vec<ModelDrive>,

    #[serde(default)]
    pub md_raids: Vec<ModelMdRaid>,

    #[serde(default)]
    pub volume_groups: Vec<ModelVolumeGroup>,
}

impl ModelConfig {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_json(doc: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(doc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelBoot {
    #[serde(default = "yes")]
    pub configure: bool,

    #[serde(default)]
    pub device: ModelBootDevice,
}

impl Default for ModelBoot {
    fn default() -> Self {
        Self {
            configure: true,
            device: ModelBootDevice::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelBootDevice {
    #[serde(default = "yes")]
    pub default: bool,

    /// Device name of the boot drive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for ModelBootDevice {
    fn default() -> Self {
        Self {
            default: true,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelEncryption {
    pub method: EncryptionMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A drive, or an MD RAID (same shape)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelDrive {
    /// Device name; a drive without name takes the first free disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Set when the whole device is formatted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<ModelFilesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_policy: Option<SpacePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptable_type: Option<PartitionTableType>,

    #[serde(default)]
    pub partitions: Vec<ModelPartition>,
}

pub type ModelMdRaid = ModelDrive;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelPartition {
    /// Device name of an existing partition; none for a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PartitionId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<ModelFilesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ModelSize>,

    #[serde(default)]
    pub delete: bool,

    #[serde(default)]
    pub delete_if_needed: bool,

    /// Existing partition set to a fixed size
    #[serde(default)]
    pub resize: bool,

    /// Existing partition that may shrink to make room
    #[serde(default)]
    pub resize_if_needed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelFilesystem {
    #[serde(default)]
    pub reuse: bool,

    /// The type is the one proposed by the product for the mount path
    #[serde(default)]
    pub default: bool,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<FilesystemKind>,

    /// Btrfs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Sizes in bytes; no max means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSize {
    pub default: bool,
    pub min: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelVolumeGroup {
    pub vg_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent_size: Option<u64>,

    /// Names of the drives to create physical volumes on
    #[serde(default)]
    pub target_devices: Vec<String>,

    #[serde(default)]
    pub logical_volumes: Vec<ModelLogicalVolume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelLogicalVolume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lv_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<ModelFilesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ModelSize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_size: Option<u64>,
}
