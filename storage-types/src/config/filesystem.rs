//! Filesystem settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::same_path;

/// Supported filesystem types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemKind {
    Bcachefs,
    Btrfs,
    Exfat,
    Ext2,
    Ext3,
    Ext4,
    Ntfs,
    Swap,
    Vfat,
    Xfs,
}

impl FilesystemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilesystemKind::Bcachefs => "bcachefs",
            FilesystemKind::Btrfs => "btrfs",
            FilesystemKind::Exfat => "exfat",
            FilesystemKind::Ext2 => "ext2",
            FilesystemKind::Ext3 => "ext3",
            FilesystemKind::Ext4 => "ext4",
            FilesystemKind::Ntfs => "ntfs",
            FilesystemKind::Swap => "swap",
            FilesystemKind::Vfat => "vfat",
            FilesystemKind::Xfs => "xfs",
        }
    }
}

impl fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilesystemKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bcachefs" => Ok(FilesystemKind::Bcachefs),
            "btrfs" => Ok(FilesystemKind::Btrfs),
            "exfat" => Ok(FilesystemKind::Exfat),
            "ext2" => Ok(FilesystemKind::Ext2),
            "ext3" => Ok(FilesystemKind::Ext3),
            "ext4" => Ok(FilesystemKind::Ext4),
            "ntfs" => Ok(FilesystemKind::Ntfs),
            "swap" => Ok(FilesystemKind::Swap),
            "vfat" => Ok(FilesystemKind::Vfat),
            "xfs" => Ok(FilesystemKind::Xfs),
            other => Err(format!("unknown filesystem type '{other}'")),
        }
    }
}

/// Btrfs specific options
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BtrfsOptions {
    pub snapshots: Option<bool>,
}

/// Filesystem type, plus whether it was picked from the product template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemType {
    pub default: bool,
    pub kind: FilesystemKind,

    /// Only meaningful for btrfs
    pub btrfs: Option<BtrfsOptions>,
}

impl FilesystemType {
    pub fn new(kind: FilesystemKind) -> Self {
        Self {
            default: false,
            kind,
            btrfs: None,
        }
    }

    pub fn btrfs(snapshots: Option<bool>) -> Self {
        Self {
            default: false,
            kind: FilesystemKind::Btrfs,
            btrfs: Some(BtrfsOptions { snapshots }),
        }
    }

    pub fn snapshots(&self) -> bool {
        self.kind == FilesystemKind::Btrfs
            && self
                .btrfs
                .as_ref()
                .and_then(|btrfs| btrfs.snapshots)
                .unwrap_or(false)
    }

    /// Same filesystem, ignoring where the value came from
    pub fn same_as(&self, other: &FilesystemType) -> bool {
        self.kind == other.kind && self.snapshots() == other.snapshots()
    }
}

/// How a filesystem is referenced in fstab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountBy {
    Device,
    Id,
    Label,
    Path,
    Uuid,
}

impl MountBy {
    pub fn as_str(self) -> &'static str {
        match self {
            MountBy::Device => "device",
            MountBy::Id => "id",
            MountBy::Label => "label",
            MountBy::Path => "path",
            MountBy::Uuid => "uuid",
        }
    }
}

impl FromStr for MountBy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "device" => Ok(MountBy::Device),
            "id" => Ok(MountBy::Id),
            "label" => Ok(MountBy::Label),
            "path" => Ok(MountBy::Path),
            "uuid" => Ok(MountBy::Uuid),
            other => Err(format!("unknown mountBy value '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filesystem {
    /// Keep an existing filesystem instead of formatting
    pub reuse_if_possible: bool,

    /// Type to format with; filled from the volume template when unset
    pub fs_type: Option<FilesystemType>,

    pub label: Option<String>,

    /// Mount point (e.g., "/", "/home", "swap")
    pub path: Option<String>,

    pub mount_by: Option<MountBy>,

    /// Unset and empty are different: an empty list clears the product options
    pub mkfs_options: Option<Vec<String>>,
    pub mount_options: Option<Vec<String>>,
}

impl Filesystem {
    pub fn mounted_at(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn is_mounted_at(&self, path: &str) -> bool {
        self.path.as_deref().is_some_and(|own| same_path(own, path))
    }

    pub fn snapshots(&self) -> bool {
        self.fs_type.as_ref().is_some_and(FilesystemType::snapshots)
    }
}
