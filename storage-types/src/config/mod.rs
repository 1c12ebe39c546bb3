// SPDX-License-Identifier: GPL-3.0-only

//! Storage configuration graph
//!
//! The in-memory form shared by both codecs and the solver. A configuration
//! is built fresh for every conversion or solve request; device identity is
//! always a name, never a reference into an inventory.

pub mod boot;
pub mod drive;
pub mod encryption;
pub mod filesystem;
pub mod lvm;
pub mod search;
pub mod size;

pub use boot::{Boot, BootDevice};
pub use drive::{Drive, MdLevel, MdRaid, Partition, PartitionId, PartitionTableType};
pub use encryption::{Encryption, EncryptionMethod, Luks1, Luks2, PbkdFunction};
pub use filesystem::{BtrfsOptions, Filesystem, FilesystemKind, FilesystemType, MountBy};
pub use lvm::{LogicalVolume, PhysicalVolume, PhysicalVolumesGenerate, VolumeGroup};
pub use search::{DeviceRef, IfNotFound, Search, SearchCondition, SizeOperator};
pub use size::{Size, SizeValue};

/// Node of the configuration that defines an alias
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasOwner {
    Drive(usize),
    DrivePartition(usize, usize),
    MdRaid(usize),
    MdRaidPartition(usize, usize),
    LogicalVolume(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub boot: Boot,
    pub drives: Vec<Drive>,
    pub md_raids: Vec<MdRaid>,
    pub volume_groups: Vec<VolumeGroup>,
}

impl Config {
    /// Partitions of all drives and MD RAIDs, in document order
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.drives
            .iter()
            .flat_map(|drive| drive.partitions.iter())
            .chain(self.md_raids.iter().flat_map(|md| md.partitions.iter()))
    }

    pub fn logical_volumes(&self) -> impl Iterator<Item = &LogicalVolume> {
        self.volume_groups
            .iter()
            .flat_map(|vg| vg.logical_volumes.iter())
    }

    /// Every filesystem of the configuration, in document order
    pub fn filesystems(&self) -> impl Iterator<Item = &Filesystem> {
        self.drives
            .iter()
            .filter_map(|drive| drive.filesystem.as_ref())
            .chain(self.md_raids.iter().filter_map(|md| md.filesystem.as_ref()))
            .chain(self.partitions().filter_map(|p| p.filesystem.as_ref()))
            .chain(self.logical_volumes().filter_map(|lv| lv.filesystem.as_ref()))
    }

    /// Mount paths of every filesystem, in document order
    pub fn mount_paths(&self) -> Vec<String> {
        self.filesystems()
            .filter_map(|fs| fs.path.clone())
            .collect()
    }

    /// All alias definitions, in document order
    pub fn aliases(&self) -> Vec<(&str, AliasOwner)> {
        let mut aliases = Vec::new();

        for (index, drive) in self.drives.iter().enumerate() {
            if let Some(alias) = &drive.alias {
                aliases.push((alias.as_str(), AliasOwner::Drive(index)));
            }
            for (p_index, partition) in drive.partitions.iter().enumerate() {
                if let Some(alias) = &partition.alias {
                    aliases.push((alias.as_str(), AliasOwner::DrivePartition(index, p_index)));
                }
            }
        }

        for (index, md_raid) in self.md_raids.iter().enumerate() {
            if let Some(alias) = &md_raid.alias {
                aliases.push((alias.as_str(), AliasOwner::MdRaid(index)));
            }
            for (p_index, partition) in md_raid.partitions.iter().enumerate() {
                if let Some(alias) = &partition.alias {
                    aliases.push((alias.as_str(), AliasOwner::MdRaidPartition(index, p_index)));
                }
            }
        }

        for (index, vg) in self.volume_groups.iter().enumerate() {
            for (lv_index, lv) in vg.logical_volumes.iter().enumerate() {
                if let Some(alias) = &lv.alias {
                    aliases.push((alias.as_str(), AliasOwner::LogicalVolume(index, lv_index)));
                }
            }
        }

        aliases
    }

    pub fn alias_owners(&self, alias: &str) -> Vec<AliasOwner> {
        self.aliases()
            .into_iter()
            .filter(|(name, _)| *name == alias)
            .map(|(_, owner)| owner)
            .collect()
    }

    /// Whether the node defining the alias is formatted directly
    pub fn is_formatted(&self, owner: AliasOwner) -> bool {
        match owner {
            AliasOwner::Drive(d) => self.drives[d].filesystem.is_some(),
            AliasOwner::DrivePartition(d, p) => self.drives[d].partitions[p].filesystem.is_some(),
            AliasOwner::MdRaid(m) => self.md_raids[m].filesystem.is_some(),
            AliasOwner::MdRaidPartition(m, p) => {
                self.md_raids[m].partitions[p].filesystem.is_some()
            }
            AliasOwner::LogicalVolume(v, l) => {
                self.volume_groups[v].logical_volumes[l].filesystem.is_some()
            }
        }
    }

    /// Index of the drive holding root, either formatted or in a partition
    pub fn root_drive(&self) -> Option<usize> {
        self.drives.iter().position(|drive| {
            drive.filesystem.as_ref().is_some_and(|fs| fs.is_mounted_at("/"))
                || drive.partitions.iter().any(|p| {
                    p.filesystem.as_ref().is_some_and(|fs| fs.is_mounted_at("/"))
                })
        })
    }

    pub fn root_md_raid(&self) -> Option<usize> {
        self.md_raids.iter().position(|md| {
            md.filesystem.as_ref().is_some_and(|fs| fs.is_mounted_at("/"))
                || md.partitions.iter().any(|p| {
                    p.filesystem.as_ref().is_some_and(|fs| fs.is_mounted_at("/"))
                })
        })
    }

    pub fn root_volume_group(&self) -> Option<usize> {
        self.volume_groups.iter().position(|vg| vg.is_mounted_at("/"))
    }

    pub fn drive_with_alias(&self, alias: &str) -> Option<usize> {
        self.drives.iter().position(|drive| drive.has_alias(alias))
    }

    /// Generate an alias not used anywhere in the configuration
    pub fn unused_alias(&self, prefix: &str) -> String {
        let taken: Vec<&str> = self.aliases().into_iter().map(|(alias, _)| alias).collect();
        let mut counter = 0;
        loop {
            let candidate = format!("{prefix}{counter}");
            if !taken.contains(&candidate.as_str()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
