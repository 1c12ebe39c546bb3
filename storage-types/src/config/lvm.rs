//! LVM (Logical Volume Manager) types
//!
//! Volume groups to create and the logical volumes they hold.

use super::{Encryption, Filesystem, Size};

/// Physical volumes generated on the given devices
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhysicalVolumesGenerate {
    /// Aliases of the drives or MD RAIDs to create the physical volumes on
    pub target_devices: Vec<String>,

    /// Encryption of the generated physical volumes
    pub encryption: Option<Encryption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalVolume {
    /// Alias of a device used as physical volume as is
    Alias(String),

    Generate(PhysicalVolumesGenerate),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeGroup {
    pub name: Option<String>,
    pub extent_size: Option<u64>,
    pub physical_volumes: Vec<PhysicalVolume>,
    pub logical_volumes: Vec<LogicalVolume>,
}

impl VolumeGroup {
    /// Aliases of all the devices to generate physical volumes on
    pub fn target_devices(&self) -> impl Iterator<Item = &str> {
        self.physical_volumes.iter().flat_map(|pv| match pv {
            PhysicalVolume::Generate(generate) => generate
                .target_devices
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
            PhysicalVolume::Alias(_) => Vec::new(),
        })
    }

    /// Aliases of devices used directly as physical volumes
    pub fn literal_physical_volumes(&self) -> impl Iterator<Item = &str> {
        self.physical_volumes.iter().filter_map(|pv| match pv {
            PhysicalVolume::Alias(alias) => Some(alias.as_str()),
            PhysicalVolume::Generate(_) => None,
        })
    }

    /// Encryption of the first generated physical volumes that have one
    pub fn generated_encryption(&self) -> Option<&Encryption> {
        self.physical_volumes.iter().find_map(|pv| match pv {
            PhysicalVolume::Generate(generate) => generate.encryption.as_ref(),
            PhysicalVolume::Alias(_) => None,
        })
    }

    pub fn is_mounted_at(&self, path: &str) -> bool {
        self.logical_volumes.iter().any(|lv| {
            lv.filesystem
                .as_ref()
                .is_some_and(|fs| fs.is_mounted_at(path))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogicalVolume {
    pub name: Option<String>,

    /// The volume is a thin pool
    pub pool: bool,

    /// Alias of the thin pool this volume is allocated from
    pub used_pool: Option<String>,
    pub stripes: Option<u32>,
    pub stripe_size: Option<u64>,
    pub alias: Option<String>,
    pub size: Size,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
}

impl LogicalVolume {
    pub fn is_thin(&self) -> bool {
        self.pool || self.used_pool.is_some()
    }

    pub fn mount_path(&self) -> Option<&str> {
        self.filesystem.as_ref().and_then(|fs| fs.path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_group() -> VolumeGroup {
        VolumeGroup {
            name: Some("system".to_string()),
            physical_volumes: vec![
                PhysicalVolume::Alias("pv1".to_string()),
                PhysicalVolume::Generate(PhysicalVolumesGenerate {
                    target_devices: vec!["disk1".to_string(), "disk2".to_string()],
                    encryption: Some(Encryption::ProtectedSwap),
                }),
            ],
            logical_volumes: vec![LogicalVolume {
                filesystem: Some(Filesystem::mounted_at("/")),
                ..LogicalVolume::default()
            }],
            ..VolumeGroup::default()
        }
    }

    #[test]
    fn splits_physical_volume_kinds() {
        let vg = volume_group();
        assert_eq!(vg.target_devices().collect::<Vec<_>>(), ["disk1", "disk2"]);
        assert_eq!(vg.literal_physical_volumes().collect::<Vec<_>>(), ["pv1"]);
        assert_eq!(vg.generated_encryption(), Some(&Encryption::ProtectedSwap));
        assert!(vg.is_mounted_at("/"));
    }

    #[test]
    fn thin_volumes() {
        let pool = LogicalVolume {
            pool: true,
            ..LogicalVolume::default()
        };
        let thin = LogicalVolume {
            used_pool: Some("pool".to_string()),
            ..LogicalVolume::default()
        };
        assert!(pool.is_thin());
        assert!(thin.is_thin());
        assert!(!LogicalVolume::default().is_thin());
    }
}
