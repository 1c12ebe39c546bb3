//! Drives, MD RAIDs and their partitions

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Encryption, Filesystem, Search, Size};

/// Partition table type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionTableType {
    Gpt,
    Msdos,
    Dasd,
}

impl PartitionTableType {
    pub fn as_str(self) -> &'static str {
        match self {
            PartitionTableType::Gpt => "gpt",
            PartitionTableType::Msdos => "msdos",
            PartitionTableType::Dasd => "dasd",
        }
    }
}

impl FromStr for PartitionTableType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gpt" => Ok(PartitionTableType::Gpt),
            "msdos" => Ok(PartitionTableType::Msdos),
            "dasd" => Ok(PartitionTableType::Dasd),
            other => Err(format!("unknown partition table type '{other}'")),
        }
    }
}

/// Partition id (type code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionId {
    Linux,
    Swap,
    Lvm,
    Raid,
    Esp,
    BiosBoot,
    Prep,
    WindowsBasicData,
}

impl PartitionId {
    pub fn as_str(self) -> &'static str {
        match self {
            PartitionId::Linux => "linux",
            PartitionId::Swap => "swap",
            PartitionId::Lvm => "lvm",
            PartitionId::Raid => "raid",
            PartitionId::Esp => "esp",
            PartitionId::BiosBoot => "bios_boot",
            PartitionId::Prep => "prep",
            PartitionId::WindowsBasicData => "windows_basic_data",
        }
    }
}

impl FromStr for PartitionId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "linux" => Ok(PartitionId::Linux),
            "swap" => Ok(PartitionId::Swap),
            "lvm" => Ok(PartitionId::Lvm),
            "raid" => Ok(PartitionId::Raid),
            "esp" => Ok(PartitionId::Esp),
            "bios_boot" => Ok(PartitionId::BiosBoot),
            "prep" => Ok(PartitionId::Prep),
            "windows_basic_data" => Ok(PartitionId::WindowsBasicData),
            other => Err(format!("unknown partition id '{other}'")),
        }
    }
}

/// MD RAID level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdLevel {
    Raid0,
    Raid1,
    Raid4,
    Raid5,
    Raid6,
    Raid10,
}

impl MdLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            MdLevel::Raid0 => "raid0",
            MdLevel::Raid1 => "raid1",
            MdLevel::Raid4 => "raid4",
            MdLevel::Raid5 => "raid5",
            MdLevel::Raid6 => "raid6",
            MdLevel::Raid10 => "raid10",
        }
    }
}

impl FromStr for MdLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "raid0" => Ok(MdLevel::Raid0),
            "raid1" => Ok(MdLevel::Raid1),
            "raid4" => Ok(MdLevel::Raid4),
            "raid5" => Ok(MdLevel::Raid5),
            "raid6" => Ok(MdLevel::Raid6),
            "raid10" => Ok(MdLevel::Raid10),
            other => Err(format!("unknown MD RAID level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    /// No search means a new partition
    pub search: Option<Search>,
    pub alias: Option<String>,
    pub id: Option<PartitionId>,
    pub size: Size,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
    pub delete: bool,
    pub delete_if_needed: bool,
}

impl Partition {
    /// The partition will be created
    pub fn is_new(&self) -> bool {
        self.search.as_ref().is_none_or(Search::creates_device)
    }

    /// The partition is bound to an existing device
    pub fn is_reused(&self) -> bool {
        self.device_name().is_some()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.search.as_ref().and_then(Search::device_name)
    }

    pub fn mount_path(&self) -> Option<&str> {
        self.filesystem.as_ref().and_then(|fs| fs.path.as_deref())
    }

    pub fn is_catch_all(&self) -> bool {
        self.search.as_ref().is_some_and(Search::is_catch_all)
    }

    /// Marked for removal, unconditionally or on demand
    pub fn is_deleted(&self) -> bool {
        self.delete || self.delete_if_needed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Drive {
    /// No search means the first free disk
    pub search: Option<Search>,
    pub alias: Option<String>,
    pub encryption: Option<Encryption>,

    /// Set when the whole drive is formatted instead of partitioned
    pub filesystem: Option<Filesystem>,
    pub ptable_type: Option<PartitionTableType>,
    pub partitions: Vec<Partition>,
}

impl Drive {
    pub fn device_name(&self) -> Option<&str> {
        self.search.as_ref().and_then(Search::device_name)
    }

    /// Name given by the search condition, if any
    pub fn search_name(&self) -> Option<&str> {
        self.search.as_ref().and_then(Search::name)
    }

    pub fn is_reused(&self) -> bool {
        self.device_name().is_some()
    }

    pub fn mount_path(&self) -> Option<&str> {
        self.filesystem.as_ref().and_then(|fs| fs.path.as_deref())
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias.as_deref() == Some(alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MdRaid {
    /// No search means a new MD RAID
    pub search: Option<Search>,
    pub alias: Option<String>,

    /// Name of the new array (e.g., "system")
    pub name: Option<String>,
    pub level: Option<MdLevel>,
    pub chunk_size: Option<u64>,

    /// Aliases of the member devices
    pub devices: Vec<String>,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
    pub ptable_type: Option<PartitionTableType>,
    pub partitions: Vec<Partition>,
    pub delete: bool,
    pub delete_if_needed: bool,
}

impl MdRaid {
    pub fn is_new(&self) -> bool {
        self.search.as_ref().is_none_or(Search::creates_device)
    }

    pub fn device_name(&self) -> Option<&str> {
        self.search.as_ref().and_then(Search::device_name)
    }

    pub fn search_name(&self) -> Option<&str> {
        self.search.as_ref().and_then(Search::name)
    }

    pub fn is_reused(&self) -> bool {
        self.device_name().is_some()
    }

    pub fn mount_path(&self) -> Option<&str> {
        self.filesystem.as_ref().and_then(|fs| fs.path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_without_search_is_new() {
        let partition = Partition::default();
        assert!(partition.is_new());
        assert!(!partition.is_reused());
        assert!(!partition.is_catch_all());
    }

    #[test]
    fn partition_with_unresolved_name_is_neither_new_nor_reused() {
        let partition = Partition {
            search: Some(Search::by_name("/dev/vda1")),
            ..Partition::default()
        };
        assert!(!partition.is_new());
        assert!(!partition.is_reused());
    }

    #[test]
    fn parses_partition_ids_and_levels() {
        assert_eq!("bios_boot".parse::<PartitionId>(), Ok(PartitionId::BiosBoot));
        assert_eq!(PartitionId::Esp.as_str(), "esp");
        assert_eq!("raid10".parse::<MdLevel>(), Ok(MdLevel::Raid10));
        assert!("gpt2".parse::<PartitionTableType>().is_err());
    }
}
