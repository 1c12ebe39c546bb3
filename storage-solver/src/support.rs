// SPDX-License-Identifier: GPL-3.0-only

//! Model support checker
//!
//! The simplified model only describes a subset of what a configuration can
//! say. The checker lists every place where a resolved configuration goes
//! beyond that subset; an empty list means the model can represent it.

use std::fmt;

use serde::{Deserialize, Serialize};
use storage_types::{Config, Drive, Filesystem, MdRaid, Partition, ProductDefaults, Search};

/// Limitation of the simplified model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Drive or MD RAID with neither a device nor a name to look for
    UnnamedDevice,

    /// Drive or MD RAID encrypted as a whole without being formatted
    EncryptedDevice,

    /// Kept partition that is also encrypted
    EncryptedReusedPartition,

    /// Kept partition with a size the model cannot express
    ReusedPartitionSize,

    /// Thin pool or thin volume
    ThinVolume,

    UnnamedVolumeGroup,

    /// Physical volumes listed one by one instead of generated
    LiteralPhysicalVolumes,

    /// Partition or logical volume that needs a mount path and has none
    MissingMountPath,

    EncryptedLogicalVolume,

    /// Some mounted devices encrypted and others not, outside the product exceptions
    MixedEncryption,
}

impl Rule {
    pub fn description(self) -> &'static str {
        match self {
            Rule::UnnamedDevice => "device without name",
            Rule::EncryptedDevice => "encrypted drive or MD RAID",
            Rule::EncryptedReusedPartition => "encrypted existing partition",
            Rule::ReusedPartitionSize => "unsupported size of an existing partition",
            Rule::ThinVolume => "thin provisioned logical volume",
            Rule::UnnamedVolumeGroup => "volume group without name",
            Rule::LiteralPhysicalVolumes => "explicit physical volumes",
            Rule::MissingMountPath => "missing mount path",
            Rule::EncryptedLogicalVolume => "encrypted logical volume",
            Rule::MixedEncryption => "unencrypted device among encrypted ones",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub rule: Rule,

    /// Offending node, e.g. `drives[0].partitions[2]`
    pub path: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.rule.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SupportReport {
    pub violations: Vec<Violation>,
}

impl SupportReport {
    pub fn is_supported(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violates(&self, rule: Rule) -> bool {
        self.violations.iter().any(|violation| violation.rule == rule)
    }
}

/// Mounted device taking part in the encryption comparison
struct Mounted<'a> {
    path: String,
    mount_path: &'a str,
    encrypted: bool,
}

pub struct ModelSupportChecker<'a> {
    product: &'a ProductDefaults,
}

impl<'a> ModelSupportChecker<'a> {
    pub fn new(product: &'a ProductDefaults) -> Self {
        Self { product }
    }

    pub fn check(&self, config: &Config) -> SupportReport {
        let mut report = Check::default();

        for (index, drive) in config.drives.iter().enumerate() {
            report.drive(drive, &format!("drives[{index}]"));
        }
        for (index, md_raid) in config.md_raids.iter().enumerate() {
            report.md_raid(md_raid, &format!("mdRaids[{index}]"));
        }
        report.volume_groups(config);
        report.mixed_encryption(self.product);

        if !report.violations.is_empty() {
            tracing::debug!(count = report.violations.len(), "Config not supported by the model");
        }
        SupportReport {
            violations: report.violations,
        }
    }
}

#[derive(Default)]
struct Check<'a> {
    violations: Vec<Violation>,
    mounted: Vec<Mounted<'a>>,
}

impl<'a> Check<'a> {
    fn flag(&mut self, rule: Rule, path: impl Into<String>) {
        self.violations.push(Violation {
            rule,
            path: path.into(),
        });
    }

    fn drive(&mut self, drive: &'a Drive, path: &str) {
        if skipped(drive.search.as_ref()) {
            return;
        }
        self.partitionable(
            drive.search.as_ref(),
            drive.encryption.is_some(),
            drive.filesystem.as_ref(),
            path,
        );
        self.partitions(&drive.partitions, path);
    }

    fn md_raid(&mut self, md_raid: &'a MdRaid, path: &str) {
        if skipped(md_raid.search.as_ref()) {
            return;
        }
        self.partitionable(
            md_raid.search.as_ref(),
            md_raid.encryption.is_some(),
            md_raid.filesystem.as_ref(),
            path,
        );
        self.partitions(&md_raid.partitions, path);
    }

    fn partitionable(
        &mut self,
        search: Option<&Search>,
        encrypted: bool,
        filesystem: Option<&'a Filesystem>,
        path: &str,
    ) {
        let bound = search.is_some_and(Search::is_resolved);
        let named = search.and_then(Search::name).is_some();
        if !bound && !named {
            self.flag(Rule::UnnamedDevice, path);
        }

        let formatted = filesystem
            .filter(|fs| !fs.reuse_if_possible)
            .and_then(|fs| fs.path.as_deref());
        match formatted {
            Some(mount_path) => self.mounted.push(Mounted {
                path: path.to_string(),
                mount_path,
                encrypted,
            }),
            None if encrypted => self.flag(Rule::EncryptedDevice, path),
            None => {}
        }
    }

    fn partitions(&mut self, partitions: &'a [Partition], parent: &str) {
        for (index, partition) in partitions.iter().enumerate() {
            let path = format!("{parent}.partitions[{index}]");
            if partition.is_new() {
                self.new_partition(partition, path);
            } else if partition.is_reused() && !partition.is_deleted() {
                self.reused_partition(partition, path);
            }
        }
    }

    fn new_partition(&mut self, partition: &'a Partition, path: String) {
        match partition.mount_path() {
            Some(mount_path) => self.mounted.push(Mounted {
                path,
                mount_path,
                encrypted: partition.encryption.is_some(),
            }),
            None => self.flag(Rule::MissingMountPath, path),
        }
    }

    fn reused_partition(&mut self, partition: &Partition, path: String) {
        if partition.encryption.is_some() {
            self.flag(Rule::EncryptedReusedPartition, path.clone());
        }

        let size = &partition.size;
        if !size.default
            && (size.min.and_then(|min| min.bytes()).is_none() || size.max.is_some_and(|max| max.is_current()))
        {
            self.flag(Rule::ReusedPartitionSize, path.clone());
        }

        // Without a mount path, a kept partition is only there to be shrunk
        let shrinks = partition.filesystem.is_none()
            && partition.encryption.is_none()
            && size.shrinks_to_zero();
        if partition.mount_path().is_none() && !shrinks {
            self.flag(Rule::MissingMountPath, path);
        }
    }

    fn volume_groups(&mut self, config: &'a Config) {
        for (index, vg) in config.volume_groups.iter().enumerate() {
            let path = format!("volumeGroups[{index}]");

            if vg.name.is_none() {
                self.flag(Rule::UnnamedVolumeGroup, path.clone());
            }
            if vg.literal_physical_volumes().next().is_some() {
                self.flag(Rule::LiteralPhysicalVolumes, path.clone());
            }

            let generated = vg.generated_encryption().is_some();
            for (lv_index, lv) in vg.logical_volumes.iter().enumerate() {
                let lv_path = format!("{path}.logicalVolumes[{lv_index}]");

                if lv.is_thin() {
                    self.flag(Rule::ThinVolume, lv_path.clone());
                }
                if lv.encryption.is_some() {
                    self.flag(Rule::EncryptedLogicalVolume, lv_path.clone());
                }
                match lv.mount_path() {
                    Some(mount_path) => self.mounted.push(Mounted {
                        path: lv_path,
                        mount_path,
                        encrypted: generated || lv.encryption.is_some(),
                    }),
                    None => self.flag(Rule::MissingMountPath, lv_path),
                }
            }
        }
    }

    /// Encryption is all or nothing, except for the product's unencrypted paths
    fn mixed_encryption(&mut self, product: &ProductDefaults) {
        if !self.mounted.iter().any(|mounted| mounted.encrypted) {
            return;
        }

        let offending: Vec<String> = self
            .mounted
            .iter()
            .filter(|mounted| !mounted.encrypted && !product.is_unencrypted_path(mounted.mount_path))
            .map(|mounted| mounted.path.clone())
            .collect();

        for path in offending {
            self.flag(Rule::MixedEncryption, path);
        }
    }
}

fn skipped(search: Option<&Search>) -> bool {
    search.is_some_and(Search::skips_device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storage_types::{
        Device, DeviceKind, Encryption, EncryptionMethod, GIB, LogicalVolume, PhysicalVolume,
        Size, SizeValue, VolumeGroup,
    };

    fn disk(name: &str) -> Device {
        Device {
            name: name.to_string(),
            kind: DeviceKind::Disk,
            size: 100 * GIB,
            partition_table: None,
            parent: None,
            number: None,
            filesystem: None,
        }
    }

    fn bound_drive(partitions: Vec<Partition>) -> Drive {
        Drive {
            search: Some(Search::first_device().bound_to(&disk("/dev/vda"))),
            partitions,
            ..Drive::default()
        }
    }

    fn mounted(path: &str, encrypted: bool) -> Partition {
        Partition {
            filesystem: Some(Filesystem::mounted_at(path)),
            encryption: encrypted.then(|| Encryption::with_method(EncryptionMethod::Luks2, None)),
            ..Partition::default()
        }
    }

    fn check(config: &Config) -> SupportReport {
        ModelSupportChecker::new(&ProductDefaults::default()).check(config)
    }

    #[test]
    fn plain_guided_layout_is_supported() {
        let config = Config {
            drives: vec![bound_drive(vec![mounted("/", false), mounted("swap", false)])],
            ..Config::default()
        };

        assert_eq!(check(&config), SupportReport::default());
        assert!(crate::is_model_supported(&config, &ProductDefaults::default()));
    }

    #[test]
    fn encrypting_everything_but_the_exception_path() {
        let config = Config {
            drives: vec![bound_drive(vec![
                mounted("/", true),
                mounted("/home", true),
                mounted("/boot/zipl", false),
            ])],
            ..Config::default()
        };
        assert!(check(&config).is_supported());

        let config = Config {
            drives: vec![bound_drive(vec![
                mounted("/", true),
                mounted("/home", true),
                mounted("/srv", false),
            ])],
            ..Config::default()
        };
        assert_eq!(
            check(&config).violations,
            [Violation {
                rule: Rule::MixedEncryption,
                path: "drives[0].partitions[2]".to_string(),
            }]
        );
    }

    #[test]
    fn unnamed_and_new_devices_are_unsupported() {
        let config = Config {
            drives: vec![
                Drive {
                    search: Some(Search::first_device()),
                    ..Drive::default()
                },
                Drive {
                    search: Some(Search::catch_all()),
                    ..Drive::default()
                },
                Drive {
                    search: Some(Search::by_name("/dev/vdb")),
                    ..Drive::default()
                },
            ],
            md_raids: vec![MdRaid::default()],
            ..Config::default()
        };

        let report = check(&config);
        let paths: Vec<&str> = report.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["drives[0]", "mdRaids[0]"]);
        assert!(report.violations.iter().all(|v| v.rule == Rule::UnnamedDevice));
    }

    #[test]
    fn kept_partitions_must_be_mounted_or_shrunk() {
        let reused = |size: Size| Partition {
            search: Some(Search::by_name("/dev/vda1").bound_to(&disk("/dev/vda1"))),
            size,
            ..Partition::default()
        };

        let config = Config {
            drives: vec![bound_drive(vec![
                reused(Size::range(SizeValue::Bytes(0), SizeValue::Bytes(10 * GIB))),
                Partition {
                    delete: true,
                    ..reused(Size::default())
                },
                reused(Size::default()),
                Partition {
                    encryption: Some(Encryption::RandomSwap),
                    ..reused(Size::resize_if_needed())
                },
            ])],
            ..Config::default()
        };

        let report = check(&config);
        assert_eq!(
            report.violations,
            [
                Violation {
                    rule: Rule::MissingMountPath,
                    path: "drives[0].partitions[2]".to_string(),
                },
                Violation {
                    rule: Rule::EncryptedReusedPartition,
                    path: "drives[0].partitions[3]".to_string(),
                },
                Violation {
                    rule: Rule::ReusedPartitionSize,
                    path: "drives[0].partitions[3]".to_string(),
                },
                Violation {
                    rule: Rule::MissingMountPath,
                    path: "drives[0].partitions[3]".to_string(),
                },
            ]
        );
    }

    #[test]
    fn volume_group_limitations() {
        let config = Config {
            volume_groups: vec![VolumeGroup {
                physical_volumes: vec![PhysicalVolume::Alias("pv0".to_string())],
                logical_volumes: vec![
                    LogicalVolume {
                        pool: true,
                        ..LogicalVolume::default()
                    },
                    LogicalVolume {
                        encryption: Some(Encryption::with_method(EncryptionMethod::Luks1, None)),
                        filesystem: Some(Filesystem::mounted_at("/")),
                        ..LogicalVolume::default()
                    },
                ],
                ..VolumeGroup::default()
            }],
            ..Config::default()
        };

        let report = check(&config);
        for rule in [
            Rule::UnnamedVolumeGroup,
            Rule::LiteralPhysicalVolumes,
            Rule::ThinVolume,
            Rule::MissingMountPath,
            Rule::EncryptedLogicalVolume,
        ] {
            assert!(report.violates(rule), "{rule:?} not reported");
        }
        assert!(!report.violates(Rule::MixedEncryption));
    }

    #[test]
    fn encrypted_partitioned_drive_is_unsupported() {
        let config = Config {
            drives: vec![Drive {
                encryption: Some(Encryption::with_method(EncryptionMethod::Luks2, None)),
                ..bound_drive(Vec::new())
            }],
            ..Config::default()
        };
        assert_eq!(
            check(&config).violations,
            [Violation {
                rule: Rule::EncryptedDevice,
                path: "drives[0]".to_string(),
            }]
        );

        let config = Config {
            drives: vec![Drive {
                encryption: Some(Encryption::with_method(EncryptionMethod::Luks2, None)),
                filesystem: Some(Filesystem::mounted_at("/data")),
                ..bound_drive(Vec::new())
            }],
            ..Config::default()
        };
        assert!(check(&config).is_supported());
    }
}
