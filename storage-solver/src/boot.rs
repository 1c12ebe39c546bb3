//! Default boot device
//!
//! The boot loader goes to the partitioned drive holding root. With root on
//! an MD RAID or a volume group, the first partitioned drive among its
//! members is used. The chosen drive gets an alias if it has none.

use storage_types::Config;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Drive(usize),
    MdRaid(usize),
    VolumeGroup(usize),
}

pub(crate) fn solve(config: &mut Config) {
    if !config.boot.configure || !config.boot.device.default {
        return;
    }

    let Some(index) = BootFinder::new(config).boot_drive() else {
        debug!("No partitioned drive found for booting");
        return;
    };

    let alias = match &config.drives[index].alias {
        Some(alias) => alias.clone(),
        None => {
            let alias = config.unused_alias("boot");
            config.drives[index].alias = Some(alias.clone());
            alias
        }
    };

    debug!(alias = %alias, "Default boot device");
    config.boot.device.device_alias = Some(alias);
}

struct BootFinder<'a> {
    config: &'a Config,

    /// Nodes already entered, so that cyclic references end
    visited: Vec<Node>,
}

impl<'a> BootFinder<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            visited: Vec::new(),
        }
    }

    fn boot_drive(&mut self) -> Option<usize> {
        let config = self.config;
        let root = config
            .root_drive()
            .map(Node::Drive)
            .or_else(|| config.root_md_raid().map(Node::MdRaid))
            .or_else(|| config.root_volume_group().map(Node::VolumeGroup))?;

        self.partitioned_drive(root, false)
    }

    /// A drive used as generate target counts even without partitions yet
    fn partitioned_drive(&mut self, node: Node, is_target: bool) -> Option<usize> {
        if self.visited.contains(&node) {
            return None;
        }
        self.visited.push(node);

        let config = self.config;
        match node {
            Node::Drive(index) => {
                (is_target || !config.drives[index].partitions.is_empty()).then_some(index)
            }
            Node::MdRaid(index) => {
                let members: Vec<&str> =
                    config.md_raids[index].devices.iter().map(String::as_str).collect();
                self.first_partitioned(&members, false)
            }
            Node::VolumeGroup(index) => {
                let vg = &config.volume_groups[index];
                let targets: Vec<&str> = vg.target_devices().collect();
                let pvs: Vec<&str> = vg.literal_physical_volumes().collect();

                self.first_partitioned(&targets, true)
                    .or_else(|| self.first_partitioned(&pvs, false))
            }
        }
    }

    fn first_partitioned(&mut self, aliases: &[&str], is_target: bool) -> Option<usize> {
        let nodes: Vec<Node> = aliases
            .iter()
            .filter_map(|alias| self.find(alias, is_target))
            .collect();

        nodes
            .into_iter()
            .find_map(|node| self.partitioned_drive(node, is_target))
    }

    /// Node defining the alias, or holding the partition or volume defining it
    fn find(&self, alias: &str, is_target: bool) -> Option<Node> {
        let config = self.config;
        let has_alias = |own: &Option<String>| own.as_deref() == Some(alias);

        let drive = is_target
            .then(|| config.drive_with_alias(alias))
            .flatten()
            .or_else(|| {
                config
                    .drives
                    .iter()
                    .position(|drive| drive.partitions.iter().any(|p| has_alias(&p.alias)))
            });
        if let Some(index) = drive {
            return Some(Node::Drive(index));
        }

        let md_raid = config.md_raids.iter().position(|md| {
            has_alias(&md.alias) || md.partitions.iter().any(|p| has_alias(&p.alias))
        });
        if let Some(index) = md_raid {
            return Some(Node::MdRaid(index));
        }

        config
            .volume_groups
            .iter()
            .position(|vg| vg.logical_volumes.iter().any(|lv| has_alias(&lv.alias)))
            .map(Node::VolumeGroup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storage_types::{
        Boot, Drive, Filesystem, LogicalVolume, MdRaid, Partition, PhysicalVolume,
        PhysicalVolumesGenerate, VolumeGroup,
    };

    fn root() -> Partition {
        Partition {
            filesystem: Some(Filesystem::mounted_at("/")),
            ..Partition::default()
        }
    }

    fn member(alias: &str) -> Partition {
        Partition {
            alias: Some(alias.to_string()),
            ..Partition::default()
        }
    }

    #[test]
    fn root_drive_gets_a_generated_alias() {
        let mut config = Config {
            drives: vec![
                Drive::default(),
                Drive {
                    partitions: vec![root()],
                    ..Drive::default()
                },
            ],
            ..Config::default()
        };

        solve(&mut config);

        assert_eq!(config.drives[1].alias.as_deref(), Some("boot0"));
        assert_eq!(config.boot.device.device_alias.as_deref(), Some("boot0"));
    }

    #[test]
    fn root_on_raid_boots_from_first_member_drive() {
        let mut config = Config {
            drives: vec![
                Drive {
                    alias: Some("first".to_string()),
                    partitions: vec![member("m1")],
                    ..Drive::default()
                },
                Drive {
                    partitions: vec![member("m2")],
                    ..Drive::default()
                },
            ],
            md_raids: vec![MdRaid {
                devices: vec!["m2".to_string(), "m1".to_string()],
                partitions: vec![root()],
                ..MdRaid::default()
            }],
            ..Config::default()
        };

        solve(&mut config);
        assert_eq!(config.drives[1].alias.as_deref(), Some("boot0"));
        assert_eq!(config.boot.device.device_alias.as_deref(), Some("boot0"));
    }

    #[test]
    fn root_on_lvm_boots_from_target_drive() {
        let mut config = Config {
            drives: vec![Drive {
                alias: Some("disk".to_string()),
                ..Drive::default()
            }],
            volume_groups: vec![VolumeGroup {
                physical_volumes: vec![PhysicalVolume::Generate(PhysicalVolumesGenerate {
                    target_devices: vec!["disk".to_string()],
                    encryption: None,
                })],
                logical_volumes: vec![LogicalVolume {
                    filesystem: Some(Filesystem::mounted_at("/")),
                    ..LogicalVolume::default()
                }],
                ..VolumeGroup::default()
            }],
            ..Config::default()
        };

        solve(&mut config);
        assert_eq!(config.boot.device.device_alias.as_deref(), Some("disk"));
    }

    #[test]
    fn explicit_or_disabled_boot_is_left_alone() {
        let mut config = Config {
            boot: Boot::on_alias("other"),
            drives: vec![Drive {
                partitions: vec![root()],
                ..Drive::default()
            }],
            ..Config::default()
        };
        solve(&mut config);
        assert_eq!(config.boot, Boot::on_alias("other"));
        assert_eq!(config.drives[0].alias, None);

        config.boot = Boot::disabled();
        solve(&mut config);
        assert_eq!(config.boot.device.device_alias, None);
    }

    #[test]
    fn cyclic_references_end() {
        let mut config = Config {
            volume_groups: vec![VolumeGroup {
                physical_volumes: vec![PhysicalVolume::Alias("lv".to_string())],
                logical_volumes: vec![LogicalVolume {
                    alias: Some("lv".to_string()),
                    filesystem: Some(Filesystem::mounted_at("/")),
                    ..LogicalVolume::default()
                }],
                ..VolumeGroup::default()
            }],
            ..Config::default()
        };

        solve(&mut config);
        assert_eq!(config.boot.device.device_alias, None);
    }
}
