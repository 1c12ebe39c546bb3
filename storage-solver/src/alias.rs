//! Alias definitions and references

use storage_contracts::SolveError;
use storage_types::{AliasOwner, Config};

/// Every alias must be defined once at most
pub(crate) fn check_definitions(config: &Config) -> Result<(), SolveError> {
    let aliases = config.aliases();

    for (index, (alias, _)) in aliases.iter().enumerate() {
        if aliases[..index].iter().any(|(other, _)| other == alias) {
            return Err(SolveError::ambiguous_alias(*alias, "defined more than once"));
        }
    }

    Ok(())
}

/// Every referenced alias must name a device with the expected role
pub(crate) fn check_references(config: &Config) -> Result<(), SolveError> {
    for (index, vg) in config.volume_groups.iter().enumerate() {
        for target in vg.target_devices() {
            let owners = config.alias_owners(target);
            if owners.is_empty() {
                return Err(SolveError::ambiguous_alias(
                    target,
                    format!("volumeGroups[{index}] generates physical volumes on a missing device"),
                ));
            }
            if owners
                .iter()
                .any(|owner| !matches!(owner, AliasOwner::Drive(_) | AliasOwner::MdRaid(_)))
            {
                return Err(SolveError::ambiguous_alias(
                    target,
                    format!("volumeGroups[{index}] can only generate physical volumes on drives or MD RAIDs"),
                ));
            }
            if owners.iter().any(|owner| config.is_formatted(*owner)) {
                return Err(SolveError::ambiguous_alias(
                    target,
                    format!("volumeGroups[{index}] targets a formatted device"),
                ));
            }
        }

        for pv in vg.literal_physical_volumes() {
            if config.alias_owners(pv).is_empty() {
                return Err(SolveError::ambiguous_alias(
                    pv,
                    format!("volumeGroups[{index}] uses a missing physical volume"),
                ));
            }
        }
    }

    for (index, md_raid) in config.md_raids.iter().enumerate() {
        for member in &md_raid.devices {
            if config.alias_owners(member).is_empty() {
                return Err(SolveError::ambiguous_alias(
                    member.as_str(),
                    format!("mdRaids[{index}] uses a missing member device"),
                ));
            }
        }
    }

    let boot = &config.boot;
    if boot.configure
        && !boot.device.default
        && let Some(alias) = &boot.device.device_alias
        && config.alias_owners(alias).is_empty()
    {
        return Err(SolveError::ambiguous_alias(
            alias.as_str(),
            "the boot device does not exist",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_types::{
        Boot, Drive, Filesystem, MdRaid, Partition, PhysicalVolume, PhysicalVolumesGenerate,
        VolumeGroup,
    };

    fn drive(alias: &str) -> Drive {
        Drive {
            alias: Some(alias.to_string()),
            ..Drive::default()
        }
    }

    fn targeting(alias: &str) -> VolumeGroup {
        VolumeGroup {
            physical_volumes: vec![PhysicalVolume::Generate(PhysicalVolumesGenerate {
                target_devices: vec![alias.to_string()],
                encryption: None,
            })],
            ..VolumeGroup::default()
        }
    }

    fn reason(error: SolveError) -> String {
        match error {
            SolveError::AmbiguousAlias { reason, .. } => reason,
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn duplicated_alias_is_rejected() {
        let config = Config {
            drives: vec![
                drive("disk"),
                Drive {
                    partitions: vec![Partition {
                        alias: Some("disk".to_string()),
                        ..Partition::default()
                    }],
                    ..Drive::default()
                },
            ],
            ..Config::default()
        };

        assert_eq!(
            check_definitions(&config),
            Err(SolveError::ambiguous_alias("disk", "defined more than once"))
        );
    }

    #[test]
    fn generate_targets_must_be_unformatted_drives() {
        let mut config = Config {
            drives: vec![drive("disk")],
            volume_groups: vec![targeting("disk")],
            ..Config::default()
        };
        assert_eq!(check_references(&config), Ok(()));

        config.volume_groups = vec![targeting("nowhere")];
        assert!(reason(check_references(&config).unwrap_err()).contains("missing device"));

        config.volume_groups = vec![targeting("disk")];
        config.drives[0].filesystem = Some(Filesystem::mounted_at("/data"));
        assert!(reason(check_references(&config).unwrap_err()).contains("formatted"));
    }

    #[test]
    fn partitions_are_not_generate_targets() {
        let config = Config {
            drives: vec![Drive {
                partitions: vec![Partition {
                    alias: Some("p1".to_string()),
                    ..Partition::default()
                }],
                ..Drive::default()
            }],
            volume_groups: vec![targeting("p1")],
            ..Config::default()
        };

        assert!(reason(check_references(&config).unwrap_err()).contains("drives or MD RAIDs"));
    }

    #[test]
    fn dangling_members_and_boot_device_are_rejected() {
        let config = Config {
            md_raids: vec![MdRaid {
                devices: vec!["gone".to_string()],
                ..MdRaid::default()
            }],
            ..Config::default()
        };
        assert!(reason(check_references(&config).unwrap_err()).contains("member"));

        let config = Config {
            boot: Boot::on_alias("gone"),
            ..Config::default()
        };
        assert_eq!(
            check_references(&config),
            Err(SolveError::ambiguous_alias("gone", "the boot device does not exist"))
        );
    }
}
