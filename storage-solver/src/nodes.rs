//! Mutable walks over the configuration graph

use storage_types::{Config, Encryption, Filesystem, Partition, PhysicalVolume};

pub(crate) fn partitions_mut(config: &mut Config) -> impl Iterator<Item = &mut Partition> {
    config
        .drives
        .iter_mut()
        .flat_map(|drive| drive.partitions.iter_mut())
        .chain(config.md_raids.iter_mut().flat_map(|md| md.partitions.iter_mut()))
}

pub(crate) fn filesystems_mut(config: &mut Config) -> Vec<&mut Filesystem> {
    let mut filesystems = Vec::new();

    for drive in &mut config.drives {
        filesystems.extend(drive.filesystem.as_mut());
        filesystems.extend(drive.partitions.iter_mut().filter_map(|p| p.filesystem.as_mut()));
    }
    for md_raid in &mut config.md_raids {
        filesystems.extend(md_raid.filesystem.as_mut());
        filesystems.extend(md_raid.partitions.iter_mut().filter_map(|p| p.filesystem.as_mut()));
    }
    for vg in &mut config.volume_groups {
        filesystems.extend(vg.logical_volumes.iter_mut().filter_map(|lv| lv.filesystem.as_mut()));
    }

    filesystems
}

pub(crate) fn encryptions_mut(config: &mut Config) -> Vec<&mut Encryption> {
    let mut encryptions = Vec::new();

    for drive in &mut config.drives {
        encryptions.extend(drive.encryption.as_mut());
        encryptions.extend(drive.partitions.iter_mut().filter_map(|p| p.encryption.as_mut()));
    }
    for md_raid in &mut config.md_raids {
        encryptions.extend(md_raid.encryption.as_mut());
        encryptions.extend(md_raid.partitions.iter_mut().filter_map(|p| p.encryption.as_mut()));
    }
    for vg in &mut config.volume_groups {
        for pv in &mut vg.physical_volumes {
            if let PhysicalVolume::Generate(generate) = pv {
                encryptions.extend(generate.encryption.as_mut());
            }
        }
        encryptions.extend(vg.logical_volumes.iter_mut().filter_map(|lv| lv.encryption.as_mut()));
    }

    encryptions
}
