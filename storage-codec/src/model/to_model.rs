// SPDX-License-Identifier: GPL-3.0-only

use storage_contracts::DeviceInventory;
use storage_types::{
    AliasOwner, Config, Drive, Encryption, Filesystem, LogicalVolume, MdRaid, Partition,
    ProductDefaults, Search, Size, SizeValue, SpacePolicy, VolumeGroup,
};

use super::schema::{
    ModelBoot, ModelBootDevice, ModelConfig, ModelDrive, ModelEncryption, ModelFilesystem,
    ModelLogicalVolume, ModelPartition, ModelSize, ModelVolumeGroup,
};

/// Describe a (usually solved) configuration with the simplified model
///
/// The inventory provides the sizes of the reused devices. Only what the
/// model can express is kept; check the configuration with the support
/// checker first to know whether anything is lost.
pub fn to_model(
    config: &Config,
    product: &ProductDefaults,
    inventory: &dyn DeviceInventory,
) -> ModelConfig {
    let converter = Converter {
        config,
        product,
        inventory,
    };

    ModelConfig {
        boot: converter.boot(),
        encryption: converter.encryption(),
        drives: config
            .drives
            .iter()
            .filter(|d| !skipped(d.search.as_ref()))
            .map(|d| converter.drive(d))
            .collect(),
        md_raids: config
            .md_raids
            .iter()
            .filter(|m| !skipped(m.search.as_ref()))
            .map(|m| converter.md_raid(m))
            .collect(),
        volume_groups: config
            .volume_groups
            .iter()
            .map(|vg| converter.volume_group(vg))
            .collect(),
    }
}

fn skipped(search: Option<&Search>) -> bool {
    search.is_some_and(Search::skips_device)
}

/// Device name as the model shows it: the bound device, or the searched
/// name unless the device is going to be created
fn model_name(search: Option<&Search>) -> Option<String> {
    let search = search?;
    if let Some(device) = search.device_name() {
        return Some(device.to_string());
    }
    if search.creates_device() {
        return None;
    }
    search.name().map(str::to_string)
}

/// Space policy that produces the given partitions
///
/// Detection order is delete, resize, custom; anything else is keep.
pub fn space_policy(formatted: bool, partitions: &[Partition]) -> SpacePolicy {
    if formatted {
        return SpacePolicy::Delete;
    }

    let catch_all: Vec<&Partition> = partitions.iter().filter(|p| p.is_catch_all()).collect();
    if !catch_all.is_empty() {
        if catch_all.iter().all(|p| p.delete) {
            return SpacePolicy::Delete;
        }
        if catch_all
            .iter()
            .all(|p| !p.is_deleted() && p.size.shrinks_to_zero())
        {
            return SpacePolicy::Resize;
        }
        return SpacePolicy::Custom;
    }

    if partitions.iter().any(is_space_action) {
        return SpacePolicy::Custom;
    }

    SpacePolicy::Keep
}

/// Existing partition only listed to free or keep space
fn is_space_action(partition: &Partition) -> bool {
    partition.search.is_some() && partition.filesystem.is_none()
}

fn model_size(size: &Size) -> ModelSize {
    ModelSize {
        default: size.default,
        min: size.min.and_then(SizeValue::bytes).unwrap_or(0),
        max: size.max.and_then(SizeValue::bytes),
    }
}

fn model_encryption(encryption: &Encryption) -> ModelEncryption {
    ModelEncryption {
        method: encryption.method(),
        password: encryption.password().map(str::to_string),
    }
}

struct Converter<'a> {
    config: &'a Config,
    product: &'a ProductDefaults,
    inventory: &'a dyn DeviceInventory,
}

impl Converter<'_> {
    fn boot(&self) -> ModelBoot {
        let boot = &self.config.boot;
        ModelBoot {
            configure: boot.configure,
            device: ModelBootDevice {
                default: boot.device.default,
                name: boot
                    .device
                    .device_alias
                    .as_deref()
                    .and_then(|alias| self.alias_device_name(alias)),
            },
        }
    }

    /// Root encryption, else the first new encrypted partition, else the
    /// encryption of generated physical volumes
    fn encryption(&self) -> Option<ModelEncryption> {
        let config = self.config;
        let is_root = |fs: Option<&Filesystem>| fs.is_some_and(|fs| fs.is_mounted_at("/"));

        let root = config
            .drives
            .iter()
            .filter(|d| is_root(d.filesystem.as_ref()))
            .filter_map(|d| d.encryption.as_ref())
            .chain(
                config
                    .md_raids
                    .iter()
                    .filter(|m| is_root(m.filesystem.as_ref()))
                    .filter_map(|m| m.encryption.as_ref()),
            )
            .chain(
                config
                    .partitions()
                    .filter(|p| is_root(p.filesystem.as_ref()))
                    .filter_map(|p| p.encryption.as_ref()),
            )
            .chain(
                config
                    .logical_volumes()
                    .filter(|lv| is_root(lv.filesystem.as_ref()))
                    .filter_map(|lv| lv.encryption.as_ref()),
            )
            .next();

        root.or_else(|| {
            config
                .partitions()
                .filter(|p| p.is_new())
                .filter_map(|p| p.encryption.as_ref())
                .find(|e| !e.method().is_swap_only())
        })
        .or_else(|| {
            config
                .volume_groups
                .iter()
                .find_map(VolumeGroup::generated_encryption)
        })
        .map(model_encryption)
    }

    /// Name of the drive or MD RAID defining the alias
    fn alias_device_name(&self, alias: &str) -> Option<String> {
        self.config
            .alias_owners(alias)
            .into_iter()
            .find_map(|owner| match owner {
                AliasOwner::Drive(index) => model_name(self.config.drives[index].search.as_ref()),
                AliasOwner::MdRaid(index) => {
                    model_name(self.config.md_raids[index].search.as_ref())
                }
                _ => None,
            })
    }

    fn filesystem(&self, filesystem: &Filesystem) -> ModelFilesystem {
        let proposed = self
            .product
            .default_filesystem_type(filesystem.path.as_deref());
        let fs_type = filesystem.fs_type.as_ref();

        ModelFilesystem {
            reuse: filesystem.reuse_if_possible,
            default: fs_type.is_some_and(|t| t.default || t.same_as(&proposed)),
            fs_type: fs_type.map(|t| t.kind),
            snapshots: fs_type
                .and_then(|t| t.btrfs.as_ref())
                .and_then(|btrfs| btrfs.snapshots),
            label: filesystem.label.clone(),
        }
    }

    fn drive(&self, drive: &Drive) -> ModelDrive {
        let policy = space_policy(drive.filesystem.is_some(), &drive.partitions);

        ModelDrive {
            name: model_name(drive.search.as_ref()),
            alias: drive.alias.clone(),
            mount_path: drive.mount_path().map(str::to_string),
            filesystem: drive.filesystem.as_ref().map(|fs| self.filesystem(fs)),
            space_policy: Some(policy),
            ptable_type: drive.ptable_type,
            partitions: self.partitions(&drive.partitions, policy),
        }
    }

    fn md_raid(&self, md_raid: &MdRaid) -> ModelDrive {
        let policy = space_policy(md_raid.filesystem.is_some(), &md_raid.partitions);

        ModelDrive {
            name: model_name(md_raid.search.as_ref()),
            alias: md_raid.alias.clone(),
            mount_path: md_raid.mount_path().map(str::to_string),
            filesystem: md_raid.filesystem.as_ref().map(|fs| self.filesystem(fs)),
            space_policy: Some(policy),
            ptable_type: md_raid.ptable_type,
            partitions: self.partitions(&md_raid.partitions, policy),
        }
    }

    /// Catch-all entries are described by the space policy, except for a
    /// custom policy where the devices they were bound to are listed
    fn partitions(&self, partitions: &[Partition], policy: SpacePolicy) -> Vec<ModelPartition> {
        partitions
            .iter()
            .filter(|p| {
                !p.is_catch_all() || (policy == SpacePolicy::Custom && p.is_reused())
            })
            .filter(|p| !skipped(p.search.as_ref()))
            .map(|p| self.partition(p))
            .collect()
    }

    /// Size of a partition, with the reused device size standing in for
    /// `current` and for default sizes
    fn partition_size(&self, partition: &Partition) -> Size {
        let device = partition
            .device_name()
            .and_then(|name| self.inventory.find(name));

        match device {
            Some(device) if partition.size.default => {
                Size::default_with(SizeValue::Bytes(device.size), SizeValue::Bytes(device.size))
            }
            Some(device) => partition.size.with_current(device.size),
            None => partition.size.clone(),
        }
    }

    fn partition(&self, partition: &Partition) -> ModelPartition {
        let size = self.partition_size(partition);
        let reused = partition.is_reused();
        let explicit = reused && !size.default && size.min.is_some();

        ModelPartition {
            name: model_name(partition.search.as_ref()),
            alias: partition.alias.clone(),
            id: partition.id,
            mount_path: partition.mount_path().map(str::to_string),
            filesystem: partition.filesystem.as_ref().map(|fs| self.filesystem(fs)),
            size: Some(model_size(&size)),
            delete: partition.delete,
            delete_if_needed: partition.delete_if_needed,
            resize: explicit && size.min == size.max,
            resize_if_needed: explicit && size.min != size.max,
        }
    }

    fn volume_group(&self, vg: &VolumeGroup) -> ModelVolumeGroup {
        ModelVolumeGroup {
            vg_name: vg.name.clone().unwrap_or_default(),
            extent_size: vg.extent_size,
            target_devices: vg
                .target_devices()
                .filter_map(|alias| self.alias_device_name(alias))
                .collect(),
            logical_volumes: vg
                .logical_volumes
                .iter()
                .map(|lv| self.logical_volume(lv))
                .collect(),
        }
    }

    fn logical_volume(&self, lv: &LogicalVolume) -> ModelLogicalVolume {
        ModelLogicalVolume {
            lv_name: lv.name.clone(),
            mount_path: lv.mount_path().map(str::to_string),
            filesystem: lv.filesystem.as_ref().map(|fs| self.filesystem(fs)),
            size: Some(model_size(&lv.size)),
            stripes: lv.stripes,
            stripe_size: lv.stripe_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{DecodeOptions, from_json};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use storage_types::{Device, DeviceKind, GIB, Inventory};

    fn inventory() -> Inventory {
        let device = |name: &str, kind, size, parent: Option<&str>| Device {
            name: name.to_string(),
            kind,
            size,
            partition_table: None,
            parent: parent.map(str::to_string),
            number: None,
            filesystem: None,
        };

        Inventory::new(vec![
            device("/dev/vda", DeviceKind::Disk, 100 * GIB, None),
            device("/dev/vda1", DeviceKind::Partition, 10 * GIB, Some("/dev/vda")),
            device("/dev/vda2", DeviceKind::Partition, 20 * GIB, Some("/dev/vda")),
        ])
    }

    fn config(doc: Value) -> Config {
        from_json(&doc, &DecodeOptions::default()).unwrap()
    }

    fn bind(search: &mut Option<Search>, name: &str) {
        let inventory = inventory();
        let device = inventory.find(name).unwrap();
        *search = search.take().map(|s| s.bound_to(device));
    }

    #[test]
    fn classifies_space_policies() {
        let partitions = |doc: Value| config(json!({ "drives": [{ "partitions": doc }] })).drives[0].partitions.clone();

        assert_eq!(
            space_policy(false, &partitions(json!([{ "search": "*", "delete": true }]))),
            SpacePolicy::Delete
        );
        assert_eq!(
            space_policy(false, &partitions(json!([{ "search": "*", "size": { "min": 0, "max": "current" } }]))),
            SpacePolicy::Resize
        );
        assert_eq!(
            space_policy(false, &partitions(json!([{ "filesystem": { "path": "/" } }]))),
            SpacePolicy::Keep
        );
        assert_eq!(
            space_policy(
                false,
                &partitions(json!([
                    { "search": "/dev/vda1", "delete": true },
                    { "filesystem": { "path": "/" } }
                ]))
            ),
            SpacePolicy::Custom
        );
        assert_eq!(space_policy(true, &[]), SpacePolicy::Delete);
    }

    #[test]
    fn reused_default_size_is_the_device_size() {
        let mut config = config(json!({
            "drives": [{
                "search": "/dev/vda",
                "partitions": [{ "search": "/dev/vda1", "filesystem": { "reuseIfPossible": true, "path": "/home" } }]
            }]
        }));
        bind(&mut config.drives[0].search, "/dev/vda");
        bind(&mut config.drives[0].partitions[0].search, "/dev/vda1");

        let model = to_model(&config, &ProductDefaults::default(), &inventory());
        let partition = &model.drives[0].partitions[0];

        assert_eq!(partition.name.as_deref(), Some("/dev/vda1"));
        assert_eq!(
            partition.size,
            Some(ModelSize {
                default: true,
                min: 10 * GIB,
                max: Some(10 * GIB)
            })
        );
        assert!(!partition.resize);
        assert!(!partition.resize_if_needed);
    }

    #[test]
    fn resize_flags_follow_the_size() {
        let mut config = config(json!({
            "drives": [{
                "search": "/dev/vda",
                "partitions": [
                    { "search": "/dev/vda1", "size": [0, "current"] },
                    { "search": "/dev/vda2", "size": "5 GiB", "filesystem": { "path": "/data" } }
                ]
            }]
        }));
        bind(&mut config.drives[0].partitions[0].search, "/dev/vda1");
        bind(&mut config.drives[0].partitions[1].search, "/dev/vda2");

        let model = to_model(&config, &ProductDefaults::default(), &inventory());
        let drive = &model.drives[0];
        assert_eq!(drive.space_policy, Some(SpacePolicy::Custom));

        assert!(drive.partitions[0].resize_if_needed);
        assert_eq!(drive.partitions[0].size.and_then(|s| s.max), Some(10 * GIB));
        assert!(drive.partitions[1].resize);
    }

    #[test]
    fn new_partitions_without_size_report_zero() {
        let config = config(json!({ "drives": [{ "partitions": [{ "filesystem": { "path": "/" } }] }] }));
        let model = to_model(&config, &ProductDefaults::default(), &inventory());

        let partition = &model.drives[0].partitions[0];
        assert_eq!(
            partition.size,
            Some(ModelSize {
                default: true,
                min: 0,
                max: None
            })
        );
        assert_eq!(partition.mount_path.as_deref(), Some("/"));
        assert_eq!(model.drives[0].space_policy, Some(SpacePolicy::Keep));
    }

    #[test]
    fn filesystem_matching_the_template_is_default() {
        let config = config(json!({
            "drives": [{ "partitions": [
                { "filesystem": { "path": "/", "type": "ext4" } },
                { "filesystem": { "path": "/srv", "type": "xfs", "label": "data" } }
            ] }]
        }));
        let model = to_model(&config, &ProductDefaults::default(), &inventory());
        let partitions = &model.drives[0].partitions;

        let root = partitions[0].filesystem.as_ref().unwrap();
        assert!(root.default);

        let srv = partitions[1].filesystem.as_ref().unwrap();
        assert!(!srv.default);
        assert_eq!(srv.label.as_deref(), Some("data"));
    }

    #[test]
    fn skipped_drives_are_left_out() {
        let config = config(json!({
            "drives": [{ "search": { "condition": { "name": "/dev/vdz" }, "ifNotFound": "skip" } }]
        }));
        let model = to_model(&config, &ProductDefaults::default(), &inventory());
        assert!(model.drives.is_empty());
    }

    #[test]
    fn encryption_prefers_root() {
        let doc = json!({
            "drives": [{
                "alias": "vda",
                "partitions": [
                    { "filesystem": { "path": "/home" }, "encryption": { "luks1": { "password": "12345" } } },
                    { "filesystem": { "path": "/" }, "encryption": { "luks2": { "password": "root" } } }
                ]
            }],
            "volumeGroups": [{
                "name": "system",
                "physicalVolumes": [{ "generate": { "targetDevices": ["vda"], "encryption": { "luks2": { "password": "54321" } } } }]
            }]
        });
        let model = to_model(&config(doc), &ProductDefaults::default(), &inventory());
        assert_eq!(
            model.encryption,
            Some(ModelEncryption {
                method: storage_types::EncryptionMethod::Luks2,
                password: Some("root".to_string())
            })
        );
    }

    #[test]
    fn encryption_falls_back_to_generated_volumes() {
        let doc = json!({
            "drives": [{ "alias": "vda", "partitions": [{ "filesystem": { "path": "/" } }] }],
            "volumeGroups": [{
                "name": "system",
                "physicalVolumes": [{ "generate": { "targetDevices": ["vda"], "encryption": { "luks2": { "password": "54321" } } } }]
            }]
        });
        let model = to_model(&config(doc), &ProductDefaults::default(), &inventory());
        assert_eq!(model.encryption.map(|e| e.password), Some(Some("54321".to_string())));
    }

    #[test]
    fn boot_and_targets_use_device_names() {
        let mut config = config(json!({
            "boot": { "configure": true, "device": "disk" },
            "drives": [{ "search": "/dev/vda", "alias": "disk" }],
            "volumeGroups": [{ "name": "system", "physicalVolumes": [{ "generate": ["disk"] }] }]
        }));
        bind(&mut config.drives[0].search, "/dev/vda");

        let model = to_model(&config, &ProductDefaults::default(), &inventory());
        assert_eq!(model.boot.device.name.as_deref(), Some("/dev/vda"));
        assert!(!model.boot.device.default);
        assert_eq!(model.volume_groups[0].target_devices, ["/dev/vda"]);
        assert_eq!(model.volume_groups[0].vg_name, "system");
    }
}
