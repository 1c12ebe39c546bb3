// SPDX-License-Identifier: GPL-3.0-only

use serde_json::Value;
use storage_contracts::SchemaError;
use storage_types::{
    Boot, BootDevice, BtrfsOptions, Config, Drive, Encryption, Filesystem, FilesystemKind,
    FilesystemType, LogicalVolume, MdRaid, Partition, PhysicalVolume, PhysicalVolumesGenerate,
    ProductDefaults, Search, Size, SizeValue, SpacePolicy, VolumeGroup,
};

use super::schema::{
    ModelBoot, ModelConfig, ModelDrive, ModelFilesystem, ModelLogicalVolume, ModelMdRaid,
    ModelPartition, ModelSize, ModelVolumeGroup,
};

/// Decode a model document into a configuration
pub fn from_model(doc: &Value, product: &ProductDefaults) -> Result<Config, SchemaError> {
    let model = ModelConfig::from_json(doc).map_err(|error| SchemaError::new("$", error.to_string()))?;
    Ok(config_from_model(&model, product))
}

/// Build the configuration described by an already parsed model
///
/// Space policies become explicit catch-all partitions, the global encryption
/// is copied to the new devices, and device names used by the boot settings
/// and the volume groups are turned into drive aliases.
pub fn config_from_model(model: &ModelConfig, product: &ProductDefaults) -> Config {
    let converter = Converter {
        product,
        encryption: model
            .encryption
            .as_ref()
            .map(|e| Encryption::with_method(e.method, e.password.clone())),
    };

    let mut config = Config {
        boot: Boot::default(),
        drives: model.drives.iter().map(|d| converter.drive(d)).collect(),
        md_raids: model.md_raids.iter().map(|m| converter.md_raid(m)).collect(),
        volume_groups: Vec::new(),
    };

    let mut volume_groups = Vec::with_capacity(model.volume_groups.len());
    for vg in &model.volume_groups {
        volume_groups.push(converter.volume_group(vg, &mut config));
    }
    config.volume_groups = volume_groups;

    config.boot = boot(&model.boot, &mut config);
    config
}

struct Converter<'a> {
    product: &'a ProductDefaults,
    encryption: Option<Encryption>,
}

impl Converter<'_> {
    /// Global encryption, unless the mount path must stay in the clear
    fn encryption_for(&self, path: Option<&str>) -> Option<Encryption> {
        if path.is_some_and(|path| self.product.is_unencrypted_path(path)) {
            return None;
        }
        self.encryption.clone()
    }

    fn formatted_encryption(&self, filesystem: Option<&Filesystem>) -> Option<Encryption> {
        filesystem
            .filter(|fs| !fs.reuse_if_possible)
            .and_then(|fs| self.encryption_for(fs.path.as_deref()))
    }

    fn drive(&self, model: &ModelDrive) -> Drive {
        let filesystem = filesystem(model.mount_path.as_deref(), model.filesystem.as_ref());

        Drive {
            search: model.name.clone().map(Search::by_name),
            alias: model.alias.clone(),
            encryption: self.formatted_encryption(filesystem.as_ref()),
            partitions: if filesystem.is_some() {
                Vec::new()
            } else {
                self.partitions(model)
            },
            filesystem,
            ptable_type: model.ptable_type,
        }
    }

    fn md_raid(&self, model: &ModelMdRaid) -> MdRaid {
        let filesystem = filesystem(model.mount_path.as_deref(), model.filesystem.as_ref());

        MdRaid {
            search: model.name.clone().map(Search::by_name),
            alias: model.alias.clone(),
            encryption: self.formatted_encryption(filesystem.as_ref()),
            partitions: if filesystem.is_some() {
                Vec::new()
            } else {
                self.partitions(model)
            },
            filesystem,
            ptable_type: model.ptable_type,
            ..MdRaid::default()
        }
    }

    fn partitions(&self, model: &ModelDrive) -> Vec<Partition> {
        let policy = model.space_policy.unwrap_or(self.product.space_policy);

        // Existing partitions that are not used are only space actions,
        // which the policy replaces unless it is custom
        let mut partitions: Vec<Partition> = model
            .partitions
            .iter()
            .filter(|p| {
                policy == SpacePolicy::Custom
                    || p.name.is_none()
                    || p.mount_path.is_some()
                    || p.filesystem.is_some()
            })
            .map(|p| self.partition(p))
            .collect();

        match policy {
            SpacePolicy::Delete => partitions.push(Partition {
                search: Some(Search::catch_all()),
                delete: true,
                ..Partition::default()
            }),
            SpacePolicy::Resize => partitions.push(Partition {
                search: Some(Search::catch_all()),
                size: Size::resize_if_needed(),
                ..Partition::default()
            }),
            SpacePolicy::Keep | SpacePolicy::Custom => {}
        }

        partitions
    }

    fn partition(&self, model: &ModelPartition) -> Partition {
        let mounted = model.mount_path.is_some();

        let size = if model.resize_if_needed {
            Size::resize_if_needed()
        } else {
            model.size.as_ref().map(size).unwrap_or_default()
        };

        let encryption = if model.name.is_none() {
            self.encryption_for(model.mount_path.as_deref())
        } else {
            None
        };

        Partition {
            search: model.name.clone().map(Search::by_name),
            alias: model.alias.clone(),
            id: model.id,
            size,
            encryption,
            filesystem: filesystem(model.mount_path.as_deref(), model.filesystem.as_ref()),
            delete: model.delete && !mounted,
            delete_if_needed: model.delete_if_needed && !mounted,
        }
    }

    fn volume_group(&self, model: &ModelVolumeGroup, config: &mut Config) -> VolumeGroup {
        let target_devices: Vec<String> = model
            .target_devices
            .iter()
            .map(|name| device_alias(config, name))
            .collect();

        let physical_volumes = if target_devices.is_empty() {
            Vec::new()
        } else {
            vec![PhysicalVolume::Generate(PhysicalVolumesGenerate {
                target_devices,
                encryption: self.encryption.clone(),
            })]
        };

        VolumeGroup {
            name: Some(model.vg_name.clone()),
            extent_size: model.extent_size,
            physical_volumes,
            logical_volumes: model.logical_volumes.iter().map(logical_volume).collect(),
        }
    }
}

fn logical_volume(model: &ModelLogicalVolume) -> LogicalVolume {
    LogicalVolume {
        name: model.lv_name.clone(),
        stripes: model.stripes,
        stripe_size: model.stripe_size,
        size: model.size.as_ref().map(size).unwrap_or_default(),
        filesystem: filesystem(model.mount_path.as_deref(), model.filesystem.as_ref()),
        ..LogicalVolume::default()
    }
}

fn size(model: &ModelSize) -> Size {
    Size {
        default: model.default,
        min: Some(SizeValue::Bytes(model.min)),
        max: Some(model.max.map_or(SizeValue::Unlimited, SizeValue::Bytes)),
    }
}

fn filesystem(mount_path: Option<&str>, model: Option<&ModelFilesystem>) -> Option<Filesystem> {
    if mount_path.is_none() && model.is_none() {
        return None;
    }

    let model = model.cloned().unwrap_or_default();
    let fs_type = model.fs_type.map(|kind| FilesystemType {
        default: model.default,
        kind,
        btrfs: (kind == FilesystemKind::Btrfs && model.snapshots.is_some()).then(|| BtrfsOptions {
            snapshots: model.snapshots,
        }),
    });

    Some(Filesystem {
        reuse_if_possible: model.reuse,
        fs_type,
        label: model.label,
        path: mount_path.map(str::to_string),
        ..Filesystem::default()
    })
}

/// Alias of the drive or MD RAID with the given device name
///
/// The device gets a fresh alias if it has none, and a drive entry is added
/// when the name is not in the configuration yet.
fn device_alias(config: &mut Config, name: &str) -> String {
    let is_named = |search: Option<&Search>| {
        search.is_some_and(|s| s.name() == Some(name) || s.device_name() == Some(name))
    };

    if let Some(index) = config.drives.iter().position(|d| is_named(d.search.as_ref())) {
        if let Some(alias) = &config.drives[index].alias {
            return alias.clone();
        }
        let alias = config.unused_alias("drive");
        config.drives[index].alias = Some(alias.clone());
        return alias;
    }

    if let Some(index) = config.md_raids.iter().position(|m| is_named(m.search.as_ref())) {
        if let Some(alias) = &config.md_raids[index].alias {
            return alias.clone();
        }
        let alias = config.unused_alias("md");
        config.md_raids[index].alias = Some(alias.clone());
        return alias;
    }

    let alias = config.unused_alias("drive");
    config.drives.push(Drive {
        search: Some(Search::by_name(name)),
        alias: Some(alias.clone()),
        ..Drive::default()
    });
    alias
}

fn boot(model: &ModelBoot, config: &mut Config) -> Boot {
    if !model.configure {
        return Boot::disabled();
    }
    if model.device.default {
        return Boot::default();
    }

    match &model.device.name {
        Some(name) => Boot::on_alias(device_alias(config, name)),
        None => Boot {
            configure: true,
            device: BootDevice {
                default: false,
                device_alias: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage_types::{EncryptionMethod, GIB, SizeValue};

    fn product(space_policy: SpacePolicy) -> ProductDefaults {
        ProductDefaults {
            space_policy,
            ..ProductDefaults::default()
        }
    }

    fn used_and_unused() -> Value {
        json!({
            "drives": [{
                "name": "/dev/vda",
                "partitions": [
                    { "name": "/dev/vda1", "mountPath": "/data", "size": { "default": true, "min": GIB } },
                    { "name": "/dev/vda2", "resizeIfNeeded": true, "size": { "default": false, "min": GIB } },
                    { "name": "/dev/vda3", "delete": true },
                    { "mountPath": "/", "filesystem": { "type": "btrfs", "snapshots": true } }
                ]
            }]
        })
    }

    fn names(partitions: &[Partition]) -> Vec<Option<&str>> {
        partitions
            .iter()
            .map(|p| p.search.as_ref().and_then(Search::name))
            .collect()
    }

    #[test]
    fn keep_drops_space_actions() {
        let config = from_model(&used_and_unused(), &product(SpacePolicy::Keep)).unwrap();
        let partitions = &config.drives[0].partitions;
        assert_eq!(names(partitions), [Some("/dev/vda1"), None]);
        assert_eq!(partitions[1].mount_path(), Some("/"));
    }

    #[test]
    fn delete_and_resize_append_a_catch_all() {
        let config = from_model(&used_and_unused(), &product(SpacePolicy::Delete)).unwrap();
        let last = config.drives[0].partitions.last().unwrap();
        assert!(last.is_catch_all());
        assert!(last.delete);

        let config = from_model(&used_and_unused(), &product(SpacePolicy::Resize)).unwrap();
        let partitions = &config.drives[0].partitions;
        assert_eq!(partitions.len(), 3);
        let last = partitions.last().unwrap();
        assert!(last.is_catch_all());
        assert!(!last.delete);
        assert_eq!(last.size, Size::resize_if_needed());
    }

    #[test]
    fn custom_keeps_every_partition() {
        let config = from_model(&used_and_unused(), &product(SpacePolicy::Custom)).unwrap();
        let partitions = &config.drives[0].partitions;
        assert_eq!(
            names(partitions),
            [Some("/dev/vda1"), Some("/dev/vda2"), Some("/dev/vda3"), None]
        );
        assert_eq!(partitions[1].size, Size::resize_if_needed());
        assert!(partitions[2].delete);
    }

    #[test]
    fn drive_policy_overrides_product_policy() {
        let mut doc = used_and_unused();
        doc["drives"][0]["spacePolicy"] = json!("custom");
        let config = from_model(&doc, &product(SpacePolicy::Delete)).unwrap();
        assert_eq!(config.drives[0].partitions.len(), 4);
    }

    #[test]
    fn sizes_and_filesystems() {
        let config = from_model(&used_and_unused(), &product(SpacePolicy::Keep)).unwrap();
        let partitions = &config.drives[0].partitions;

        assert_eq!(
            partitions[0].size,
            Size::default_with(SizeValue::Bytes(GIB), SizeValue::Unlimited)
        );
        assert!(partitions[1].size.is_unfilled());

        let fs_type = partitions[1].filesystem.as_ref().and_then(|fs| fs.fs_type.clone()).unwrap();
        assert_eq!(fs_type, FilesystemType::btrfs(Some(true)));
    }

    #[test]
    fn mounted_partitions_are_never_deleted() {
        let doc = json!({
            "drives": [{
                "spacePolicy": "custom",
                "partitions": [{ "name": "/dev/vda1", "mountPath": "/home", "delete": true }]
            }]
        });
        let config = from_model(&doc, &ProductDefaults::default()).unwrap();
        assert!(!config.drives[0].partitions[0].delete);
    }

    #[test]
    fn global_encryption_goes_to_new_devices() {
        let doc = json!({
            "encryption": { "method": "luks1", "password": "12345" },
            "drives": [{
                "name": "/dev/vda",
                "partitions": [{ "name": "/dev/vda1", "mountPath": "/data" }, {}, { "mountPath": "/boot/zipl" }]
            }],
            "volumeGroups": [{ "vgName": "system", "targetDevices": ["/dev/vda"] }]
        });
        let config = from_model(&doc, &ProductDefaults::default()).unwrap();
        let partitions = &config.drives[0].partitions;

        assert!(partitions[0].encryption.is_none());
        let encryption = partitions[1].encryption.as_ref().unwrap();
        assert_eq!(encryption.method(), EncryptionMethod::Luks1);
        assert_eq!(encryption.password(), Some("12345"));
        assert!(partitions[2].encryption.is_none());

        assert!(config.volume_groups[0].generated_encryption().is_some());
    }

    #[test]
    fn device_names_become_aliases() {
        let doc = json!({
            "boot": { "configure": true, "device": { "default": false, "name": "/dev/vdb" } },
            "drives": [{ "name": "/dev/vda" }],
            "volumeGroups": [{ "vgName": "system", "targetDevices": ["/dev/vda"] }]
        });
        let config = from_model(&doc, &ProductDefaults::default()).unwrap();

        assert_eq!(config.drives.len(), 2);
        assert_eq!(config.drives[0].alias.as_deref(), Some("drive0"));
        assert_eq!(config.drives[1].search_name(), Some("/dev/vdb"));
        assert_eq!(config.drives[1].alias.as_deref(), Some("drive1"));
        assert_eq!(config.boot, Boot::on_alias("drive1"));

        let targets: Vec<&str> = config.volume_groups[0].target_devices().collect();
        assert_eq!(targets, ["drive0"]);
    }

    #[test]
    fn existing_aliases_are_reused() {
        let doc = json!({
            "boot": { "device": { "default": false, "name": "/dev/vda" } },
            "drives": [{ "name": "/dev/vda", "alias": "root-disk" }]
        });
        let config = from_model(&doc, &ProductDefaults::default()).unwrap();
        assert_eq!(config.drives.len(), 1);
        assert_eq!(config.boot, Boot::on_alias("root-disk"));
    }

    #[test]
    fn malformed_documents_are_schema_errors() {
        let error = from_model(&json!({ "drives": "none" }), &ProductDefaults::default()).unwrap_err();
        assert_eq!(error.path, "$");
    }
}
