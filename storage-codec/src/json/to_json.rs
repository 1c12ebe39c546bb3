// SPDX-License-Identifier: GPL-3.0-only

use serde_json::{Map, Value, json};
use storage_types::{
    Boot, Config, Drive, Encryption, Filesystem, FilesystemType, IfNotFound, LogicalVolume, MdRaid,
    Partition, PhysicalVolume, Search, SearchCondition, Size, SizeValue, VolumeGroup,
};

/// Encode a configuration as a wire JSON document
///
/// Only what differs from the defaults is written, so decoding the output
/// gives back an equivalent configuration. Bound searches are written as
/// name searches of the bound device.
pub fn to_json(config: &Config) -> Value {
    let mut doc = JsonObject::default();

    doc.put("boot", boot(&config.boot));
    doc.list("drives", config.drives.iter().map(drive));
    doc.list("mdRaids", config.md_raids.iter().map(md_raid));
    doc.list("volumeGroups", config.volume_groups.iter().map(volume_group));

    doc.into_value()
}

#[derive(Default)]
struct JsonObject(Map<String, Value>);

impl JsonObject {
    fn put(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    fn put_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.put(key, value);
        }
    }

    /// Booleans that default to false are only written when set
    fn flag(&mut self, key: &str, value: bool) {
        if value {
            self.put(key, true);
        }
    }

    fn list(&mut self, key: &str, items: impl Iterator<Item = Value>) {
        let items: Vec<Value> = items.collect();
        if !items.is_empty() {
            self.put(key, items);
        }
    }

    fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn boot(boot: &Boot) -> Value {
    let mut object = JsonObject::default();
    object.put("configure", boot.configure);
    if !boot.device.default {
        object.put_opt("device", boot.device.device_alias.clone());
    }
    object.into_value()
}

fn drive(drive: &Drive) -> Value {
    let mut object = JsonObject::default();
    object.put_opt("search", drive.search.as_ref().and_then(search));
    object.put_opt("alias", drive.alias.clone());
    object.put_opt("encryption", drive.encryption.as_ref().map(encryption));
    object.put_opt("filesystem", drive.filesystem.as_ref().map(filesystem));
    object.put_opt("ptableType", drive.ptable_type.map(|t| t.as_str()));
    object.list("partitions", drive.partitions.iter().map(partition));
    object.into_value()
}

fn md_raid(md_raid: &MdRaid) -> Value {
    let mut object = JsonObject::default();
    object.put_opt("search", md_raid.search.as_ref().and_then(search));
    object.put_opt("alias", md_raid.alias.clone());
    object.put_opt("name", md_raid.name.clone());
    object.put_opt("level", md_raid.level.map(|level| level.as_str()));
    object.put_opt("chunkSize", md_raid.chunk_size);
    object.list("devices", md_raid.devices.iter().cloned().map(Value::from));
    object.put_opt("encryption", md_raid.encryption.as_ref().map(encryption));
    object.put_opt("filesystem", md_raid.filesystem.as_ref().map(filesystem));
    object.put_opt("ptableType", md_raid.ptable_type.map(|t| t.as_str()));
    object.list("partitions", md_raid.partitions.iter().map(partition));
    object.flag("delete", md_raid.delete);
    object.flag("deleteIfNeeded", md_raid.delete_if_needed);
    object.into_value()
}

fn partition(partition: &Partition) -> Value {
    let mut object = JsonObject::default();
    object.put_opt("search", partition.search.as_ref().and_then(search));
    object.put_opt("alias", partition.alias.clone());
    object.put_opt("id", partition.id.map(|id| id.as_str()));
    object.put_opt("size", size(&partition.size));
    object.put_opt("encryption", partition.encryption.as_ref().map(encryption));
    object.put_opt("filesystem", partition.filesystem.as_ref().map(filesystem));
    object.flag("delete", partition.delete);
    object.flag("deleteIfNeeded", partition.delete_if_needed);
    object.into_value()
}

fn search(search: &Search) -> Option<Value> {
    if let Some(device) = search.device_name() {
        let mut object = JsonObject::default();
        object.put("condition", json!({ "name": device }));
        if search.if_not_found != IfNotFound::Error {
            object.put("ifNotFound", search.if_not_found.as_str());
        }
        return Some(object.into_value());
    }

    if search.is_empty() {
        return None;
    }

    if search.is_catch_all() && search.if_not_found == IfNotFound::Skip {
        return Some(Value::from("*"));
    }

    let mut object = JsonObject::default();
    object.put_opt("condition", search.condition.as_ref().map(condition));
    if search.if_not_found != IfNotFound::Error {
        object.put("ifNotFound", search.if_not_found.as_str());
    }
    object.put_opt("max", search.max);
    Some(object.into_value())
}

fn condition(condition: &SearchCondition) -> Value {
    match condition {
        SearchCondition::Name(name) => json!({ "name": name }),
        SearchCondition::Size { operator, value } => {
            json!({ "size": { operator.as_str(): value } })
        }
        SearchCondition::Number(number) => json!({ "number": number }),
    }
}

fn size_value(value: SizeValue) -> Value {
    match value {
        SizeValue::Bytes(bytes) => Value::from(bytes),
        SizeValue::Current => Value::from("current"),
        SizeValue::Unlimited => Value::from("unlimited"),
    }
}

/// Default sizes are left out, as are unlimited upper bounds
fn size(size: &Size) -> Option<Value> {
    if size.default {
        return None;
    }

    let mut object = JsonObject::default();
    object.put_opt("min", size.min.map(size_value));
    object.put_opt(
        "max",
        size.max
            .filter(|max| *max != SizeValue::Unlimited)
            .map(size_value),
    );
    Some(object.into_value())
}

fn encryption(encryption: &Encryption) -> Value {
    match encryption {
        Encryption::Luks1(luks1) => {
            let mut body = JsonObject::default();
            body.put_opt("password", luks1.password.clone());
            body.put_opt("keySize", luks1.key_size);
            body.put_opt("cipher", luks1.cipher.clone());
            json!({ "luks1": body.into_value() })
        }
        Encryption::Luks2(luks2) => {
            let mut body = JsonObject::default();
            body.put_opt("password", luks2.password.clone());
            body.put_opt("keySize", luks2.key_size);
            body.put_opt("cipher", luks2.cipher.clone());
            body.put_opt("pbkdFunction", luks2.pbkd_function.map(|f| f.as_str()));
            body.put_opt("label", luks2.label.clone());
            json!({ "luks2": body.into_value() })
        }
        Encryption::PervasiveLuks2 { password } => {
            let mut body = JsonObject::default();
            body.put_opt("password", password.clone());
            json!({ "pervasiveLuks2": body.into_value() })
        }
        Encryption::TpmFde { password } => {
            let mut body = JsonObject::default();
            body.put_opt("password", password.clone());
            json!({ "tpmFde": body.into_value() })
        }
        Encryption::ProtectedSwap => Value::from("protected_swap"),
        Encryption::SecureSwap => Value::from("secure_swap"),
        Encryption::RandomSwap => Value::from("random_swap"),
    }
}

fn filesystem_type(fs_type: &FilesystemType) -> Value {
    match &fs_type.btrfs {
        Some(btrfs) => {
            let mut body = JsonObject::default();
            body.put_opt("snapshots", btrfs.snapshots);
            json!({ "btrfs": body.into_value() })
        }
        None => Value::from(fs_type.kind.as_str()),
    }
}

fn filesystem(filesystem: &Filesystem) -> Value {
    let mut object = JsonObject::default();
    object.flag("reuseIfPossible", filesystem.reuse_if_possible);
    object.put_opt("type", filesystem.fs_type.as_ref().map(filesystem_type));
    object.put_opt("label", filesystem.label.clone());
    object.put_opt("path", filesystem.path.clone());
    object.put_opt("mountBy", filesystem.mount_by.map(|by| by.as_str()));
    object.put_opt("mkfsOptions", filesystem.mkfs_options.clone());
    object.put_opt("mountOptions", filesystem.mount_options.clone());
    object.into_value()
}

fn volume_group(vg: &VolumeGroup) -> Value {
    let mut object = JsonObject::default();
    object.put_opt("name", vg.name.clone());
    object.put_opt("extentSize", vg.extent_size);
    object.list("physicalVolumes", vg.physical_volumes.iter().map(physical_volume));
    object.list("logicalVolumes", vg.logical_volumes.iter().map(logical_volume));
    object.into_value()
}

fn physical_volume(pv: &PhysicalVolume) -> Value {
    match pv {
        PhysicalVolume::Alias(alias) => Value::from(alias.as_str()),
        PhysicalVolume::Generate(generate) => match &generate.encryption {
            None => json!({ "generate": generate.target_devices }),
            Some(pv_encryption) => json!({
                "generate": {
                    "targetDevices": generate.target_devices,
                    "encryption": encryption(pv_encryption),
                }
            }),
        },
    }
}

fn logical_volume(lv: &LogicalVolume) -> Value {
    let mut object = JsonObject::default();
    object.put_opt("name", lv.name.clone());
    object.flag("pool", lv.pool);
    object.put_opt("usedPool", lv.used_pool.clone());
    object.put_opt("stripes", lv.stripes);
    object.put_opt("stripeSize", lv.stripe_size);
    object.put_opt("alias", lv.alias.clone());
    object.put_opt("size", size(&lv.size));
    object.put_opt("encryption", lv.encryption.as_ref().map(encryption));
    object.put_opt("filesystem", lv.filesystem.as_ref().map(filesystem));
    object.into_value()
}
