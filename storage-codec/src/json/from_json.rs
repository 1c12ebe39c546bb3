// SPDX-License-Identifier: GPL-3.0-only

use serde_json::Value;
use storage_contracts::SchemaError;
use storage_types::{
    Boot, BootDevice, Config, Drive, Encryption, Filesystem, FilesystemType,
    IfNotFound, LogicalVolume, Luks1, Luks2, MdRaid, Partition, PhysicalVolume,
    PhysicalVolumesGenerate, Search, SearchCondition, Size, SizeOperator, SizeValue, VolumeGroup,
    pretty_to_bytes,
};

use super::DecodeOptions;
use super::reader::{JsonPath, ObjectReader, Result, as_string, type_name};

const CONFIG_KEYS: &[&str] = &["boot", "drives", "mdRaids", "volumeGroups"];
const BOOT_KEYS: &[&str] = &["configure", "device"];
const DRIVE_KEYS: &[&str] = &[
    "search",
    "alias",
    "encryption",
    "filesystem",
    "ptableType",
    "partitions",
];
const MD_RAID_KEYS: &[&str] = &[
    "search",
    "alias",
    "name",
    "level",
    "chunkSize",
    "devices",
    "encryption",
    "filesystem",
    "ptableType",
    "partitions",
    "delete",
    "deleteIfNeeded",
];
const PARTITION_KEYS: &[&str] = &[
    "search",
    "alias",
    "id",
    "size",
    "encryption",
    "filesystem",
    "delete",
    "deleteIfNeeded",
];
const SEARCH_KEYS: &[&str] = &["condition", "ifNotFound", "max"];
const FILESYSTEM_KEYS: &[&str] = &[
    "reuseIfPossible",
    "type",
    "label",
    "path",
    "mountBy",
    "mkfsOptions",
    "mountOptions",
];
const VOLUME_GROUP_KEYS: &[&str] = &["name", "extentSize", "physicalVolumes", "logicalVolumes"];
const LOGICAL_VOLUME_KEYS: &[&str] = &[
    "name",
    "pool",
    "usedPool",
    "stripes",
    "stripeSize",
    "alias",
    "size",
    "encryption",
    "filesystem",
];
const LUKS1_KEYS: &[&str] = &["password", "keySize", "cipher"];
const LUKS2_KEYS: &[&str] = &["password", "keySize", "cipher", "pbkdFunction", "label"];
const PASSWORD_KEYS: &[&str] = &["password"];
const ENCRYPTION_VARIANTS: &[&str] = &["luks1", "luks2", "pervasiveLuks2", "tpmFde"];

/// Decode a wire JSON document into a configuration
pub fn from_json(doc: &Value, options: &DecodeOptions) -> std::result::Result<Config, SchemaError> {
    Decoder { options: *options }.config(doc, &JsonPath::root())
}

struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    fn object<'a>(&self, value: &'a Value, path: &JsonPath, known: &[&str]) -> Result<ObjectReader<'a>> {
        let reader = ObjectReader::new(value, path)?;
        reader.check_keys(known, &self.options)?;
        Ok(reader)
    }

    fn config(&self, value: &Value, path: &JsonPath) -> Result<Config> {
        let reader = self.object(value, path, CONFIG_KEYS)?;

        let boot = match reader.get("boot") {
            Some((value, path)) => self.boot(value, &path)?,
            None => Boot::default(),
        };

        let drives = reader
            .array("drives")?
            .into_iter()
            .map(|(value, path)| self.drive(value, &path))
            .collect::<Result<_>>()?;

        let md_raids = reader
            .array("mdRaids")?
            .into_iter()
            .map(|(value, path)| self.md_raid(value, &path))
            .collect::<Result<_>>()?;

        let volume_groups = reader
            .array("volumeGroups")?
            .into_iter()
            .map(|(value, path)| self.volume_group(value, &path))
            .collect::<Result<_>>()?;

        Ok(Config {
            boot,
            drives,
            md_raids,
            volume_groups,
        })
    }

    fn boot(&self, value: &Value, path: &JsonPath) -> Result<Boot> {
        let reader = self.object(value, path, BOOT_KEYS)?;

        let device = match reader.string("device")? {
            Some(alias) => BootDevice {
                default: false,
                device_alias: Some(alias),
            },
            None => BootDevice::default(),
        };

        Ok(Boot {
            configure: reader.bool("configure")?.unwrap_or(true),
            device,
        })
    }

    fn drive(&self, value: &Value, path: &JsonPath) -> Result<Drive> {
        let reader = self.object(value, path, DRIVE_KEYS)?;

        Ok(Drive {
            search: self.optional_search(&reader)?,
            alias: reader.string("alias")?,
            encryption: self.optional_encryption(&reader)?,
            filesystem: self.optional_filesystem(&reader)?,
            ptable_type: reader.parsed("ptableType")?,
            partitions: self.partitions(&reader)?,
        })
    }

    fn md_raid(&self, value: &Value, path: &JsonPath) -> Result<MdRaid> {
        let reader = self.object(value, path, MD_RAID_KEYS)?;

        let md_raid = MdRaid {
            search: self.optional_search(&reader)?,
            alias: reader.string("alias")?,
            name: reader.string("name")?,
            level: reader.parsed("level")?,
            chunk_size: self.optional_bytes(&reader, "chunkSize")?,
            devices: reader.strings("devices")?.unwrap_or_default(),
            encryption: self.optional_encryption(&reader)?,
            filesystem: self.optional_filesystem(&reader)?,
            ptable_type: reader.parsed("ptableType")?,
            partitions: self.partitions(&reader)?,
            delete: reader.bool("delete")?.unwrap_or(false),
            delete_if_needed: reader.bool("deleteIfNeeded")?.unwrap_or(false),
        };

        if md_raid.delete || md_raid.delete_if_needed {
            self.check_deletable(
                path,
                md_raid.search.is_some(),
                md_raid.filesystem.is_some(),
                md_raid.encryption.is_some(),
                None,
            )?;
        }

        Ok(md_raid)
    }

    fn partitions(&self, reader: &ObjectReader<'_>) -> Result<Vec<Partition>> {
        reader
            .array("partitions")?
            .into_iter()
            .map(|(value, path)| self.partition(value, &path))
            .collect()
    }

    fn partition(&self, value: &Value, path: &JsonPath) -> Result<Partition> {
        let reader = self.object(value, path, PARTITION_KEYS)?;

        let partition = Partition {
            search: self.optional_search(&reader)?,
            alias: reader.string("alias")?,
            id: reader.parsed("id")?,
            size: self.optional_size(&reader)?,
            encryption: self.optional_encryption(&reader)?,
            filesystem: self.optional_filesystem(&reader)?,
            delete: reader.bool("delete")?.unwrap_or(false),
            delete_if_needed: reader.bool("deleteIfNeeded")?.unwrap_or(false),
        };

        if partition.is_deleted() {
            self.check_deletable(
                path,
                partition.search.is_some(),
                partition.filesystem.is_some(),
                partition.encryption.is_some(),
                Some(&partition.size),
            )?;
        }

        Ok(partition)
    }

    /// A device slated for removal only carries what is needed to find it
    fn check_deletable(
        &self,
        path: &JsonPath,
        has_search: bool,
        has_filesystem: bool,
        has_encryption: bool,
        size: Option<&Size>,
    ) -> Result<()> {
        if !has_search {
            return Err(path.error("only existing devices can be deleted, add a search"));
        }
        if has_filesystem {
            return Err(path.key("filesystem").error("not allowed on a device to delete"));
        }
        if has_encryption {
            return Err(path.key("encryption").error("not allowed on a device to delete"));
        }
        if let Some(size) = size
            && !size.default
            && !size.shrinks_to_zero()
            && !size.has_current()
        {
            return Err(path
                .key("size")
                .error("a device to delete can only be shrunk to zero or kept at its current size"));
        }

        Ok(())
    }

    fn optional_search(&self, reader: &ObjectReader<'_>) -> Result<Option<Search>> {
        match reader.get("search") {
            Some((value, path)) => self.search(value, &path),
            None => Ok(None),
        }
    }

    fn search(&self, value: &Value, path: &JsonPath) -> Result<Option<Search>> {
        if let Value::String(name) = value {
            if name == "*" {
                return Ok(Some(Search::catch_all()));
            }
            return Ok(Some(Search::by_name(name.clone())));
        }

        let reader = self.object(value, path, SEARCH_KEYS)?;

        let condition = match reader.get("condition") {
            Some((value, path)) => Some(self.search_condition(value, &path)?),
            None => None,
        };

        let if_not_found = reader.parsed::<IfNotFound>("ifNotFound")?.unwrap_or_default();

        let search = Search {
            condition,
            if_not_found,
            max: reader.u32("max")?,
            resolved: None,
        };

        if search.is_empty() {
            return Ok(None);
        }

        Ok(Some(search))
    }

    fn search_condition(&self, value: &Value, path: &JsonPath) -> Result<SearchCondition> {
        let reader = self.object(value, path, &["name", "size", "number"])?;

        let mut conditions = Vec::new();
        if let Some(name) = reader.string("name")? {
            conditions.push(SearchCondition::Name(name));
        }
        if let Some((value, path)) = reader.get("size") {
            conditions.push(self.size_condition(value, &path)?);
        }
        if let Some(number) = reader.u32("number")? {
            conditions.push(SearchCondition::Number(number));
        }

        match conditions.len() {
            1 => Ok(conditions.remove(0)),
            0 => Err(path.error("expected one of name, size or number")),
            _ => Err(path.error("only one condition is allowed")),
        }
    }

    fn size_condition(&self, value: &Value, path: &JsonPath) -> Result<SearchCondition> {
        if !value.is_object() {
            return Ok(SearchCondition::Size {
                operator: SizeOperator::Equal,
                value: self.bytes(value, path)?,
            });
        }

        let names: Vec<&str> = SizeOperator::all().iter().map(|op| op.as_str()).collect();
        let reader = self.object(value, path, &names)?;

        let mut found = SizeOperator::all()
            .into_iter()
            .filter_map(|operator| reader.get(operator.as_str()).map(|entry| (operator, entry)));

        let Some((operator, (value, value_path))) = found.next() else {
            return Err(path.error("expected one of equal, greater or less"));
        };
        if found.next().is_some() {
            return Err(path.error("only one size operator is allowed"));
        }

        Ok(SearchCondition::Size {
            operator,
            value: self.bytes(value, &value_path)?,
        })
    }

    fn bytes(&self, value: &Value, path: &JsonPath) -> Result<u64> {
        match self.size_value(value, path)? {
            SizeValue::Bytes(bytes) => Ok(bytes),
            other => Err(path.error(format!("'{other}' is not allowed here"))),
        }
    }

    fn optional_bytes(&self, reader: &ObjectReader<'_>, key: &str) -> Result<Option<u64>> {
        reader
            .get(key)
            .map(|(value, path)| self.bytes(value, &path))
            .transpose()
    }

    fn size_value(&self, value: &Value, path: &JsonPath) -> Result<SizeValue> {
        match value {
            Value::Number(number) => number.as_u64().map(SizeValue::Bytes).ok_or_else(|| {
                path.error(format!("expected a non-negative integer, got {number}"))
            }),
            Value::String(text) => match text.trim() {
                "current" => Ok(SizeValue::Current),
                "unlimited" => Ok(SizeValue::Unlimited),
                other => pretty_to_bytes(other)
                    .map(SizeValue::Bytes)
                    .map_err(|error| path.error(error.to_string())),
            },
            other => Err(path.error(format!("expected a size, got {}", type_name(other)))),
        }
    }

    fn optional_size(&self, reader: &ObjectReader<'_>) -> Result<Size> {
        match reader.get("size") {
            Some((value, path)) => self.size(value, &path),
            None => Ok(Size::default()),
        }
    }

    fn size(&self, value: &Value, path: &JsonPath) -> Result<Size> {
        let size = match value {
            Value::Array(items) => {
                let bound = |index: usize| self.size_value(&items[index], &path.index(index));
                match items.len() {
                    1 => Size::range(bound(0)?, SizeValue::Unlimited),
                    2 => Size::range(bound(0)?, bound(1)?),
                    other => {
                        return Err(path.error(format!("expected [min] or [min, max], got {other} items")));
                    }
                }
            }
            Value::Object(_) => {
                let reader = self.object(value, path, &["default", "min", "max"])?;
                let default = reader.bool("default")?.unwrap_or(false);
                let min = reader
                    .get("min")
                    .map(|(value, path)| self.size_value(value, &path))
                    .transpose()?;
                let max = reader
                    .get("max")
                    .map(|(value, path)| self.size_value(value, &path))
                    .transpose()?;

                if default {
                    Size { default, min, max }
                } else {
                    let Some(min) = min else {
                        return Err(path.key("min").error("required unless default is true"));
                    };
                    Size::range(min, max.unwrap_or(SizeValue::Unlimited))
                }
            }
            scalar => {
                let value = self.size_value(scalar, path)?;
                Size::range(value, value)
            }
        };

        if size.min == Some(SizeValue::Unlimited) {
            return Err(path.key("min").error("min cannot be unlimited"));
        }
        if let (Some(SizeValue::Bytes(min)), Some(SizeValue::Bytes(max))) = (size.min, size.max)
            && min > max
        {
            return Err(path.error(format!("min {min} is bigger than max {max}")));
        }

        Ok(size)
    }

    fn optional_encryption(&self, reader: &ObjectReader<'_>) -> Result<Option<Encryption>> {
        reader
            .get("encryption")
            .map(|(value, path)| self.encryption(value, &path))
            .transpose()
    }

    fn encryption(&self, value: &Value, path: &JsonPath) -> Result<Encryption> {
        if let Value::String(name) = value {
            return match name.as_str() {
                "protected_swap" => Ok(Encryption::ProtectedSwap),
                "secure_swap" => Ok(Encryption::SecureSwap),
                "random_swap" => Ok(Encryption::RandomSwap),
                other => Err(path.error(format!("unknown encryption method '{other}'"))),
            };
        }

        let reader = ObjectReader::new(value, path)?;
        let variants: Vec<&str> = reader
            .keys()
            .filter(|key| ENCRYPTION_VARIANTS.contains(key))
            .collect();

        let variant = match variants.as_slice() {
            [variant] => *variant,
            [] => return Err(path.error("expected one of luks1, luks2, pervasiveLuks2 or tpmFde")),
            _ => return Err(path.error("only one encryption method is allowed")),
        };
        reader.check_keys(&[variant], &self.options)?;

        let Some((body, body_path)) = reader.get(variant) else {
            return Err(path.error("missing encryption settings"));
        };

        match variant {
            "luks1" => {
                let body = self.object(body, &body_path, LUKS1_KEYS)?;
                Ok(Encryption::Luks1(Luks1 {
                    password: body.string("password")?,
                    key_size: body.u32("keySize")?,
                    cipher: body.string("cipher")?,
                }))
            }
            "luks2" => {
                let body = self.object(body, &body_path, LUKS2_KEYS)?;
                Ok(Encryption::Luks2(Luks2 {
                    password: body.string("password")?,
                    key_size: body.u32("keySize")?,
                    cipher: body.string("cipher")?,
                    pbkd_function: body.parsed("pbkdFunction")?,
                    label: body.string("label")?,
                }))
            }
            "pervasiveLuks2" => {
                let body = self.object(body, &body_path, PASSWORD_KEYS)?;
                Ok(Encryption::PervasiveLuks2 {
                    password: body.string("password")?,
                })
            }
            _ => {
                let body = self.object(body, &body_path, PASSWORD_KEYS)?;
                Ok(Encryption::TpmFde {
                    password: body.string("password")?,
                })
            }
        }
    }

    fn optional_filesystem(&self, reader: &ObjectReader<'_>) -> Result<Option<Filesystem>> {
        reader
            .get("filesystem")
            .map(|(value, path)| self.filesystem(value, &path))
            .transpose()
    }

    fn filesystem(&self, value: &Value, path: &JsonPath) -> Result<Filesystem> {
        let reader = self.object(value, path, FILESYSTEM_KEYS)?;

        let fs_type = match reader.get("type") {
            Some((value, path)) => Some(self.filesystem_type(value, &path)?),
            None => None,
        };

        Ok(Filesystem {
            reuse_if_possible: reader.bool("reuseIfPossible")?.unwrap_or(false),
            fs_type,
            label: reader.string("label")?,
            path: reader.string("path")?,
            mount_by: reader.parsed("mountBy")?,
            mkfs_options: reader.strings("mkfsOptions")?,
            mount_options: reader.strings("mountOptions")?,
        })
    }

    fn filesystem_type(&self, value: &Value, path: &JsonPath) -> Result<FilesystemType> {
        if let Value::String(name) = value {
            let kind = name.parse().map_err(|error: String| path.error(error))?;
            return Ok(FilesystemType::new(kind));
        }

        let reader = ObjectReader::new(value, path)?;
        let Some((body, body_path)) = reader.get("btrfs") else {
            return Err(path.error("expected a filesystem name or a btrfs object"));
        };
        reader.check_keys(&["btrfs"], &self.options)?;

        let body = self.object(body, &body_path, &["snapshots"])?;
        Ok(FilesystemType::btrfs(body.bool("snapshots")?))
    }

    fn volume_group(&self, value: &Value, path: &JsonPath) -> Result<VolumeGroup> {
        let reader = self.object(value, path, VOLUME_GROUP_KEYS)?;

        let physical_volumes = reader
            .array("physicalVolumes")?
            .into_iter()
            .map(|(value, path)| self.physical_volume(value, &path))
            .collect::<Result<_>>()?;

        let logical_volumes = reader
            .array("logicalVolumes")?
            .into_iter()
            .map(|(value, path)| self.logical_volume(value, &path))
            .collect::<Result<_>>()?;

        Ok(VolumeGroup {
            name: reader.string("name")?,
            extent_size: self.optional_bytes(&reader, "extentSize")?,
            physical_volumes,
            logical_volumes,
        })
    }

    fn physical_volume(&self, value: &Value, path: &JsonPath) -> Result<PhysicalVolume> {
        if let Value::String(alias) = value {
            return Ok(PhysicalVolume::Alias(alias.clone()));
        }

        let reader = self.object(value, path, &["generate"])?;
        let Some((generate, generate_path)) = reader.get("generate") else {
            return Err(path.error("expected an alias or a generate object"));
        };

        if let Value::Array(items) = generate {
            let target_devices = items
                .iter()
                .enumerate()
                .map(|(index, item)| as_string(item, &generate_path.index(index)))
                .collect::<Result<_>>()?;

            return Ok(PhysicalVolume::Generate(PhysicalVolumesGenerate {
                target_devices,
                encryption: None,
            }));
        }

        let body = self.object(generate, &generate_path, &["targetDevices", "encryption"])?;
        Ok(PhysicalVolume::Generate(PhysicalVolumesGenerate {
            target_devices: body.strings("targetDevices")?.unwrap_or_default(),
            encryption: self.optional_encryption(&body)?,
        }))
    }

    fn logical_volume(&self, value: &Value, path: &JsonPath) -> Result<LogicalVolume> {
        let reader = self.object(value, path, LOGICAL_VOLUME_KEYS)?;

        let logical_volume = LogicalVolume {
            name: reader.string("name")?,
            pool: reader.bool("pool")?.unwrap_or(false),
            used_pool: reader.string("usedPool")?,
            stripes: reader.u32("stripes")?,
            stripe_size: self.optional_bytes(&reader, "stripeSize")?,
            alias: reader.string("alias")?,
            size: self.optional_size(&reader)?,
            encryption: self.optional_encryption(&reader)?,
            filesystem: self.optional_filesystem(&reader)?,
        };

        if logical_volume.pool && logical_volume.used_pool.is_some() {
            return Err(path.error("a thin pool cannot be allocated from another pool"));
        }

        Ok(logical_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage_types::{EncryptionMethod, FilesystemKind, GIB, MIB, PartitionId};

    fn decode(doc: Value) -> std::result::Result<Config, SchemaError> {
        from_json(&doc, &DecodeOptions::default())
    }

    #[test]
    fn empty_document_gives_default_config() {
        let config = decode(json!({})).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.boot.configure);
        assert!(config.boot.device.default);
    }

    #[test]
    fn decodes_drive_with_partitions() {
        let config = decode(json!({
            "drives": [{
                "search": "/dev/vda",
                "alias": "disk",
                "ptableType": "gpt",
                "partitions": [
                    { "search": "*", "deleteIfNeeded": true, "size": [0, "current"] },
                    {
                        "id": "linux",
                        "size": "40 GiB",
                        "filesystem": { "path": "/", "type": { "btrfs": { "snapshots": true } } }
                    },
                    { "size": { "default": true } }
                ]
            }]
        }))
        .unwrap();

        let drive = &config.drives[0];
        assert_eq!(drive.search_name(), Some("/dev/vda"));
        assert_eq!(drive.alias.as_deref(), Some("disk"));

        let catch_all = &drive.partitions[0];
        assert!(catch_all.is_catch_all());
        assert!(catch_all.delete_if_needed);
        assert_eq!(catch_all.size, Size::resize_if_needed());

        let root = &drive.partitions[1];
        assert_eq!(root.id, Some(PartitionId::Linux));
        assert_eq!(root.size, Size::fixed(40 * GIB));
        let fs_type = root.filesystem.as_ref().and_then(|fs| fs.fs_type.clone()).unwrap();
        assert_eq!(fs_type.kind, FilesystemKind::Btrfs);
        assert!(fs_type.snapshots());
        assert!(!fs_type.default);

        assert!(drive.partitions[2].size.is_unfilled());
    }

    #[test]
    fn size_forms() {
        let size = |value: Value| {
            let config = decode(json!({ "drives": [{ "partitions": [{ "size": value }] }] }))?;
            Ok::<_, SchemaError>(config.drives[0].partitions[0].size.clone())
        };

        assert_eq!(
            size(json!([GIB])).unwrap(),
            Size::range(SizeValue::Bytes(GIB), SizeValue::Unlimited)
        );
        assert_eq!(
            size(json!({ "min": "512 MiB" })).unwrap(),
            Size::range(SizeValue::Bytes(512 * MIB), SizeValue::Unlimited)
        );
        assert_eq!(
            size(json!({ "min": 1, "max": "unlimited" })).unwrap(),
            Size::range(SizeValue::Bytes(1), SizeValue::Unlimited)
        );

        let error = size(json!({ "max": GIB })).unwrap_err();
        assert_eq!(error.path, "drives[0].partitions[0].size.min");

        let error = size(json!([2 * GIB, GIB])).unwrap_err();
        assert_eq!(error.path, "drives[0].partitions[0].size");

        assert!(size(json!([1, 2, 3])).is_err());
        assert!(size(json!("a lot")).is_err());
    }

    #[test]
    fn search_forms() {
        let config = decode(json!({
            "drives": [
                {},
                { "search": {} },
                { "search": { "condition": { "size": { "greater": "1 GiB" } }, "max": 2 } },
                { "search": { "ifNotFound": "skip" } }
            ]
        }))
        .unwrap();

        assert!(config.drives[0].search.is_none());
        assert!(config.drives[1].search.is_none());

        let search = config.drives[2].search.as_ref().unwrap();
        assert_eq!(
            search.condition,
            Some(SearchCondition::Size {
                operator: SizeOperator::Greater,
                value: GIB
            })
        );
        assert_eq!(search.max, Some(2));

        assert_eq!(config.drives[3].search, Some(Search::catch_all()));
    }

    #[test]
    fn search_condition_needs_exactly_one_criterion() {
        let error = decode(json!({
            "drives": [{ "search": { "condition": { "name": "/dev/vda", "number": 1 } } }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "drives[0].search.condition");

        let error = decode(json!({
            "drives": [{ "search": { "condition": { "size": { "less": 1, "equal": 2 } } } }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "drives[0].search.condition.size");
    }

    #[test]
    fn deleted_partitions_cannot_be_formatted() {
        let error = decode(json!({
            "drives": [{ "partitions": [{
                "search": "/dev/vda1",
                "delete": true,
                "filesystem": { "path": "/" }
            }] }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "drives[0].partitions[0].filesystem");

        let error = decode(json!({
            "drives": [{ "partitions": [{ "delete": true }] }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "drives[0].partitions[0]");

        let error = decode(json!({
            "drives": [{ "partitions": [{ "search": "*", "delete": true, "size": "1 GiB" }] }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "drives[0].partitions[0].size");
    }

    #[test]
    fn encryption_variants() {
        let encryption = |value: Value| {
            let config = decode(json!({ "drives": [{ "encryption": value }] }))?;
            Ok::<_, SchemaError>(config.drives[0].encryption.clone().unwrap())
        };

        let luks2 = encryption(json!({ "luks2": { "password": "n0ts3cr3t", "pbkdFunction": "argon2id" } }))
            .unwrap();
        assert_eq!(luks2.method(), EncryptionMethod::Luks2);
        assert_eq!(luks2.password(), Some("n0ts3cr3t"));

        assert_eq!(encryption(json!("random_swap")).unwrap(), Encryption::RandomSwap);
        assert_eq!(
            encryption(json!({ "tpmFde": {} })).unwrap(),
            Encryption::TpmFde { password: None }
        );

        assert!(encryption(json!({ "luks1": {}, "luks2": {} })).is_err());
        assert!(encryption(json!({})).is_err());
        assert!(encryption(json!("plain")).is_err());
    }

    #[test]
    fn volume_groups_and_thin_pools() {
        let config = decode(json!({
            "volumeGroups": [{
                "name": "system",
                "physicalVolumes": [
                    "pv0",
                    { "generate": ["disk"] },
                    { "generate": { "targetDevices": ["md"], "encryption": { "luks1": {} } } }
                ],
                "logicalVolumes": [
                    { "name": "pool", "pool": true },
                    { "name": "root", "usedPool": "pool", "filesystem": { "path": "/" } }
                ]
            }]
        }))
        .unwrap();

        let vg = &config.volume_groups[0];
        assert_eq!(vg.literal_physical_volumes().collect::<Vec<_>>(), ["pv0"]);
        assert_eq!(vg.target_devices().collect::<Vec<_>>(), ["disk", "md"]);
        assert!(vg.generated_encryption().is_some());
        assert!(vg.logical_volumes[1].is_thin());

        let error = decode(json!({
            "volumeGroups": [{ "logicalVolumes": [{ "pool": true, "usedPool": "other" }] }]
        }))
        .unwrap_err();
        assert_eq!(error.path, "volumeGroups[0].logicalVolumes[0]");
    }

    #[test]
    fn unknown_keys_depend_on_mode() {
        let doc = json!({ "drives": [{ "alias": "a", "label": "data" }] });

        let error = decode(doc.clone()).unwrap_err();
        assert_eq!(error.path, "drives[0].label");

        let config = from_json(&doc, &DecodeOptions::lenient()).unwrap();
        assert_eq!(config.drives[0].alias.as_deref(), Some("a"));
    }

    #[test]
    fn boot_device_alias() {
        let config = decode(json!({ "boot": { "configure": true, "device": "disk" } })).unwrap();
        assert_eq!(config.boot, Boot::on_alias("disk"));

        let config = decode(json!({ "boot": { "configure": false } })).unwrap();
        assert_eq!(config.boot, Boot::disabled());
    }
}
