//! Size limits of partitions and logical volumes
//!
//! Default sizes are filled again on every solve: new devices take the
//! product size for their mount path, reused devices keep the size they
//! have. A `current` bound is the device size, or the product size when
//! there is no device yet.

use storage_contracts::DeviceInventory;
use storage_types::{Config, Device, Filesystem, ProductDefaults, Size, SizeValue};

use crate::nodes::partitions_mut;

pub(crate) fn solve(config: &mut Config, inventory: &dyn DeviceInventory, product: &ProductDefaults) {
    let paths = config.mount_paths();
    let sizer = Sizer { product, paths: &paths };

    for partition in partitions_mut(config) {
        let device = partition.device_name().and_then(|name| inventory.find(name));
        partition.size = sizer.size(&partition.size, device, partition.filesystem.as_ref());
    }

    for vg in &mut config.volume_groups {
        for lv in &mut vg.logical_volumes {
            lv.size = sizer.size(&lv.size, None, lv.filesystem.as_ref());
        }
    }
}

struct Sizer<'a> {
    product: &'a ProductDefaults,

    /// Mount paths present in the configuration
    paths: &'a [String],
}

impl Sizer<'_> {
    fn size(&self, size: &Size, device: Option<&Device>, filesystem: Option<&Filesystem>) -> Size {
        match device {
            Some(device) if size.default => {
                Size::default_with(SizeValue::Bytes(device.size), SizeValue::Bytes(device.size))
            }
            Some(device) => size.with_current(device.size),
            None if size.default || size.has_current() => self.product_size(filesystem),
            None => size.clone(),
        }
    }

    fn product_size(&self, filesystem: Option<&Filesystem>) -> Size {
        let path = filesystem.and_then(|fs| fs.path.as_deref());
        let snapshots = filesystem.is_some_and(Filesystem::snapshots);
        self.product.default_size(path, self.paths, snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storage_types::{
        DeviceKind, Drive, GIB, Inventory, LogicalVolume, MIB, Partition, Search, TemplateSize,
        VolumeGroup, VolumeTemplate,
    };

    fn inventory() -> Inventory {
        Inventory::new(vec![Device {
            name: "/dev/vda1".to_string(),
            kind: DeviceKind::Partition,
            size: 10 * GIB,
            partition_table: None,
            parent: Some("/dev/vda".to_string()),
            number: Some(1),
            filesystem: None,
        }])
    }

    fn product() -> ProductDefaults {
        ProductDefaults::with_templates(vec![VolumeTemplate {
            mount_path: "/".to_string(),
            size: TemplateSize {
                auto: false,
                min: Some(5 * GIB),
                max: Some(20 * GIB),
            },
            ..VolumeTemplate::default()
        }])
    }

    fn reused(size: Size) -> Partition {
        Partition {
            search: Some(Search::by_name("/dev/vda1").bound_to(&inventory().devices[0])),
            size,
            ..Partition::default()
        }
    }

    fn solved(partitions: Vec<Partition>, lvs: Vec<LogicalVolume>) -> Config {
        let mut config = Config {
            drives: vec![Drive {
                partitions,
                ..Drive::default()
            }],
            volume_groups: vec![VolumeGroup {
                logical_volumes: lvs,
                ..VolumeGroup::default()
            }],
            ..Config::default()
        };
        solve(&mut config, &inventory(), &product());
        config
    }

    #[test]
    fn reused_devices_keep_their_size() {
        let config = solved(
            vec![reused(Size::default()), reused(Size::resize_if_needed())],
            Vec::new(),
        );

        let partitions = &config.drives[0].partitions;
        assert_eq!(
            partitions[0].size,
            Size::default_with(SizeValue::Bytes(10 * GIB), SizeValue::Bytes(10 * GIB))
        );
        assert_eq!(
            partitions[1].size,
            Size::range(SizeValue::Bytes(0), SizeValue::Bytes(10 * GIB))
        );
    }

    #[test]
    fn new_devices_take_the_product_size() {
        let root = LogicalVolume {
            filesystem: Some(Filesystem::mounted_at("/")),
            ..LogicalVolume::default()
        };
        let current = Partition {
            size: Size::range(SizeValue::Bytes(GIB), SizeValue::Current),
            ..Partition::default()
        };
        let explicit = Partition {
            size: Size::fixed(GIB),
            ..Partition::default()
        };

        let config = solved(vec![current, explicit], vec![root]);

        assert_eq!(
            config.volume_groups[0].logical_volumes[0].size,
            Size::default_with(SizeValue::Bytes(5 * GIB), SizeValue::Bytes(20 * GIB))
        );
        assert_eq!(
            config.drives[0].partitions[0].size,
            Size::default_with(SizeValue::Bytes(100 * MIB), SizeValue::Unlimited)
        );
        assert_eq!(config.drives[0].partitions[1].size, Size::fixed(GIB));
    }

    #[test]
    fn stale_defaults_are_refilled() {
        let root = LogicalVolume {
            filesystem: Some(Filesystem::mounted_at("/")),
            size: Size::default_with(SizeValue::Bytes(GIB), SizeValue::Bytes(GIB)),
            ..LogicalVolume::default()
        };

        let config = solved(Vec::new(), vec![root]);
        assert_eq!(
            config.volume_groups[0].logical_volumes[0].size.min,
            Some(SizeValue::Bytes(5 * GIB))
        );
    }
}
