//! Filesystem types taken from the volume templates

use storage_types::{BtrfsOptions, Config, Filesystem, FilesystemKind, ProductDefaults};

use crate::nodes::filesystems_mut;

pub(crate) fn solve(config: &mut Config, product: &ProductDefaults) {
    for filesystem in filesystems_mut(config) {
        fill_type(filesystem, product);
    }
}

fn fill_type(filesystem: &mut Filesystem, product: &ProductDefaults) {
    let template = product.default_filesystem_type(filesystem.path.as_deref());

    let Some(fs_type) = filesystem.fs_type.as_mut() else {
        filesystem.fs_type = Some(template);
        return;
    };

    // Btrfs without an explicit snapshots setting follows the template
    if fs_type.kind == FilesystemKind::Btrfs && template.kind == FilesystemKind::Btrfs {
        let options = fs_type.btrfs.get_or_insert_with(BtrfsOptions::default);
        if options.snapshots.is_none() {
            options.snapshots = Some(template.snapshots());
        }
    }
}
