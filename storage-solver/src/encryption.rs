//! Product encryption policy
//!
//! When the product makes encryption mandatory, every new device that can
//! hold it inherits the product method, except those mounted at one of the
//! product's unencrypted paths. LUKS2 devices without key derivation take
//! the product one.

use storage_types::{
    Config, Encryption, EncryptionMethod, Filesystem, PhysicalVolume, ProductDefaults,
};
use tracing::debug;

use crate::nodes::{encryptions_mut, partitions_mut};

pub(crate) fn solve(config: &mut Config, product: &ProductDefaults) {
    if product.encryption.mandatory {
        inherit_mandatory(config, product);
    }

    let Some(pbkd_function) = product.encryption.pbkd_function else {
        return;
    };
    for encryption in encryptions_mut(config) {
        if let Encryption::Luks2(luks2) = encryption
            && luks2.pbkd_function.is_none()
        {
            luks2.pbkd_function = Some(pbkd_function);
        }
    }
}

fn inherit_mandatory(config: &mut Config, product: &ProductDefaults) {
    let policy = &product.encryption;
    let encryption = Encryption::with_method(
        policy.method.unwrap_or(EncryptionMethod::Luks2),
        policy.password.clone(),
    );
    let excluded = |path: Option<&str>| path.is_some_and(|path| product.is_unencrypted_path(path));

    for partition in partitions_mut(config) {
        if partition.is_new() && partition.encryption.is_none() && !excluded(partition.mount_path()) {
            debug!(path = ?partition.mount_path(), "New partition inherits product encryption");
            partition.encryption = Some(encryption.clone());
        }
    }

    for drive in &mut config.drives {
        if formats_anew(drive.filesystem.as_ref()) && drive.encryption.is_none() && !excluded(drive.mount_path()) {
            drive.encryption = Some(encryption.clone());
        }
    }

    for md_raid in &mut config.md_raids {
        if formats_anew(md_raid.filesystem.as_ref())
            && md_raid.encryption.is_none()
            && !excluded(md_raid.mount_path())
        {
            md_raid.encryption = Some(encryption.clone());
        }
    }

    for vg in &mut config.volume_groups {
        for pv in &mut vg.physical_volumes {
            if let PhysicalVolume::Generate(generate) = pv
                && generate.encryption.is_none()
            {
                generate.encryption = Some(encryption.clone());
            }
        }
    }
}

/// Whole device formatted with a new filesystem
fn formats_anew(filesystem: Option<&Filesystem>) -> bool {
    filesystem.is_some_and(|fs| !fs.reuse_if_possible)
}
