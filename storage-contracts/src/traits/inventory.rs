// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{Device, Inventory};

/// Read-only access to the probed devices, in probing order
///
/// Implemented by whatever snapshot the probing side hands over. The engine
/// never mutates it and keeps no reference to it between calls.
pub trait DeviceInventory: Send + Sync {
    fn devices(&self) -> &[Device];

    fn find(&self, name: &str) -> Option<&Device> {
        self.devices().iter().find(|device| device.name == name)
    }

    fn drives(&self) -> Vec<&Device> {
        self.devices().iter().filter(|d| d.is_drive()).collect()
    }

    fn md_raids(&self) -> Vec<&Device> {
        self.devices().iter().filter(|d| d.is_md_raid()).collect()
    }

    fn partitions_of(&self, parent: &str) -> Vec<&Device> {
        self.devices()
            .iter()
            .filter(|d| d.is_partition_of(parent))
            .collect()
    }
}

impl DeviceInventory for Inventory {
    fn devices(&self) -> &[Device] {
        &self.devices
    }
}

impl DeviceInventory for Vec<Device> {
    fn devices(&self) -> &[Device] {
        self
    }
}
