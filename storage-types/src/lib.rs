// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for storage configuration resolution
//!
//! This crate defines the single source of truth for the types shared by the
//! codecs and the solver:
//!
//! - **config**: the configuration graph (drives, partitions, volume groups, ...)
//! - **inventory**: the read-only snapshot of probed devices
//! - **product**: volume templates and product wide policies
//!
//! The three are plain data. Behavior lives in `storage-codec` and
//! `storage-solver`, which take inventory and product as explicit arguments.

pub mod common;
pub mod config;
pub mod error;
pub mod inventory;
pub mod product;

pub use common::{
    GIB, KIB, MIB, TIB, bytes_to_pretty, clean_path, pretty_to_bytes, same_path,
};
pub use config::{
    AliasOwner, Boot, BootDevice, BtrfsOptions, Config, DeviceRef, Drive, Encryption,
    EncryptionMethod, Filesystem, FilesystemKind, FilesystemType, IfNotFound, LogicalVolume,
    Luks1, Luks2, MdLevel, MdRaid, MountBy, Partition, PartitionId, PartitionTableType,
    PbkdFunction, PhysicalVolume, PhysicalVolumesGenerate, Search, SearchCondition, Size,
    SizeOperator, SizeValue, VolumeGroup,
};
pub use error::LoadError;
pub use inventory::{Device, DeviceKind, Inventory};
pub use product::{
    AutoSize, BtrfsTemplate, EncryptionPolicy, FallbackTemplate, Outline, ProductDefaults,
    SnapshotsIncrement, SpacePolicy, TemplateSize, VolumeTemplate,
};
