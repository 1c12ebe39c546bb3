// SPDX-License-Identifier: GPL-3.0-only

//! Simplified model codec
//!
//! The model is the document guided installers edit: drives with a space
//! policy and mount paths instead of searches and explicit space actions.
//! It can express less than the wire JSON, so `to_model` is lossy for
//! configurations the support checker rejects.

pub mod from_model;
pub mod schema;
pub mod to_model;

pub use from_model::{config_from_model, from_model};
pub use schema::{
    ModelBoot, ModelBootDevice, ModelConfig, ModelDrive, ModelEncryption, ModelFilesystem,
    ModelLogicalVolume, ModelMdRaid, ModelPartition, ModelSize, ModelVolumeGroup,
};
pub use to_model::{space_policy, to_model};
