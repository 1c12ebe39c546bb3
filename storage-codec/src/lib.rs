// SPDX-License-Identifier: GPL-3.0-only

//! Codecs for storage configurations
//!
//! - **json**: the wire JSON schema, plus expansion of `generate` entries
//! - **model**: the simplified model used by guided installers
//!
//! Every call is a pure conversion; product defaults and the device
//! inventory are passed in explicitly.

pub mod json;
pub mod model;

pub use json::{DecodeOptions, from_json, to_json};
pub use model::{ModelConfig, from_model, to_model};
