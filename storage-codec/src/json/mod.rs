// SPDX-License-Identifier: GPL-3.0-only

//! Wire JSON codec
//!
//! Absent fields decode to "unset" so that encoding omits them again; every
//! decoding failure names the offending path.

pub mod from_json;
pub mod generate;
pub mod to_json;

mod reader;

pub use from_json::from_json;
pub use to_json::to_json;

/// Decoder behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject unknown keys instead of ignoring them
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl DecodeOptions {
    pub fn lenient() -> Self {
        Self { strict: false }
    }
}
