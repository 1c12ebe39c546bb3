//! Common utility helpers shared across models

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Deserializer, Serializer};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Convert bytes to human-readable binary units (e.g., "1.50 GiB")
pub fn bytes_to_pretty(bytes: u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = bytes as f64;

    while val >= 1024. && steps < UNITS.len() - 1 {
        val /= 1024.;
        steps += 1;
    }

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, UNITS[steps], bytes_str)
    } else {
        format!("{:.2} {}", val, UNITS[steps])
    }
}

/// Parse human-readable format to bytes (e.g., "1.5 GiB", "10G", "512 MiB", "4096")
///
/// Units are always binary, so "KB" and "KiB" both mean 1024 bytes.
pub fn pretty_to_bytes(pretty: &str) -> Result<u64> {
    let trimmed = pretty.trim();
    let split_at = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);

    if number.is_empty() {
        return Err(anyhow::anyhow!("Invalid size: {}", pretty));
    }

    let steps: u32 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" | "kib" => 1,
        "m" | "mb" | "mib" => 2,
        "g" | "gb" | "gib" => 3,
        "t" | "tb" | "tib" => 4,
        "p" | "pb" | "pib" => 5,
        "e" | "eb" | "eib" => 6,
        other => return Err(anyhow::anyhow!("Invalid unit: {}", other)),
    };
    let factor = 1024_u64.pow(steps);

    if let Ok(whole) = number.parse::<u64>() {
        return whole
            .checked_mul(factor)
            .ok_or_else(|| anyhow::anyhow!("Size out of range: {}", pretty));
    }

    let val: f64 = number.parse()?;
    let bytes = val * factor as f64;
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(anyhow::anyhow!("Size out of range: {}", pretty));
    }

    Ok(bytes as u64)
}

/// Normalize a mount path the way paths are compared across templates and configs
///
/// Repeated and trailing slashes and `.` components are dropped. Non-absolute
/// values such as `swap` are returned as they are.
pub fn clean_path(path: &str) -> String {
    if !path.starts_with('/') {
        return path.to_string();
    }

    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    format!("/{}", parts.join("/"))
}

/// Whether two mount paths point to the same place
pub fn same_path(left: &str, right: &str) -> bool {
    clean_path(left) == clean_path(right)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Pretty(String),
}

impl RawSize {
    fn into_bytes<E: serde::de::Error>(self) -> std::result::Result<u64, E> {
        match self {
            RawSize::Bytes(bytes) => Ok(bytes),
            RawSize::Pretty(pretty) => pretty_to_bytes(&pretty).map_err(E::custom),
        }
    }
}

/// Serde adapter for byte sizes written either as integers or as strings like "10 GiB"
pub mod byte_size {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        RawSize::deserialize(deserializer)?.into_bytes()
    }
}

/// Optional variant of [`byte_size`]
pub mod byte_size_opt {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(bytes),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match Option::<RawSize>::deserialize(deserializer)? {
            Some(raw) => raw.into_bytes().map(Some),
            None => Ok(None),
        }
    }
}
