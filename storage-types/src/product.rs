//! Product defaults
//!
//! Per mount path volume templates plus the product wide storage policies.
//! Loaded from the product definition; never modified by the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::{MIB, byte_size, byte_size_opt, clean_path, pretty_to_bytes};
use crate::config::{
    BtrfsOptions, EncryptionMethod, FilesystemKind, FilesystemType, PbkdFunction, Size, SizeValue,
};
use crate::error::{LoadError, Result};

/// How the space of a drive is made available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacePolicy {
    #[default]
    Keep,
    Delete,
    Resize,
    Custom,
}

impl SpacePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            SpacePolicy::Keep => "keep",
            SpacePolicy::Delete => "delete",
            SpacePolicy::Resize => "resize",
            SpacePolicy::Custom => "custom",
        }
    }
}

/// Product encryption policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncryptionPolicy {
    /// Method used when encryption is enabled without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EncryptionMethod>,

    /// Key derivation for LUKS2 devices that do not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbkd_function: Option<PbkdFunction>,

    /// Every new device must be encrypted with `method`
    #[serde(default)]
    pub mandatory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Growth applied to default sizes when btrfs snapshots are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotsIncrement {
    Percent(u32),
    Bytes(u64),
}

impl SnapshotsIncrement {
    pub fn apply(self, value: SizeValue) -> SizeValue {
        match (self, value) {
            (SnapshotsIncrement::Percent(percent), SizeValue::Bytes(bytes)) => {
                let grown = u128::from(bytes) * (100 + u128::from(percent)) / 100;
                SizeValue::Bytes(u64::try_from(grown).unwrap_or(u64::MAX))
            }
            (SnapshotsIncrement::Bytes(extra), SizeValue::Bytes(bytes)) => {
                SizeValue::Bytes(bytes.saturating_add(extra))
            }
            (_, other) => other,
        }
    }
}

impl FromStr for SnapshotsIncrement {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(percent) = value.trim().strip_suffix('%') {
            return percent
                .trim()
                .parse()
                .map(SnapshotsIncrement::Percent)
                .map_err(|error| format!("invalid percentage '{value}': {error}"));
        }

        pretty_to_bytes(value)
            .map(SnapshotsIncrement::Bytes)
            .map_err(|error| error.to_string())
    }
}

impl fmt::Display for SnapshotsIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotsIncrement::Percent(percent) => write!(f, "{percent}%"),
            SnapshotsIncrement::Bytes(bytes) => write!(f, "{bytes}"),
        }
    }
}

impl Serialize for SnapshotsIncrement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotsIncrement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Size computed from the configuration instead of fixed limits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutoSize {
    #[serde(default, with = "byte_size_opt")]
    pub base_min: Option<u64>,

    #[serde(default, with = "byte_size_opt")]
    pub base_max: Option<u64>,

    /// Paths whose min size is added when they are not configured
    #[serde(default)]
    pub min_fallback_for: Vec<String>,

    /// Paths whose max size is added when they are not configured
    #[serde(default)]
    pub max_fallback_for: Vec<String>,

    #[serde(default)]
    pub snapshots_increment: Option<SnapshotsIncrement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateSize {
    /// Use the outline auto size
    #[serde(default)]
    pub auto: bool,

    #[serde(default, with = "byte_size_opt")]
    pub min: Option<u64>,

    /// No max means unlimited
    #[serde(default, with = "byte_size_opt")]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BtrfsTemplate {
    #[serde(default)]
    pub snapshots: bool,

    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outline {
    /// The volume is proposed by default and cannot be removed
    #[serde(default)]
    pub required: bool,

    /// Filesystems offered for the volume
    #[serde(default)]
    pub filesystems: Vec<FilesystemKind>,

    #[serde(default)]
    pub snapshots_configurable: bool,

    #[serde(default)]
    pub auto_size: Option<AutoSize>,
}

/// Defaults for a given mount path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeTemplate {
    /// Empty for the template applying to any other path
    #[serde(default)]
    pub mount_path: String,

    #[serde(default = "default_filesystem")]
    pub filesystem: FilesystemKind,

    #[serde(default)]
    pub btrfs: BtrfsTemplate,

    #[serde(default)]
    pub size: TemplateSize,

    #[serde(default)]
    pub mount_options: Vec<String>,

    #[serde(default)]
    pub outline: Outline,
}

fn default_filesystem() -> FilesystemKind {
    FilesystemKind::Ext4
}

impl Default for VolumeTemplate {
    fn default() -> Self {
        Self {
            mount_path: String::new(),
            filesystem: default_filesystem(),
            btrfs: BtrfsTemplate::default(),
            size: TemplateSize::default(),
            mount_options: Vec::new(),
            outline: Outline::default(),
        }
    }
}

impl VolumeTemplate {
    fn auto_size(&self) -> Option<&AutoSize> {
        if self.size.auto {
            self.outline.auto_size.as_ref()
        } else {
            None
        }
    }

    /// Limits before adjusting to the rest of the configuration
    pub fn base_limits(&self) -> (u64, SizeValue) {
        let (min, max) = match self.auto_size() {
            Some(auto) => (auto.base_min, auto.base_max),
            None => (self.size.min, self.size.max),
        };

        (min.unwrap_or(0), max.map_or(SizeValue::Unlimited, SizeValue::Bytes))
    }

    /// Filesystem type proposed by this template, marked as default
    pub fn filesystem_type(&self) -> FilesystemType {
        let btrfs = (self.filesystem == FilesystemKind::Btrfs).then(|| BtrfsOptions {
            snapshots: Some(self.btrfs.snapshots),
        });

        FilesystemType {
            default: true,
            kind: self.filesystem,
            btrfs,
        }
    }
}

/// Template used when neither the path nor the generic template exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackTemplate {
    #[serde(default = "default_filesystem")]
    pub filesystem: FilesystemKind,

    #[serde(default = "default_fallback_min", with = "byte_size")]
    pub min: u64,

    /// No max means unlimited
    #[serde(default, with = "byte_size_opt")]
    pub max: Option<u64>,
}

fn default_fallback_min() -> u64 {
    100 * MIB
}

impl Default for FallbackTemplate {
    fn default() -> Self {
        Self {
            filesystem: default_filesystem(),
            min: default_fallback_min(),
            max: None,
        }
    }
}

impl FallbackTemplate {
    fn to_template(&self) -> VolumeTemplate {
        VolumeTemplate {
            filesystem: self.filesystem,
            size: TemplateSize {
                auto: false,
                min: Some(self.min),
                max: self.max,
            },
            ..VolumeTemplate::default()
        }
    }
}

fn default_unencrypted_paths() -> Vec<String> {
    vec!["/boot/zipl".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDefaults {
    /// Space policy of model drives that do not set one
    #[serde(default)]
    pub space_policy: SpacePolicy,

    #[serde(default)]
    pub encryption: EncryptionPolicy,

    /// Mount paths never encrypted, whatever the product policy says
    #[serde(default = "default_unencrypted_paths")]
    pub unencrypted_paths: Vec<String>,

    /// Paths proposed by `generate: "default"`
    #[serde(default)]
    pub default_paths: Vec<String>,

    /// Paths proposed by `generate: "mandatory"`
    #[serde(default)]
    pub mandatory_paths: Vec<String>,

    #[serde(default)]
    pub fallback_template: FallbackTemplate,

    #[serde(default)]
    pub volume_templates: Vec<VolumeTemplate>,
}

impl Default for ProductDefaults {
    fn default() -> Self {
        Self {
            space_policy: SpacePolicy::default(),
            encryption: EncryptionPolicy::default(),
            unencrypted_paths: default_unencrypted_paths(),
            default_paths: Vec::new(),
            mandatory_paths: Vec::new(),
            fallback_template: FallbackTemplate::default(),
            volume_templates: Vec::new(),
        }
    }
}

impl ProductDefaults {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let product: ProductDefaults =
            toml::from_str(raw).map_err(|error| LoadError::Parse(error.to_string()))?;
        product.validate()?;
        Ok(product)
    }

    pub fn with_templates(templates: Vec<VolumeTemplate>) -> Self {
        Self {
            volume_templates: templates,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (index, template) in self.volume_templates.iter().enumerate() {
            let field = format!("volume_templates[{index}]");

            let duplicated = self.volume_templates[..index]
                .iter()
                .any(|other| clean_path(&other.mount_path) == clean_path(&template.mount_path));
            if duplicated {
                return Err(LoadError::invalid(
                    format!("{field}.mount_path"),
                    format!("duplicate template for '{}'", template.mount_path),
                ));
            }

            if let (Some(min), Some(max)) = (template.size.min, template.size.max)
                && min > max
            {
                return Err(LoadError::invalid(
                    format!("{field}.size"),
                    format!("min {min} is bigger than max {max}"),
                ));
            }

            if let Some(auto) = &template.outline.auto_size
                && let (Some(min), Some(max)) = (auto.base_min, auto.base_max)
                && min > max
            {
                return Err(LoadError::invalid(
                    format!("{field}.outline.auto_size"),
                    format!("base_min {min} is bigger than base_max {max}"),
                ));
            }
        }

        if self.encryption.mandatory && self.encryption.method.is_none() {
            return Err(LoadError::invalid(
                "encryption.method",
                "mandatory encryption needs a method",
            ));
        }

        Ok(())
    }

    /// Template for a mount path: the path one, the generic one, or the fallback
    pub fn template_for(&self, path: Option<&str>) -> VolumeTemplate {
        let key = path.map(clean_path).unwrap_or_default();

        let found = self
            .volume_templates
            .iter()
            .find(|template| !key.is_empty() && clean_path(&template.mount_path) == key)
            .or_else(|| {
                self.volume_templates
                    .iter()
                    .find(|template| template.mount_path.is_empty())
            });

        match found {
            Some(template) => template.clone(),
            None => self.fallback_template.to_template(),
        }
    }

    /// Default size of a new volume mounted at `path`
    ///
    /// `having_paths` are the mount paths present in the configuration; the
    /// fallback sizes of absent paths are added to auto sized volumes.
    pub fn default_size(&self, path: Option<&str>, having_paths: &[String], snapshots: bool) -> Size {
        let template = self.template_for(path);

        let Some(auto) = template.auto_size() else {
            let (min, max) = template.base_limits();
            return Size::default_with(SizeValue::Bytes(min), max);
        };

        let missing =
            |candidate: &String| !having_paths.iter().any(|p| clean_path(p) == clean_path(candidate));

        let (base_min, base_max) = template.base_limits();
        let mut min = SizeValue::Bytes(base_min);
        let mut max = base_max;

        for fallback in auto.min_fallback_for.iter().filter(|p| missing(p)) {
            let (extra, _) = self.template_for(Some(fallback)).base_limits();
            min = min.saturating_add(SizeValue::Bytes(extra));
        }

        for fallback in auto.max_fallback_for.iter().filter(|p| missing(p)) {
            let (_, extra) = self.template_for(Some(fallback)).base_limits();
            max = max.saturating_add(extra);
        }

        if snapshots && let Some(increment) = auto.snapshots_increment {
            min = increment.apply(min);
            max = increment.apply(max);
        }

        Size::default_with(min, max)
    }

    /// Filesystem type proposed for a mount path
    pub fn default_filesystem_type(&self, path: Option<&str>) -> FilesystemType {
        self.template_for(path).filesystem_type()
    }

    pub fn is_unencrypted_path(&self, path: &str) -> bool {
        self.unencrypted_paths
            .iter()
            .any(|excluded| clean_path(excluded) == clean_path(path))
    }
}
