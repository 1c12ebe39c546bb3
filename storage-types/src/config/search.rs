//! Device searches
//!
//! A search describes how to locate existing devices. The solver binds it to
//! inventory devices and records the bound device by name only.

use std::fmt;
use std::str::FromStr;

use crate::inventory::Device;

/// What to do when a search matches nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfNotFound {
    #[default]
    Error,
    Skip,
    Create,
}

impl IfNotFound {
    pub fn as_str(self) -> &'static str {
        match self {
            IfNotFound::Error => "error",
            IfNotFound::Skip => "skip",
            IfNotFound::Create => "create",
        }
    }
}

impl FromStr for IfNotFound {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "error" => Ok(IfNotFound::Error),
            "skip" => Ok(IfNotFound::Skip),
            "create" => Ok(IfNotFound::Create),
            other => Err(format!("unknown ifNotFound value '{other}'")),
        }
    }
}

/// Comparison used by size conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOperator {
    Equal,
    Greater,
    Less,
}

impl SizeOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            SizeOperator::Equal => "equal",
            SizeOperator::Greater => "greater",
            SizeOperator::Less => "less",
        }
    }

    pub fn all() -> [SizeOperator; 3] {
        [SizeOperator::Equal, SizeOperator::Greater, SizeOperator::Less]
    }
}

/// Restriction applied to candidate devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCondition {
    /// Exact device name (e.g., "/dev/vda")
    Name(String),

    /// Device size compared against a byte count
    Size { operator: SizeOperator, value: u64 },

    /// Partition number within its parent
    Number(u32),
}

impl SearchCondition {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            SearchCondition::Name(name) => device.name == *name,
            SearchCondition::Size { operator, value } => match operator {
                SizeOperator::Equal => device.size == *value,
                SizeOperator::Greater => device.size > *value,
                SizeOperator::Less => device.size < *value,
            },
            SearchCondition::Number(number) => device.number == Some(*number),
        }
    }
}

/// Weak reference to an inventory device
///
/// Only the device name is kept; the device itself is looked up again in
/// whatever inventory snapshot the caller holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef(String);

impl DeviceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn lookup<'a>(&self, devices: &'a [Device]) -> Option<&'a Device> {
        devices.iter().find(|device| device.name == self.0)
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Search {
    pub condition: Option<SearchCondition>,
    pub if_not_found: IfNotFound,
    pub max: Option<u32>,

    /// Device bound by the solver
    pub resolved: Option<DeviceRef>,
}

impl Search {
    /// Search for a device by name, failing if it does not exist
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            condition: Some(SearchCondition::Name(name.into())),
            ..Self::default()
        }
    }

    /// Match every remaining device, skipping the node if there is none
    pub fn catch_all() -> Self {
        Self {
            if_not_found: IfNotFound::Skip,
            ..Self::default()
        }
    }

    /// Implicit search of a drive without search: the first free device
    pub fn first_device() -> Self {
        Self {
            max: Some(1),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.condition {
            Some(SearchCondition::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// No condition and no limit: every candidate matches
    pub fn is_catch_all(&self) -> bool {
        self.condition.is_none() && self.max.is_none()
    }

    /// Carries no information at all, which is the same as having no search
    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
            && self.max.is_none()
            && self.if_not_found == IfNotFound::Error
            && self.resolved.is_none()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.resolved.as_ref().map(DeviceRef::name)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn skips_device(&self) -> bool {
        self.resolved.is_none() && self.if_not_found == IfNotFound::Skip
    }

    pub fn creates_device(&self) -> bool {
        self.resolved.is_none() && self.if_not_found == IfNotFound::Create
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.matches(device))
    }

    /// Copy of this search bound to the given device
    pub fn bound_to(&self, device: &Device) -> Self {
        Self {
            resolved: Some(DeviceRef::new(device.name.clone())),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::GIB;
    use crate::inventory::DeviceKind;

    fn partition(name: &str, number: u32, size: u64) -> Device {
        Device {
            name: name.to_string(),
            kind: DeviceKind::Partition,
            size,
            partition_table: None,
            parent: Some("/dev/vda".to_string()),
            number: Some(number),
            filesystem: None,
        }
    }

    #[test]
    fn empty_search_is_catch_all_but_not_skip() {
        let search = Search::default();
        assert!(search.is_empty());
        assert!(search.is_catch_all());
        assert!(!Search::catch_all().is_empty());
        assert!(Search::catch_all().is_catch_all());
        assert!(!Search::first_device().is_catch_all());
    }

    #[test]
    fn conditions_filter_devices() {
        let vda1 = partition("/dev/vda1", 1, 2 * GIB);

        assert!(Search::by_name("/dev/vda1").matches(&vda1));
        assert!(!Search::by_name("/dev/vda2").matches(&vda1));

        let bigger = Search {
            condition: Some(SearchCondition::Size {
                operator: SizeOperator::Greater,
                value: GIB,
            }),
            ..Search::default()
        };
        assert!(bigger.matches(&vda1));

        let second = Search {
            condition: Some(SearchCondition::Number(2)),
            ..Search::default()
        };
        assert!(!second.matches(&vda1));
    }

    #[test]
    fn bound_search_keeps_condition() {
        let vda1 = partition("/dev/vda1", 1, GIB);
        let bound = Search::catch_all().bound_to(&vda1);

        assert_eq!(bound.device_name(), Some("/dev/vda1"));
        assert!(bound.is_catch_all());
        assert!(!bound.skips_device());
        assert_eq!(
            bound.resolved.as_ref().and_then(|r| r.lookup(std::slice::from_ref(&vda1))),
            Some(&vda1)
        );
    }

    #[test]
    fn parses_if_not_found() {
        assert_eq!("skip".parse::<IfNotFound>(), Ok(IfNotFound::Skip));
        assert!("maybe".parse::<IfNotFound>().is_err());
    }
}
