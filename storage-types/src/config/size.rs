//! Size limits for partitions and logical volumes

use std::fmt;

use crate::common::bytes_to_pretty;

/// One bound of a size range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeValue {
    /// An exact byte count
    Bytes(u64),

    /// Whatever the reused device currently has
    Current,

    /// No upper bound
    Unlimited,
}

impl SizeValue {
    pub fn bytes(self) -> Option<u64> {
        match self {
            SizeValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_current(self) -> bool {
        matches!(self, SizeValue::Current)
    }

    pub fn is_zero(self) -> bool {
        matches!(self, SizeValue::Bytes(0))
    }

    /// Add two bounds; unlimited absorbs everything and `current` is kept as is
    pub fn saturating_add(self, other: SizeValue) -> SizeValue {
        match (self, other) {
            (SizeValue::Bytes(left), SizeValue::Bytes(right)) => {
                SizeValue::Bytes(left.saturating_add(right))
            }
            (SizeValue::Unlimited, _) | (_, SizeValue::Unlimited) => SizeValue::Unlimited,
            (SizeValue::Current, _) | (_, SizeValue::Current) => SizeValue::Current,
        }
    }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Bytes(bytes) => write!(f, "{}", bytes_to_pretty(*bytes, false)),
            SizeValue::Current => write!(f, "current"),
            SizeValue::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Size range of a device
///
/// `default` marks a size taken from the product (new devices) or from the
/// device itself (reused devices). A fresh default size has no bounds yet;
/// the solver fills them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size {
    pub default: bool,
    pub min: Option<SizeValue>,
    pub max: Option<SizeValue>,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            default: true,
            min: None,
            max: None,
        }
    }
}

impl Size {
    /// Explicit range
    pub fn range(min: SizeValue, max: SizeValue) -> Self {
        Self {
            default: false,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Explicit size with min and max equal
    pub fn fixed(bytes: u64) -> Self {
        Self::range(SizeValue::Bytes(bytes), SizeValue::Bytes(bytes))
    }

    /// Shrink down to nothing if space is needed, otherwise keep the current size
    pub fn resize_if_needed() -> Self {
        Self::range(SizeValue::Bytes(0), SizeValue::Current)
    }

    /// Default size with already known bounds
    pub fn default_with(min: SizeValue, max: SizeValue) -> Self {
        Self {
            default: true,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Default size that still has to be filled by the solver
    pub fn is_unfilled(&self) -> bool {
        self.default && self.min.is_none() && self.max.is_none()
    }

    pub fn has_current(&self) -> bool {
        self.min.is_some_and(SizeValue::is_current) || self.max.is_some_and(SizeValue::is_current)
    }

    /// Explicit range starting at zero, as used to free space from existing devices
    pub fn shrinks_to_zero(&self) -> bool {
        !self.default && self.min.is_some_and(SizeValue::is_zero)
    }

    /// Explicit size with equal bounds
    pub fn is_fixed(&self) -> bool {
        !self.default && self.min.is_some() && self.min == self.max
    }

    /// Replace `current` bounds with the given device size
    pub fn with_current(&self, device_size: u64) -> Self {
        let replace = |value: Option<SizeValue>| match value {
            Some(SizeValue::Current) => Some(SizeValue::Bytes(device_size)),
            other => other,
        };

        Self {
            default: self.default,
            min: replace(self.min),
            max: replace(self.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::GIB;

    #[test]
    fn default_size_is_unfilled() {
        let size = Size::default();
        assert!(size.default);
        assert!(size.is_unfilled());
        assert!(!size.has_current());
    }

    #[test]
    fn resize_if_needed_shrinks_to_zero() {
        let size = Size::resize_if_needed();
        assert!(size.shrinks_to_zero());
        assert!(size.has_current());
        assert!(!size.is_fixed());
    }

    #[test]
    fn current_is_replaced_by_device_size() {
        let size = Size::resize_if_needed().with_current(10 * GIB);
        assert_eq!(size.min, Some(SizeValue::Bytes(0)));
        assert_eq!(size.max, Some(SizeValue::Bytes(10 * GIB)));
    }

    #[test]
    fn unlimited_absorbs_additions() {
        assert_eq!(
            SizeValue::Bytes(GIB).saturating_add(SizeValue::Unlimited),
            SizeValue::Unlimited
        );
        assert_eq!(
            SizeValue::Bytes(GIB).saturating_add(SizeValue::Bytes(GIB)),
            SizeValue::Bytes(2 * GIB)
        );
    }
}
