/// Device to install the boot loader on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootDevice {
    /// Let the solver pick the device holding root
    pub default: bool,

    /// Alias of the chosen device
    pub device_alias: Option<String>,
}

impl Default for BootDevice {
    fn default() -> Self {
        Self {
            default: true,
            device_alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boot {
    pub configure: bool,
    pub device: BootDevice,
}

impl Default for Boot {
    fn default() -> Self {
        Self {
            configure: true,
            device: BootDevice::default(),
        }
    }
}

impl Boot {
    pub fn on_alias(alias: impl Into<String>) -> Self {
        Self {
            configure: true,
            device: BootDevice {
                default: false,
                device_alias: Some(alias.into()),
            },
        }
    }

    pub fn disabled() -> Self {
        Self {
            configure: false,
            device: BootDevice::default(),
        }
    }
}
