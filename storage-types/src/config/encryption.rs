//! Encryption settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key derivation function used by LUKS2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PbkdFunction {
    Pbkdf2,
    Argon2i,
    Argon2id,
}

impl PbkdFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            PbkdFunction::Pbkdf2 => "pbkdf2",
            PbkdFunction::Argon2i => "argon2i",
            PbkdFunction::Argon2id => "argon2id",
        }
    }
}

impl FromStr for PbkdFunction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pbkdf2" => Ok(PbkdFunction::Pbkdf2),
            "argon2i" => Ok(PbkdFunction::Argon2i),
            "argon2id" => Ok(PbkdFunction::Argon2id),
            other => Err(format!("unknown pbkdFunction '{other}'")),
        }
    }
}

/// Encryption method, as named by the product and the simplified model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncryptionMethod {
    Luks1,
    Luks2,
    PervasiveLuks2,
    TpmFde,
    ProtectedSwap,
    SecureSwap,
    RandomSwap,
}

impl EncryptionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            EncryptionMethod::Luks1 => "luks1",
            EncryptionMethod::Luks2 => "luks2",
            EncryptionMethod::PervasiveLuks2 => "pervasiveLuks2",
            EncryptionMethod::TpmFde => "tpmFde",
            EncryptionMethod::ProtectedSwap => "protectedSwap",
            EncryptionMethod::SecureSwap => "secureSwap",
            EncryptionMethod::RandomSwap => "randomSwap",
        }
    }

    /// Methods with a volatile key, only meaningful for swap
    pub fn is_swap_only(self) -> bool {
        matches!(
            self,
            EncryptionMethod::ProtectedSwap
                | EncryptionMethod::SecureSwap
                | EncryptionMethod::RandomSwap
        )
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Luks1 {
    pub password: Option<String>,
    pub key_size: Option<u32>,
    pub cipher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Luks2 {
    pub password: Option<String>,
    pub key_size: Option<u32>,
    pub cipher: Option<String>,
    pub pbkd_function: Option<PbkdFunction>,
    pub label: Option<String>,
}

/// Encryption of a block device, one variant per method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encryption {
    Luks1(Luks1),
    Luks2(Luks2),
    PervasiveLuks2 { password: Option<String> },
    TpmFde { password: Option<String> },
    ProtectedSwap,
    SecureSwap,
    RandomSwap,
}

impl Encryption {
    /// Build an encryption with only the method and password set
    pub fn with_method(method: EncryptionMethod, password: Option<String>) -> Self {
        match method {
            EncryptionMethod::Luks1 => Encryption::Luks1(Luks1 {
                password,
                ..Luks1::default()
            }),
            EncryptionMethod::Luks2 => Encryption::Luks2(Luks2 {
                password,
                ..Luks2::default()
            }),
            EncryptionMethod::PervasiveLuks2 => Encryption::PervasiveLuks2 { password },
            EncryptionMethod::TpmFde => Encryption::TpmFde { password },
            EncryptionMethod::ProtectedSwap => Encryption::ProtectedSwap,
            EncryptionMethod::SecureSwap => Encryption::SecureSwap,
            EncryptionMethod::RandomSwap => Encryption::RandomSwap,
        }
    }

    pub fn method(&self) -> EncryptionMethod {
        match self {
            Encryption::Luks1(_) => EncryptionMethod::Luks1,
            Encryption::Luks2(_) => EncryptionMethod::Luks2,
            Encryption::PervasiveLuks2 { .. } => EncryptionMethod::PervasiveLuks2,
            Encryption::TpmFde { .. } => EncryptionMethod::TpmFde,
            Encryption::ProtectedSwap => EncryptionMethod::ProtectedSwap,
            Encryption::SecureSwap => EncryptionMethod::SecureSwap,
            Encryption::RandomSwap => EncryptionMethod::RandomSwap,
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self {
            Encryption::Luks1(luks) => luks.password.as_deref(),
            Encryption::Luks2(luks) => luks.password.as_deref(),
            Encryption::PervasiveLuks2 { password } | Encryption::TpmFde { password } => {
                password.as_deref()
            }
            Encryption::ProtectedSwap | Encryption::SecureSwap | Encryption::RandomSwap => None,
        }
    }
}
