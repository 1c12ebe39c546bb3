// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or unknown-shaped input document
///
/// Fatal to the single conversion call. `path` points into the document,
/// e.g. `drives[0].partitions[1].size.min`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Invalid config at {path}: {message}")]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveErrorKind {
    Unresolved,
    AmbiguousAlias,
}

impl SolveErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::Unresolved => 404,
            Self::AmbiguousAlias => 409,
        }
    }
}

/// Failure to bind a configuration to the inventory
///
/// Fatal to the single solve call; retrying reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolveError {
    #[error("No device found for the search at {path}")]
    Unresolved { path: String },

    #[error("Ambiguous alias '{alias}': {reason}")]
    AmbiguousAlias { alias: String, reason: String },
}

impl SolveError {
    pub fn unresolved(path: impl Into<String>) -> Self {
        Self::Unresolved { path: path.into() }
    }

    pub fn ambiguous_alias(alias: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmbiguousAlias {
            alias: alias.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> SolveErrorKind {
        match self {
            Self::Unresolved { .. } => SolveErrorKind::Unresolved,
            Self::AmbiguousAlias { .. } => SolveErrorKind::AmbiguousAlias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_error_roundtrips() {
        let error = SolveError::unresolved("drives[0]");
        let json = serde_json::to_string(&error).expect("serialize error");
        assert!(json.contains("\"kind\":\"unresolved\""));

        let parsed: SolveError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
        assert_eq!(parsed.kind(), SolveErrorKind::Unresolved);
    }

    #[test]
    fn messages_name_the_offending_place() {
        let error = SchemaError::new("drives[1].search", "expected a string or an object");
        assert_eq!(
            error.to_string(),
            "Invalid config at drives[1].search: expected a string or an object"
        );

        let error = SolveError::ambiguous_alias("pv0", "no device defines it");
        assert_eq!(error.kind().code(), 409);
        assert_eq!(
            error.to_string(),
            "Ambiguous alias 'pv0': no device defines it"
        );
    }
}
