use thiserror::Error;

/// Errors raised while loading product defaults or a device inventory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl LoadError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
