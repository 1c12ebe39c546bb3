//! Path-tracking accessors over `serde_json` values

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use storage_contracts::SchemaError;

use super::DecodeOptions;

pub(crate) type Result<T> = std::result::Result<T, SchemaError>;

/// Location inside the document being decoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct JsonPath(String);

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    pub fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::new(self.to_string(), message)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("$")
        } else {
            f.write_str(&self.0)
        }
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn as_string(value: &Value, path: &JsonPath) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| path.error(format!("expected a string, got {}", type_name(value))))
}

pub(crate) fn as_u64(value: &Value, path: &JsonPath) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| path.error(format!("expected a non-negative integer, got {value}")))
}

/// Accessor over one JSON object of the document
pub(crate) struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: JsonPath,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a Value, path: &JsonPath) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                path: path.clone(),
            }),
            other => Err(path.error(format!("expected an object, got {}", type_name(other)))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.map.keys().map(String::as_str)
    }

    /// Reject (strict) or ignore (lenient) keys outside `known`
    pub fn check_keys(&self, known: &[&str], options: &DecodeOptions) -> Result<()> {
        for key in self.map.keys() {
            if known.contains(&key.as_str()) {
                continue;
            }

            if options.strict {
                return Err(self.path.key(key).error("unknown key"));
            }

            tracing::warn!("Ignoring unknown key {}", self.path.key(key));
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<(&'a Value, JsonPath)> {
        self.map.get(key).map(|value| (value, self.path.key(key)))
    }

    pub fn string(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
            .map(|(value, path)| as_string(value, &path))
            .transpose()
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>> {
        self.get(key)
            .map(|(value, path)| {
                value.as_bool().ok_or_else(|| {
                    path.error(format!("expected a boolean, got {}", type_name(value)))
                })
            })
            .transpose()
    }

    pub fn u32(&self, key: &str) -> Result<Option<u32>> {
        self.get(key)
            .map(|(value, path)| {
                let number = as_u64(value, &path)?;
                u32::try_from(number).map_err(|_| path.error(format!("{number} is too big")))
            })
            .transpose()
    }

    /// Value parsed from a string through `FromStr`
    pub fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = String>,
    {
        self.get(key)
            .map(|(value, path)| as_string(value, &path)?.parse().map_err(|e| path.error(e)))
            .transpose()
    }

    pub fn strings(&self, key: &str) -> Result<Option<Vec<String>>> {
        let Some((value, path)) = self.get(key) else {
            return Ok(None);
        };

        let items = value
            .as_array()
            .ok_or_else(|| path.error(format!("expected an array, got {}", type_name(value))))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| as_string(item, &path.index(index)))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Items of an array, with their paths; an absent key gives no items
    pub fn array(&self, key: &str) -> Result<Vec<(&'a Value, JsonPath)>> {
        let Some((value, path)) = self.get(key) else {
            return Ok(Vec::new());
        };

        let items = value
            .as_array()
            .ok_or_else(|| path.error(format!("expected an array, got {}", type_name(value))))?;

        Ok(items
            .iter()
            .enumerate()
            .map(|(index, item)| (item, path.index(index)))
            .collect())
    }
}
