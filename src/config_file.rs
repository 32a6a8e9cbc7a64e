//! Operator configuration handling.
//!
//! The lifecycle framework hands the plugin a flat mapping of option names
//! to scalar values. On disk this is a JSON object; `null` entries are
//! treated as unset and nested values are rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BackendError, Result};

/// Options that must be set before the backend can be configured
pub const MANDATORY_CONFIG: &[&str] = &[
    "protocol",
    "product",
    "username",
    "password",
    "storage-pool",
    "rest-url",
];

/// A single scalar option value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ConfigValue {
    /// Whether the value counts as set for mandatory-field purposes
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Boolean interpretation used for flags such as `use-multipath`
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "1"
            ),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Matches how the driver configuration has always spelled booleans
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// Flat operator configuration keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigInput {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON object file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_json(value)
    }

    /// Build configuration from an already-parsed JSON value
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(BackendError::config("configuration must be a JSON object"));
        };

        let mut config = Self::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => continue,
                Value::Bool(b) => ConfigValue::Bool(b),
                Value::Number(n) => ConfigValue::Number(n),
                Value::String(s) => ConfigValue::Text(s),
                Value::Array(_) | Value::Object(_) => {
                    return Err(BackendError::config(format!(
                        "option '{key}' must be a scalar value"
                    )));
                }
            };
            config.values.insert(key, value);
        }
        Ok(config)
    }

    /// Set an option, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Value of `key` if it is set to something other than a blank string
    pub fn get_non_blank(&self, key: &str) -> Option<&ConfigValue> {
        self.get(key).filter(|v| !v.is_blank())
    }

    /// Textual form of `key`, as it would appear in the rendered file
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    /// True when `key` is set to a truthy value
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(ConfigValue::is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigInput
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
