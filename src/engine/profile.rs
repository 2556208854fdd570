//! Profile variables
//!
//! A profile is an ordered list of key/value pairs loaded once before any
//! scenario runs. It is read-only input to variable resolution.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Error, Result};

/// A named set of profile variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: Vec<ProfileVariable>,
}

/// One `key = value` entry of a profile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProfileVariable {
    pub key: String,
    pub value: String,
}

impl ProfileVariable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Profile {
    /// Build a profile from ordered pairs
    pub fn from_pairs<K, V>(name: &str, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.to_string(),
            variables: pairs
                .into_iter()
                .map(|(k, v)| ProfileVariable::new(k, v))
                .collect(),
        }
    }

    /// Load a profile from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(source = %path.display(), "parse profile start");

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!(source = %path.display(), error = %source, "read profile failure");
            Error::ProfileRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content).map_err(|message| {
            tracing::error!(source = %path.display(), %message, "parse profile failure");
            Error::ProfileParse {
                path: path.to_path_buf(),
                message,
            }
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// First variable with the given key, in list order
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }
}
