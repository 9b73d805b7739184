//! Per-node configuration sources.

use super::parser::FormatError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplies the configuration document of a node by name.
///
/// A node without configuration gets an empty JSON object, never an error.
pub trait NodeConfigLookup {
    fn node_config(&self, name: &str) -> Result<Value, FormatError>;
}

fn empty_config() -> Value {
    Value::Object(Map::new())
}

/// Every node has an empty configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyConfigLookup;

impl NodeConfigLookup for EmptyConfigLookup {
    fn node_config(&self, _name: &str) -> Result<Value, FormatError> {
        Ok(empty_config())
    }
}

/// Configurations held in memory
#[derive(Debug, Default, Clone)]
pub struct MapConfigLookup {
    configs: HashMap<String, Value>,
}

impl MapConfigLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, config: Value) -> Self {
        self.configs.insert(name.into(), config);
        self
    }
}

impl NodeConfigLookup for MapConfigLookup {
    fn node_config(&self, name: &str) -> Result<Value, FormatError> {
        Ok(self.configs.get(name).cloned().unwrap_or_else(empty_config))
    }
}

/// Reads `<dir>/<name>.json`; a missing file means an empty configuration
#[derive(Debug, Clone)]
pub struct DirectoryConfigLookup {
    dir: PathBuf,
}

impl DirectoryConfigLookup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl NodeConfigLookup for DirectoryConfigLookup {
    fn node_config(&self, name: &str) -> Result<Value, FormatError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(empty_config());
        }

        let node_config_error = |reason: String| FormatError::NodeConfig {
            node: name.to_string(),
            path: path.clone(),
            reason,
        };

        let content = fs::read_to_string(&path).map_err(|e| node_config_error(e.to_string()))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| node_config_error(e.to_string()))?;
        if !value.is_object() {
            return Err(node_config_error("top-level value is not an object".to_string()));
        }
        Ok(value)
    }
}
