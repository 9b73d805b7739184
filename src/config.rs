//! Simulation configuration.
//!
//! A simulation is described by a small YAML document naming the topology to
//! load and how long to run it:
//!
//! ```yaml
//! topology: scenarios/multinode/topology.ns
//! node_data_dir: scenarios/multinode
//! cycle_interval: 500ms
//! max_executions: 5
//! estimation_window: SHORT
//! log_level: info
//! ```

use crate::node::DEFAULT_CYCLE_INTERVAL;
use crate::report::EstimationWindow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Path to the topology file
    pub topology: String,
    /// Directory holding `<node>.json` documents. Defaults to the directory
    /// of the topology file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_data_dir: Option<String>,
    #[serde(with = "humantime_serde", default = "default_cycle_interval")]
    pub cycle_interval: Duration,
    /// Cycles every node must complete before the simulation stops
    pub max_executions: u64,
    #[serde(default)]
    pub estimation_window: EstimationWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_cycle_interval() -> Duration {
    DEFAULT_CYCLE_INTERVAL
}

impl SimulationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topology.trim().is_empty() {
            return Err(ValidationError::InvalidTopology(
                "topology path cannot be empty".to_string(),
            ));
        }

        if let Some(dir) = &self.node_data_dir {
            if dir.trim().is_empty() {
                return Err(ValidationError::InvalidTopology(
                    "node_data_dir cannot be empty when given".to_string(),
                ));
            }
        }

        if self.max_executions == 0 {
            return Err(ValidationError::InvalidExecution(
                "max_executions must be greater than 0".to_string(),
            ));
        }

        if self.cycle_interval.is_zero() {
            return Err(ValidationError::InvalidExecution(
                "cycle_interval must be greater than 0".to_string(),
            ));
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ValidationError::InvalidLogLevel(format!(
                    "'{}' is not one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }

        Ok(())
    }

    pub fn topology_path(&self) -> PathBuf {
        PathBuf::from(&self.topology)
    }

    /// Where per-node documents are looked up
    pub fn node_data_path(&self) -> PathBuf {
        match &self.node_data_dir {
            Some(dir) => PathBuf::from(dir),
            None => self
                .topology_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Resolve relative paths against `base`, normally the directory of the
    /// configuration file itself.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &str| -> String {
            let path = Path::new(path);
            if path.is_absolute() {
                path.display().to_string()
            } else {
                base.join(path).display().to_string()
            }
        };
        self.topology = resolve(&self.topology);
        self.node_data_dir = self.node_data_dir.as_deref().map(resolve);
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid execution configuration: {0}")]
    InvalidExecution(String),
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> SimulationConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("topology: net/topology.ns\nmax_executions: 3\n");
        assert_eq!(config.cycle_interval, Duration::from_secs(2));
        assert_eq!(config.estimation_window, EstimationWindow::Short);
        assert_eq!(config.node_data_path(), PathBuf::from("net"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
topology: scenarios/multinode/topology.ns
node_data_dir: scenarios/data
cycle_interval: 500ms
max_executions: 5
estimation_window: LONG
log_level: debug
"#,
        );
        assert_eq!(config.cycle_interval, Duration::from_millis(500));
        assert_eq!(config.estimation_window, EstimationWindow::Long);
        assert_eq!(config.node_data_path(), PathBuf::from("scenarios/data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let config = parse("topology: ''\nmax_executions: 3\n");
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTopology(_))));

        let config = parse("topology: t.ns\nmax_executions: 0\n");
        assert!(matches!(config.validate(), Err(ValidationError::InvalidExecution(_))));

        let config = parse("topology: t.ns\nmax_executions: 1\nlog_level: loud\n");
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = parse("topology: t.ns\nmax_executions: 1\n");
        config.resolve_paths(Path::new("/sims"));
        assert_eq!(config.topology, "/sims/t.ns");
        assert_eq!(config.node_data_path(), PathBuf::from("/sims"));
    }

    #[test]
    fn test_missing_max_executions_fails_to_parse() {
        assert!(serde_yaml::from_str::<SimulationConfig>("topology: t.ns\n").is_err());
    }
}
