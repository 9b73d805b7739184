use crate::config::SimulationConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::Path;

/// Load, resolve and validate a simulation configuration from a YAML file.
///
/// Relative paths inside the file are resolved against the directory the
/// file lives in.
pub fn load_config(config_path: &Path) -> Result<SimulationConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let mut config: SimulationConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    if let Some(base) = config_path.parent() {
        config.resolve_paths(base);
    }
    debug!("Resolved configuration: {:?}", config);

    Ok(config)
}

/// CLI arguments that override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_executions: Option<u64>,
    pub log_level: Option<String>,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut SimulationConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(max_executions) = overrides.max_executions {
        info!("Overriding max_executions: {} -> {}", config.max_executions, max_executions);
        config.max_executions = max_executions;
    }

    if let Some(level) = &overrides.log_level {
        config.log_level = Some(level.clone());
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
topology: topology.ns
cycle_interval: 10ms
max_executions: 3
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        let dir = temp_file.path().parent().unwrap();
        assert_eq!(config.topology_path(), dir.join("topology.ns"));
        assert_eq!(config.node_data_path(), dir);
        assert_eq!(config.max_executions, 3);
    }

    #[test]
    fn test_rejects_empty_topology() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "topology: \"\"\nmax_executions: 3\n").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("topology path cannot be empty"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_config(Path::new("/nonexistent/regionsim.yaml")).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "topology: t.ns\nmax_executions: 3\n").unwrap();
        let mut config = load_config(temp_file.path()).unwrap();

        let overrides = CliOverrides {
            max_executions: Some(7),
            log_level: None,
        };
        apply_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.max_executions, 7);

        let overrides = CliOverrides {
            max_executions: Some(0),
            log_level: None,
        };
        assert!(apply_overrides(&mut config, &overrides).is_err());
    }
}
