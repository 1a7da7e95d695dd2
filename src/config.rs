use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kgraph: KgraphConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// KGraph-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KgraphConfig {
    /// Default snapshot location; overridden by `--graph` on the CLI.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Query defaults, used when the CLI flags are omitted
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_max_depth")]
    pub default_max_depth: usize,
    #[serde(default = "default_confidence_target")]
    pub default_confidence_target: f64,
    /// Optional wall-clock budget per query, in milliseconds.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

impl Default for KgraphConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            default_confidence_target: default_confidence_target(),
            time_budget_ms: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kgraph: KgraphConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("graph.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    3
}

fn default_confidence_target() -> f64 {
    0.7
}

impl Config {
    /// Load configuration from file.
    ///
    /// Looks for the config file in this order:
    /// 1. Path specified in KGRAPH_CONFIG environment variable
    /// 2. ./kgraph.toml in current directory
    ///
    /// A missing ./kgraph.toml is not an error: built-in defaults apply. An
    /// explicit KGRAPH_CONFIG that cannot be read is an error.
    pub fn load() -> Result<Self> {
        match std::env::var("KGRAPH_CONFIG") {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let default_path = Path::new("kgraph.toml");
                if default_path.exists() {
                    Self::load_from(default_path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load and validate configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.query.default_max_depth == 0 {
            anyhow::bail!("query.default_max_depth must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.query.default_confidence_target) {
            anyhow::bail!("query.default_confidence_target must be between 0.0 and 1.0");
        }

        if self.query.time_budget_ms == Some(0) {
            anyhow::bail!("query.time_budget_ms must be greater than 0 when set");
        }

        Ok(())
    }

    /// Get the snapshot path
    pub fn snapshot_path(&self) -> &Path {
        &self.kgraph.snapshot_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_no_file() {
        let config = Config::default();
        assert_eq!(config.query.default_max_depth, 3);
        assert!((config.query.default_confidence_target - 0.7).abs() < 1e-9);
        assert_eq!(config.kgraph.log_level, "info");
        assert_eq!(config.snapshot_path(), Path::new("graph.json"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kgraph.toml");
        fs::write(
            &config_path,
            r#"
[kgraph]
snapshot_path = "corpus/graph.json"
log_level = "debug"

[query]
default_max_depth = 5
default_confidence_target = 0.6
time_budget_ms = 2000
"#,
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.kgraph.log_level, "debug");
        assert_eq!(config.query.default_max_depth, 5);
        assert_eq!(config.query.time_budget_ms, Some(2000));
        assert_eq!(config.snapshot_path(), Path::new("corpus/graph.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kgraph.toml");
        fs::write(&config_path, "[query]\ndefault_max_depth = 7\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.query.default_max_depth, 7);
        assert!((config.query.default_confidence_target - 0.7).abs() < 1e-9);
        assert_eq!(config.kgraph.log_level, "info");
    }

    #[test]
    fn test_invalid_confidence_target_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kgraph.toml");
        fs::write(&config_path, "[query]\ndefault_confidence_target = 1.5\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("default_confidence_target"));
    }

    #[test]
    fn test_zero_max_depth_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("kgraph.toml");
        fs::write(&config_path, "[query]\ndefault_max_depth = 0\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load_from(Path::new("definitely-not-here.toml"));
        assert!(result.is_err());
    }
}
