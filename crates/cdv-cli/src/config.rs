//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`. Command-line flags override
//! the values it sets.
//!
//! ```yaml
//! schema_dir: ./schemas
//! worker:
//!   batch_size: 100
//!   validate_formats: false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cdv_worker::WorkerConfig;
use serde::Deserialize;

/// Schema directory used when neither flag nor config names one.
pub const DEFAULT_SCHEMA_DIR: &str = "schemas";

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Directory holding `*.json` schemas.
    pub schema_dir: Option<PathBuf>,
    /// Validation worker settings.
    pub worker: WorkerConfig,
}

impl CliConfig {
    /// Load a config file, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid YAML, or holds
    /// out-of-range worker values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?
        };
        config
            .worker
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Schema directory: the flag, then the config value, then
    /// [`DEFAULT_SCHEMA_DIR`].
    pub fn schema_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.schema_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_is_default() {
        let config = CliConfig::load(None).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.schema_dir(None), PathBuf::from("schemas"));
    }

    #[test]
    fn nested_worker_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdv.yaml");
        std::fs::write(&path, "schema_dir: /data/schemas\nworker:\n  batch_size: 7\n").unwrap();
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.worker.batch_size, 7);
        assert_eq!(config.worker.channel_capacity, 16);
        assert_eq!(config.schema_dir(None), PathBuf::from("/data/schemas"));
        assert_eq!(
            config.schema_dir(Some(Path::new("other"))),
            PathBuf::from("other")
        );
    }

    #[test]
    fn out_of_range_worker_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdv.yaml");
        std::fs::write(&path, "worker:\n  batch_size: 0\n").unwrap();
        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("batch_size"));
    }

    #[test]
    fn unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdv.yaml");
        std::fs::write(&path, "schemas: here\n").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
