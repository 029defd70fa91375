//! # Worker Configuration
//!
//! Tunables of the validation worker, loadable from YAML. Every field has a
//! default, so an empty file (or no file) is a valid configuration:
//!
//! ```yaml
//! batch_size: 50
//! channel_capacity: 16
//! validate_formats: true
//! draft: draft2020-12   # optional; auto-detected from $schema when absent
//! ```

use std::path::Path;

use cdv_schema::{Draft, JsonSchemaEvaluator};
use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Number of row results per `resultsBatch` message.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Bound of the worker's response channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// JSON Schema draft names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftSetting {
    /// Draft 4.
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7.
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "draft2019-09")]
    Draft201909,
    /// Draft 2020-12.
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl From<DraftSetting> for Draft {
    fn from(setting: DraftSetting) -> Self {
        match setting {
            DraftSetting::Draft4 => Draft::Draft4,
            DraftSetting::Draft6 => Draft::Draft6,
            DraftSetting::Draft7 => Draft::Draft7,
            DraftSetting::Draft201909 => Draft::Draft201909,
            DraftSetting::Draft202012 => Draft::Draft202012,
        }
    }
}

/// Configuration of a validation worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Row results per batch message. Must be at least 1.
    pub batch_size: usize,
    /// Messages buffered between the worker and its consumer. Must be at
    /// least 1.
    pub channel_capacity: usize,
    /// Whether `format` keywords are asserted rather than annotated.
    pub validate_formats: bool,
    /// Fixed draft; `None` lets the evaluator detect it from `$schema`.
    pub draft: Option<DraftSetting>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            validate_formats: true,
            draft: None,
        }
    }
}

impl WorkerConfig {
    /// Parse and validate a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ConfigParse`] if the YAML is malformed and
    /// [`WorkerError::InvalidConfig`] if a value is out of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, WorkerError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| WorkerError::ConfigParse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::ConfigLoad`] if the file cannot be read or
    /// parsed, and [`WorkerError::InvalidConfig`] for out-of-range values.
    pub fn load(path: &Path) -> Result<Self, WorkerError> {
        let load_error = |reason: String| WorkerError::ConfigLoad {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_error(format!("cannot read file: {e}")))?;
        match Self::from_yaml_str(&content) {
            Err(WorkerError::ConfigParse { reason }) => Err(load_error(reason)),
            other => other,
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.batch_size == 0 {
            return Err(WorkerError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(WorkerError::InvalidConfig(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The `jsonschema`-backed evaluator this configuration describes.
    pub fn evaluator(&self) -> JsonSchemaEvaluator {
        let evaluator = JsonSchemaEvaluator::new().with_format_validation(self.validate_formats);
        match self.draft {
            Some(draft) => evaluator.with_draft(draft.into()),
            None => evaluator,
        }
    }
}
