//! # Schema Registry
//!
//! File-system lookup of schemas by name. Every `*.json` file in the
//! registry directory is addressable by its file stem (`event.json` is
//! schema `event`). The registry only resolves names to text; it never
//! interprets schemas beyond parsing them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cdv_core::CoreError;
use serde_json::Value;
use thiserror::Error;

/// Errors returned by registry lookups.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry directory could not be listed.
    #[error("cannot read schema directory {path}: {reason}")]
    DirectoryUnreadable {
        /// Directory that was scanned.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// No schema with this name exists.
    #[error("Unknown schema: {name}. Available schemas: [{}]", .available.join(", "))]
    UnknownSchema {
        /// Requested name.
        name: String,
        /// Names that do exist, sorted.
        available: Vec<String>,
    },

    /// The schema file exists but could not be read.
    #[error("failed to read schema {path}: {reason}")]
    SchemaRead {
        /// Path of the schema file.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// The schema file is not valid JSON.
    #[error(transparent)]
    InvalidSchemaJson(#[from] CoreError),
}

/// Schemas available in one directory, indexed by file stem.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schema_dir: PathBuf,
    schemas: BTreeMap<String, PathBuf>,
}

impl SchemaRegistry {
    /// Index every `*.json` file directly inside `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DirectoryUnreadable`] if the directory
    /// cannot be listed.
    pub fn open(schema_dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let schema_dir = schema_dir.into();
        let unreadable = |e: std::io::Error| RegistryError::DirectoryUnreadable {
            path: schema_dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut schemas = BTreeMap::new();
        for entry in std::fs::read_dir(&schema_dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                schemas.insert(stem.to_string(), path.clone());
            }
        }

        tracing::debug!(
            schema_dir = %schema_dir.display(),
            schema_count = schemas.len(),
            "indexed schema registry"
        );

        Ok(Self {
            schema_dir,
            schemas,
        })
    }

    /// Directory the registry was opened on.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Number of indexed schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Schema names, sorted alphabetically.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// File path of a named schema.
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.schemas.get(name).map(PathBuf::as_path)
    }

    /// Raw text of a named schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSchema`] for unknown names and
    /// [`RegistryError::SchemaRead`] if the file cannot be read.
    pub fn load_text(&self, name: &str) -> Result<String, RegistryError> {
        let path = self
            .path(name)
            .ok_or_else(|| RegistryError::UnknownSchema {
                name: name.to_string(),
                available: self.schemas.keys().cloned().collect(),
            })?;
        std::fs::read_to_string(path).map_err(|e| RegistryError::SchemaRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Parsed JSON of a named schema.
    ///
    /// # Errors
    ///
    /// As [`SchemaRegistry::load_text`], plus
    /// [`RegistryError::InvalidSchemaJson`] when the text does not parse.
    pub fn load(&self, name: &str) -> Result<Value, RegistryError> {
        let text = self.load_text(name)?;
        Ok(cdv_core::parse_schema_text(name, &text)?)
    }
}
