//! Configuration loading and management
//!
//! Handles parsing of `.tamo.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".tamo.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the data file lives
    #[serde(default)]
    pub storage: StorageConfig,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Markdown ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// External editor settings
    #[serde(default)]
    pub editor: EditorConfig,
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory, relative to the working directory
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Data file name inside the data directory
    #[serde(default = "default_storage_file")]
    pub file: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".tamo")
}

fn default_storage_file() -> String {
    "data.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            file: default_storage_file(),
        }
    }
}

/// Display-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Number of id characters shown in listings
    #[serde(default = "default_short_id_len")]
    pub short_id_len: usize,
}

fn default_short_id_len() -> usize {
    8
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            short_id_len: default_short_id_len(),
        }
    }
}

/// Ingestion-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Title used for documents read from stdin that carry no heading
    #[serde(default = "default_stdin_title")]
    pub stdin_title: String,
}

fn default_stdin_title() -> String {
    "Task from stdin".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            stdin_title: default_stdin_title(),
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Editor command; `$VISUAL`, `$EDITOR` and `vi` are tried when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from a `.tamo.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage.dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.dir cannot be empty".to_string(),
            ));
        }
        let file = self.storage.file.trim();
        if file.is_empty() {
            return Err(Error::InvalidConfig(
                "storage.file cannot be empty".to_string(),
            ));
        }
        if file.contains('/') || file.contains('\\') {
            return Err(Error::InvalidConfig(format!(
                "storage.file must be a bare file name, got '{file}'"
            )));
        }
        if !(4..=36).contains(&self.display.short_id_len) {
            return Err(Error::InvalidConfig(format!(
                "display.short_id_len must be between 4 and 36, got {}",
                self.display.short_id_len
            )));
        }
        if self.ingest.stdin_title.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "ingest.stdin_title cannot be empty".to_string(),
            ));
        }
        if let Some(command) = self.editor.command.as_deref() {
            if command.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "editor.command cannot be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}
