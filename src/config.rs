//! Configuration for vault loading
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (loreweave.toml)
//! - Environment variables (LOREWEAVE_*)
//!
//! ## Example config file (loreweave.toml):
//! ```toml
//! [vault]
//! root = "./world"
//! schema_path = "schema.json"
//! blocked_paths = ["drafts/", "_templates/"]
//!
//! [load]
//! workers = 4
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for a vault load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault settings
    #[serde(default)]
    pub vault: VaultSection,

    /// Load settings
    #[serde(default)]
    pub load: LoadSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Root directory of the vault
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Schema file path, relative to the root
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Gitignore-style patterns for paths to skip, merged with the
    /// schema's own blocked-path settings
    #[serde(default)]
    pub blocked_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSection {
    /// Parse worker count; 0 means available parallelism
    #[serde(default)]
    pub workers: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.json")
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            schema_path: default_schema_path(),
            blocked_paths: Vec::new(),
        }
    }
}

impl Default for LoadSection {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault: VaultSection::default(),
            load: LoadSection::default(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from defaults, an optional `loreweave.toml`, and
    /// `LOREWEAVE_*` environment overrides (e.g. `LOREWEAVE_LOAD__WORKERS`).
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = config_file {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("loreweave").required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("LOREWEAVE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Effective worker count for the parse pool.
    pub fn effective_workers(&self) -> usize {
        if self.load.workers > 0 {
            self.load.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VaultConfig::default();
        assert_eq!(config.vault.root, PathBuf::from("."));
        assert_eq!(config.vault.schema_path, PathBuf::from("schema.json"));
        assert!(config.vault.blocked_paths.is_empty());
        assert!(config.effective_workers() >= 1);
    }
}
