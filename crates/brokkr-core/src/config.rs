//! YAML configuration store
//!
//! One file (`config.yaml` under the Brokkr home) holds everything the CLI
//! persists, including the clone registry under `environment.clones`. The
//! store only deals in whole-file reads and writes; callers that need a
//! read-modify-write sequence take the advisory lock for its full duration,
//! not just the individual read or write.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};

use camino::Utf8PathBuf;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::paths::PathsConfig;

/// Root of the persisted configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub environment: EnvironmentSection,
}

/// The `environment` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSection {
    /// Registered clones: name -> absolute path
    #[serde(default)]
    pub clones: BTreeMap<String, String>,
}

/// Guard holding the store's exclusive advisory lock
///
/// The lock is released when the guard is dropped (the OS releases the
/// advisory lock on close).
pub struct StoreLock {
    _file: File,
}

/// Handle to the on-disk configuration store
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: Utf8PathBuf,
    lock_path: Utf8PathBuf,
}

impl ConfigStore {
    /// Create a store handle for the given layout
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            config_path: paths.config_file(),
            lock_path: paths.config_lock_file(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Utf8PathBuf {
        &self.config_path
    }

    /// Acquire the exclusive lock guarding read-modify-write sequences
    pub fn lock(&self) -> Result<StoreLock> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(StoreLock { _file: file })
    }

    /// Read the configuration; a missing file reads as the empty config
    pub fn read(&self) -> Result<Config> {
        if !self.config_path.exists() {
            debug!("No config file at {}, using defaults", self.config_path);
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Write the configuration back, creating parent directories as needed
    pub fn write(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(config)?;
        std::fs::write(&self.config_path, content)?;
        debug!(
            "Saved config with {} registered clones",
            config.environment.clones.len()
        );
        Ok(())
    }

    /// Remove the whole store from disk (factory reset)
    ///
    /// Global and independent of any single clone; missing file is fine.
    pub fn delete(&self) -> Result<()> {
        if self.config_path.exists() {
            std::fs::remove_file(&self.config_path)?;
        }
        if self.lock_path.exists() {
            std::fs::remove_file(&self.lock_path)?;
        }
        Ok(())
    }
}
