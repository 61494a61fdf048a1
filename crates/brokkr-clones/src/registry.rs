//! The persisted clone registry
//!
//! Maps human-readable names to clone paths inside the shared config store.
//! The registry never trusts what it reads: every operation re-validates
//! the raw entries against the filesystem, drops anything stale or
//! duplicated, and writes the clean set back. External tampering (deleted
//! paths, hand-edited duplicates) is therefore corrected on the next read.
//!
//! The whole read-validate-rewrite sequence runs under one exclusive file
//! lock; locking only the read or only the write would leave a race window
//! for a second process.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::clone::Clone;
use crate::error::{Error, Result};
use crate::scan;
use brokkr_core::{Config, ConfigStore, PathsConfig};

/// Registry of named clones over the shared configuration store
#[derive(Debug, Clone)]
pub struct Registry {
    store: ConfigStore,
}

impl Registry {
    /// Create a registry over the store at the given layout
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            store: ConfigStore::new(paths),
        }
    }

    /// List all registered clones
    ///
    /// Self-healing read: prunes entries whose paths vanished, entries that
    /// no longer validate, and duplicate paths, then rewrites the surviving
    /// set to storage. The prune-and-rewrite is intentional behavior of a
    /// read.
    pub async fn list(&self) -> Result<Vec<Clone>> {
        let _lock = self.store.lock()?;
        let mut config = self.store.read()?;
        let clones = self.validate_entries(&config).await;
        self.persist(&mut config, &clones)?;
        Ok(clones)
    }

    /// Register a clone of `path` under `name`
    ///
    /// Fails when the path is already registered, unless `force` replaces
    /// the previous entry for that path. Name collisions (case-insensitive)
    /// always fail.
    pub async fn register(&self, name: &str, path: &Utf8Path, force: bool) -> Result<Clone> {
        let clone = Clone::new(name, path).await?;

        let _lock = self.store.lock()?;
        let mut config = self.store.read()?;
        let mut clones = self.validate_entries(&config).await;

        if let Some(pos) = clones.iter().position(|c| c.path() == clone.path()) {
            if !force {
                return Err(Error::name_conflict(format!(
                    "path {} is already registered as '{}'",
                    clone.path(),
                    clones[pos].name()
                )));
            }
            clones.remove(pos);
        }
        if clones
            .iter()
            .any(|c| c.name().eq_ignore_ascii_case(clone.name()))
        {
            return Err(Error::name_conflict(format!(
                "a clone named '{}' already exists",
                clone.name()
            )));
        }

        clones.push(clone.clone());
        self.persist(&mut config, &clones)?;
        Ok(clone)
    }

    /// Rename a registered clone in place (identity change only)
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<Clone> {
        Clone::validate_name(new_name)?;

        let _lock = self.store.lock()?;
        let mut config = self.store.read()?;
        let mut clones = self.validate_entries(&config).await;

        if clones
            .iter()
            .any(|c| c.name().eq_ignore_ascii_case(new_name))
        {
            return Err(Error::name_conflict(format!(
                "a clone named '{new_name}' already exists"
            )));
        }
        let clone = clones
            .iter_mut()
            .find(|c| c.name().eq_ignore_ascii_case(old_name))
            .ok_or_else(|| Error::not_found(old_name))?;
        clone.set_name(new_name.to_string());
        let renamed = clone.clone();

        self.persist(&mut config, &clones)?;
        Ok(renamed)
    }

    /// Remove a clone from the registry (the directory is untouched)
    pub async fn unregister(&self, clone: &Clone) -> Result<()> {
        let _lock = self.store.lock()?;
        let mut config = self.store.read()?;
        let mut clones = self.validate_entries(&config).await;
        clones.retain(|c| c.path() != clone.path());
        self.persist(&mut config, &clones)
    }

    /// Remove every clone from the registry
    pub async fn unregister_all(&self) -> Result<()> {
        let _lock = self.store.lock()?;
        let mut config = self.store.read()?;
        self.persist(&mut config, &[])
    }

    /// Find a clone by name (case-insensitive), then by path
    pub async fn lookup(&self, query: &str) -> Result<Clone> {
        let clones = self.list().await?;
        if let Some(clone) = clones
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(query))
        {
            return Ok(clone.clone());
        }
        if let Ok(path) = scan::normalize(Utf8Path::new(query)) {
            if let Some(clone) = clones.iter().find(|c| c.path() == path) {
                return Ok(clone.clone());
            }
        }
        Err(Error::not_found(query))
    }

    /// Wipe the whole configuration store (factory reset)
    pub fn clear_config(&self) -> Result<()> {
        self.store.delete()?;
        Ok(())
    }

    /// Turn raw stored entries into validated clones
    ///
    /// Skips: paths that no longer exist, entries whose construction fails,
    /// and duplicate paths (first entry wins).
    async fn validate_entries(&self, config: &Config) -> Vec<Clone> {
        let mut seen: HashSet<Utf8PathBuf> = HashSet::new();
        let mut clones = Vec::new();

        for (name, raw_path) in &config.environment.clones {
            let path = Utf8Path::new(raw_path);
            if !path.exists() {
                warn!("Dropping registered clone '{}': {} no longer exists", name, raw_path);
                continue;
            }
            let clone = match Clone::new(name, path).await {
                Ok(clone) => clone,
                Err(e) => {
                    warn!("Dropping registered clone '{}': {}", name, e);
                    continue;
                }
            };
            if !seen.insert(clone.path().to_path_buf()) {
                warn!(
                    "Dropping duplicate registration '{}' for {}",
                    name,
                    clone.path()
                );
                continue;
            }
            clones.push(clone);
        }
        clones
    }

    /// Write the validated set back to storage
    fn persist(&self, config: &mut Config, clones: &[Clone]) -> Result<()> {
        config.environment.clones = clones
            .iter()
            .map(|c| (c.name().to_string(), c.path().to_string()))
            .collect();
        self.store.write(config)?;
        debug!("Registry now holds {} clones", clones.len());
        Ok(())
    }
}
