//! Resolved filesystem layout for a Brokkr process
//!
//! All ambient path lookups happen exactly once, here. Components receive a
//! `PathsConfig` by reference instead of probing environment variables or
//! the user profile themselves.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::Result;
use crate::product;
use crate::utils::get_home_dir;

/// Filesystem locations used by every Brokkr component
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Brokkr home directory (config, default clones, staging)
    home: Utf8PathBuf,
}

impl PathsConfig {
    /// Resolve the layout from the environment
    ///
    /// Honors `BROKKR_HOME`, otherwise defaults to `~/.brokkr`.
    pub fn discover() -> Result<Self> {
        if let Ok(home) = std::env::var(product::HOME_ENV_VAR) {
            return Ok(Self::with_home(Utf8PathBuf::from(home)));
        }
        Ok(Self::with_home(get_home_dir()?.join(".brokkr")))
    }

    /// Build a layout rooted at an explicit home directory
    pub fn with_home(home: Utf8PathBuf) -> Self {
        Self { home }
    }

    /// The Brokkr home directory
    pub fn home(&self) -> &Utf8Path {
        &self.home
    }

    /// The configuration file backing the registry
    pub fn config_file(&self) -> Utf8PathBuf {
        self.home.join("config.yaml")
    }

    /// Lock file guarding configuration read-modify-write sequences
    pub fn config_lock_file(&self) -> Utf8PathBuf {
        self.home.join("config.lock")
    }

    /// Directory new clones install into when no destination is given
    pub fn clones_dir(&self) -> Utf8PathBuf {
        self.home.join("clones")
    }

    /// Staging directory used while deploying an image for `name`
    pub fn stage_dir(&self, name: &str) -> Utf8PathBuf {
        self.home.join("stage").join(name)
    }

    /// Create the home directory if it does not exist yet
    pub fn ensure_home(&self) -> Result<()> {
        std::fs::create_dir_all(&self.home)?;
        Ok(())
    }
}
