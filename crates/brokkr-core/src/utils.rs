//! Shared utility functions for Brokkr crates

use camino::Utf8PathBuf;

use crate::error::{Error, Result};

/// Get the user's home directory
///
/// Prefers the HOME environment variable over dirs::home_dir() because:
/// - In containers with volume mounts, HOME may be redirected
/// - dirs::home_dir() reads from /etc/passwd which doesn't respect env overrides
/// - Shell scripts use $HOME, so we need consistency with them
pub fn get_home_dir() -> Result<Utf8PathBuf> {
    // First check HOME environment variable
    if let Ok(home) = std::env::var("HOME") {
        return Ok(Utf8PathBuf::from(home));
    }

    // Fallback to dirs::home_dir() for non-container environments
    let home = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
    Utf8PathBuf::from_path_buf(home).map_err(|p| Error::non_utf8_path(p.display().to_string()))
}
