//! Filesystem search for clone roots and engine directories
//!
//! Callers may hand us a path at, inside, or above a clone root. The upward
//! walk covers the first two; the downward walk covers staged extractions
//! where the real product sits one or more levels below the given path.
//! Both searches are iterative with an explicit work list, so pathological
//! trees cannot blow the stack.

use std::collections::HashSet;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::clone::Clone;
use crate::error::{Error, Result};

/// Walk parent directories upward from `start` (inclusive) until one
/// verifies as a clone root. Returns the first match.
pub async fn find_root_above(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut current = Some(start);
    while let Some(path) = current {
        if Clone::is_valid(path).await {
            debug!("Found clone root above: {}", path);
            return Some(path.to_path_buf());
        }
        current = path.parent();
    }
    None
}

/// Depth-first search into `start` for the first descendant directory that
/// verifies as a clone root. `start` itself is checked first.
///
/// Only used when the upward search fails. No ordering guarantee among
/// siblings; a visited set guards against symlink cycles.
pub async fn find_root_below(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut work = vec![start.to_path_buf()];
    let mut visited: HashSet<PathBuf> = HashSet::new();

    while let Some(path) = work.pop() {
        let identity = path
            .as_std_path()
            .canonicalize()
            .unwrap_or_else(|_| path.clone().into_std_path_buf());
        if !visited.insert(identity) {
            continue;
        }

        if Clone::is_valid(&path).await {
            debug!("Found clone root below: {}", path);
            return Some(path);
        }

        let Ok(entries) = path.read_dir_utf8() else {
            continue;
        };
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                work.push(entry.into_path());
            }
        }
    }
    None
}

/// List immediate subdirectories of `engines_root` whose name is exactly
/// three ASCII digits, parsed as an integer engine version.
///
/// Non-matching directories are silently skipped. Fails when the root
/// itself does not exist.
pub fn find_versioned_engine_dirs(engines_root: &Utf8Path) -> Result<Vec<(u32, Utf8PathBuf)>> {
    if !engines_root.is_dir() {
        return Err(Error::resource_missing(engines_root.as_str()));
    }

    let mut found = Vec::new();
    for entry in engines_root.read_dir_utf8()?.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        if let Some(version) = parse_engine_dir_name(entry.file_name()) {
            found.push((version, entry.into_path()));
        }
    }
    Ok(found)
}

/// Parse a directory name as a legacy engine version: exactly 3 ASCII digits
fn parse_engine_dir_name(name: &str) -> Option<u32> {
    if name.len() != 3 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Canonicalize a path for identity comparisons at the registry boundary
pub fn normalize(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let canonical = path.as_std_path().canonicalize()?;
    Utf8PathBuf::from_path_buf(canonical)
        .map_err(|p| brokkr_core::Error::non_utf8_path(p.display().to_string()).into())
}
