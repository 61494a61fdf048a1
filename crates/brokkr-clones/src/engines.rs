//! Engine discovery and resolution
//!
//! Two discovery strategies that must agree on the result shape: the
//! structured manifest (authoritative when present) and the legacy scan
//! over version-numbered directories. Engines are recomputed from disk on
//! every query; nothing here caches.

use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::manifest::ProductManifest;
use crate::scan;
use brokkr_core::product;

/// A discoverable execution engine inside a clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    /// Ordered, comparable version token (e.g. 273)
    pub version: u32,

    /// Whether the engine may run scripts directly (vs. compile-only)
    pub runtime: bool,

    /// Engine directory (absolute)
    pub path: Utf8PathBuf,

    /// Loadable entry point file name
    pub assembly: String,

    /// Scripting kernel the engine embeds
    pub kernel: String,

    pub description: String,

    /// Host product identifiers the engine is compatible with
    pub compat_products: Vec<String>,
}

impl Engine {
    /// Full path of the loadable entry point
    pub fn assembly_path(&self) -> Utf8PathBuf {
        self.path.join(&self.assembly)
    }
}

/// An engine version request
///
/// The legacy wire format used `0` as a "latest" sentinel; the sum type
/// makes that rule a property of the type instead of a convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineQuery {
    /// Resolve to the highest discovered version
    Latest,
    /// Resolve to this exact version
    Exact(u32),
}

impl FromStr for EngineQuery {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        match s.parse::<u32>() {
            // 0 is reserved: never a real engine
            Ok(0) => Ok(Self::Latest),
            Ok(version) => Ok(Self::Exact(version)),
            Err(_) => Err(format!("invalid engine version '{s}' (expected 'latest' or a number)")),
        }
    }
}

impl std::fmt::Display for EngineQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// Discover all engines of the clone rooted at `clone_root`
///
/// Uses the structured manifest when one exists; a malformed manifest
/// degrades to an empty list with a warning so one broken clone never
/// blocks callers working with others. Without a manifest the legacy
/// directory scan applies.
pub fn discover(clone_root: &Utf8Path) -> Result<Vec<Engine>> {
    if ProductManifest::exists(clone_root) {
        return Ok(discover_structured(clone_root));
    }
    discover_legacy(clone_root)
}

fn discover_structured(clone_root: &Utf8Path) -> Vec<Engine> {
    let manifest = match ProductManifest::load(clone_root) {
        Ok(manifest) => manifest,
        Err(message) => {
            warn!(
                "Unreadable {} in {}: {}. Treating clone as having no engines",
                product::MANIFEST_FILE,
                clone_root,
                message
            );
            return Vec::new();
        }
    };

    manifest
        .engines
        .into_values()
        .map(|spec| Engine {
            version: spec.version,
            runtime: spec.runtime,
            path: clone_root.join(&spec.path),
            assembly: spec.assembly,
            kernel: spec.kernel,
            description: spec.description,
            compat_products: spec.compatproducts,
        })
        .collect()
}

fn discover_legacy(clone_root: &Utf8Path) -> Result<Vec<Engine>> {
    let engines_root = product::ENGINE_ROOTS
        .iter()
        .map(|rel| clone_root.join(rel))
        .find(|candidate| candidate.is_dir())
        .ok_or_else(|| {
            Error::resource_missing(clone_root.join(product::ENGINE_ROOTS[0]).as_str())
        })?;

    debug!("Scanning legacy engines under {}", engines_root);
    let engines = scan::find_versioned_engine_dirs(&engines_root)?
        .into_iter()
        .map(|(version, path)| legacy_engine(version, path))
        .collect();
    Ok(engines)
}

/// Build an engine from a bare version-numbered directory
///
/// Versions at or above the cutoff belong to the newer compile-only engine
/// generation and are excluded from direct script execution.
fn legacy_engine(version: u32, path: Utf8PathBuf) -> Engine {
    let runtime = version < product::LEGACY_RUNTIME_CUTOFF;
    let kernel = if runtime { "IronPython" } else { "CPython" };
    Engine {
        version,
        runtime,
        path,
        assembly: product::LEGACY_ENGINE_ASSEMBLY.to_string(),
        kernel: kernel.to_string(),
        description: format!("{kernel} {} engine", dotted(version)),
        compat_products: Vec::new(),
    }
}

/// `273` -> `2.7.3`
fn dotted(version: u32) -> String {
    let digits = format!("{version:03}");
    digits
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve one engine from a discovered set
///
/// `Latest` picks the true maximum; equal versions keep the earliest
/// discovered candidate because the comparison is strictly-greater. That
/// tie-break is observable but carries no semantics.
pub fn resolve(engines: &[Engine], query: EngineQuery) -> Result<&Engine> {
    match query {
        EngineQuery::Latest => {
            let mut best: Option<&Engine> = None;
            for engine in engines {
                if best.map_or(true, |b| engine.version > b.version) {
                    best = Some(engine);
                }
            }
            best.ok_or_else(|| Error::engine_not_found("latest (no engines discovered)"))
        }
        EngineQuery::Exact(version) => engines
            .iter()
            .find(|e| e.version == version)
            .ok_or_else(|| Error::engine_not_found(version.to_string())),
    }
}
