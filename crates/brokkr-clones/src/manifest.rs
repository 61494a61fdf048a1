//! `Brokkrfile` - structured per-clone manifest
//!
//! Newer clones ship a TOML manifest at their root describing the engines
//! they contain and the named deployment subsets an image install may copy.
//! Older clones have neither table; engine discovery falls back to the
//! legacy directory scan.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use brokkr_core::product;

/// Parsed `Brokkrfile`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductManifest {
    /// Engine definitions keyed by engine id
    #[serde(default)]
    pub engines: BTreeMap<String, EngineSpec>,

    /// Deployment subsets keyed by name: relative paths to copy
    #[serde(default)]
    pub deployments: BTreeMap<String, Vec<String>>,
}

/// One `[engines.<id>]` table
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSpec {
    pub version: u32,

    /// Newer field; older manifests omit it, so be flexible and assume a
    /// runtime engine.
    #[serde(default = "default_runtime")]
    pub runtime: bool,

    /// Engine directory, relative to the clone root
    pub path: String,

    #[serde(default = "default_assembly")]
    pub assembly: String,

    pub kernel: String,
    pub description: String,
    pub compatproducts: Vec<String>,
}

fn default_runtime() -> bool {
    true
}

fn default_assembly() -> String {
    product::LEGACY_ENGINE_ASSEMBLY.to_string()
}

impl ProductManifest {
    /// Manifest path for a clone root
    pub fn path_for(clone_root: &Utf8Path) -> Utf8PathBuf {
        clone_root.join(product::MANIFEST_FILE)
    }

    /// Whether a clone carries a structured manifest
    pub fn exists(clone_root: &Utf8Path) -> bool {
        Self::path_for(clone_root).is_file()
    }

    /// Read and parse the manifest of a clone
    pub fn load(clone_root: &Utf8Path) -> std::result::Result<Self, String> {
        let path = Self::path_for(clone_root);
        let content = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
        toml::from_str(&content).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[engines.IPY273]
version = 273
path = "bin/engines/273"
kernel = "IronPython"
description = "IronPython 2.7.3 engine"
compatproducts = ["2024", "2025"]

[engines.CPY340]
version = 340
runtime = false
path = "bin/engines/340"
assembly = "BrokkrRunner.dll"
kernel = "CPython"
description = "CPython 3.4 engine"
compatproducts = ["2025"]

[deployments]
core = ["bin", "brokkrlib"]
full = ["bin", "brokkrlib", "extras"]
"#;

    #[test]
    fn test_parse_sample() {
        let manifest: ProductManifest = toml::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.engines.len(), 2);
        assert_eq!(manifest.deployments.len(), 2);

        let ipy = &manifest.engines["IPY273"];
        assert_eq!(ipy.version, 273);
        assert!(ipy.runtime, "runtime defaults to true when omitted");
        assert_eq!(ipy.assembly, product::LEGACY_ENGINE_ASSEMBLY);

        let cpy = &manifest.engines["CPY340"];
        assert!(!cpy.runtime);
        assert_eq!(cpy.assembly, "BrokkrRunner.dll");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        assert!(!ProductManifest::exists(root));

        std::fs::write(ProductManifest::path_for(root), SAMPLE).unwrap();
        assert!(ProductManifest::exists(root));

        let manifest = ProductManifest::load(root).unwrap();
        assert_eq!(manifest.deployments["core"], vec!["bin", "brokkrlib"]);
    }

    #[test]
    fn test_load_malformed_is_an_error() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(ProductManifest::path_for(root), "engines = 3").unwrap();
        assert!(ProductManifest::load(root).is_err());
    }
}
