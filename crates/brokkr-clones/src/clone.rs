//! The Clone entity
//!
//! A clone is a named, registered installation of the toolkit. The struct
//! holds only identity (name) and location (root path). Branch, commit,
//! origin, engines, and module version are derived on demand so external
//! changes to the directory are always observed.

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};

use crate::deploy;
use crate::engines::{self, Engine, EngineQuery};
use crate::error::{Error, Result};
use crate::{git, scan};
use brokkr_core::product;

/// A registered (or registrable) installation of the toolkit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clone {
    name: String,
    path: Utf8PathBuf,
}

impl Clone {
    /// Build a clone from a name and an arbitrary path
    ///
    /// The path may point at, inside, or above the actual clone root; the
    /// root is located by searching upward first, then downward. An empty
    /// name derives the deterministic `Unnamed-<hash>` form.
    ///
    /// # Errors
    /// `NameConflict` for reserved names, `InvalidClone` when no root is
    /// found in either direction.
    pub async fn new(name: &str, path: &Utf8Path) -> Result<Self> {
        let root = match scan::find_root_above(path).await {
            Some(root) => root,
            None => scan::find_root_below(path).await.ok_or_else(|| {
                Error::invalid_clone(path.as_str(), "no clone root at, above, or below this path")
            })?,
        };
        let root = scan::normalize(&root)?;

        let name = if name.is_empty() {
            Self::default_name(&root)
        } else {
            Self::validate_name(name)?;
            name.to_string()
        };

        Ok(Self { name, path: root })
    }

    /// Clone name (unique within the registry, case-insensitive)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized clone root
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Reject names from the reserved list
    pub fn validate_name(name: &str) -> Result<()> {
        if product::is_reserved_name(name) {
            return Err(Error::name_conflict(format!(
                "'{name}' is a reserved name and cannot be used for a clone"
            )));
        }
        Ok(())
    }

    /// Deterministic fallback name for a path: `Unnamed-<8 hex of sha256>`
    pub fn default_name(path: &Utf8Path) -> String {
        let digest = Sha256::digest(path.as_str().as_bytes());
        let short: String = digest
            .iter()
            .take(4)
            .map(|b| format!("{b:02x}"))
            .collect();
        format!("Unnamed-{short}")
    }

    /// Check validity of a directory as a clone root
    ///
    /// Pure predicate; see [`Clone::ensure_valid`] for the diagnosing
    /// variant.
    pub async fn is_valid(path: &Utf8Path) -> bool {
        Self::ensure_valid(path).await.is_ok()
    }

    /// Verify that `path` is a valid clone root, reporting which condition
    /// failed
    ///
    /// A directory qualifies when it exists and contains the product
    /// library directory. If version control metadata is present, the
    /// repository must also be structurally sound (HEAD resolvable).
    pub async fn ensure_valid(path: &Utf8Path) -> Result<()> {
        if !path.is_dir() {
            return Err(Error::invalid_clone(path.as_str(), "path is not a directory"));
        }
        if !path.join(product::LIB_DIR).is_dir() {
            return Err(Error::invalid_clone(
                path.as_str(),
                format!("missing {} directory", product::LIB_DIR),
            ));
        }
        if path.join(".git").exists() {
            git::head_commit(path)
                .await
                .map_err(|e| Error::invalid_repo_state(path.as_str(), e.to_string()))?;
        }
        Ok(())
    }

    /// Whether this clone was deployed from an image (no VCS metadata)
    pub fn is_image_deployed(&self) -> bool {
        !self.path.join(".git").exists()
    }

    /// Branch the clone tracks
    ///
    /// From git for repo clones, from the redeploy sidecar for image
    /// deployments.
    pub async fn branch(&self) -> Result<String> {
        if self.is_image_deployed() {
            Ok(deploy::read_args(&self.path)?.branch)
        } else {
            git::current_branch(&self.path).await
        }
    }

    /// Checked-out commit hash; image deployments have none
    pub async fn commit(&self) -> Result<String> {
        if self.is_image_deployed() {
            Ok(product::UNKNOWN_VERSION.to_string())
        } else {
            git::head_commit(&self.path).await
        }
    }

    /// Most recent tag reachable from HEAD, when repo-backed and tagged
    pub async fn tag(&self) -> Result<String> {
        if self.is_image_deployed() {
            return Ok(product::UNKNOWN_VERSION.to_string());
        }
        Ok(git::head_tag(&self.path)
            .await?
            .unwrap_or_else(|| product::UNKNOWN_VERSION.to_string()))
    }

    /// Where the clone came from: git origin, or the recorded image source
    pub async fn origin(&self) -> Result<String> {
        if self.is_image_deployed() {
            Ok(deploy::read_args(&self.path)?.source)
        } else {
            git::origin_url(&self.path).await
        }
    }

    /// Contents of the product version marker file
    ///
    /// Absence is not an error; callers get the `Unknown` sentinel.
    pub fn module_version(&self) -> String {
        std::fs::read_to_string(self.path.join(product::VERSION_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| product::UNKNOWN_VERSION.to_string())
    }

    /// All engines discoverable inside this clone
    pub fn engines(&self) -> Result<Vec<Engine>> {
        engines::discover(&self.path)
    }

    /// Resolve a single engine by query
    pub fn engine(&self, query: EngineQuery) -> Result<Engine> {
        let engines = self.engines()?;
        Ok(engines::resolve(&engines, query)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_clone_root(dir: &Utf8Path) {
        std::fs::create_dir_all(dir.join(product::LIB_DIR)).unwrap();
    }

    #[test]
    fn test_default_name_is_deterministic() {
        let a = Clone::default_name(Utf8Path::new("/opt/brokkr"));
        let b = Clone::default_name(Utf8Path::new("/opt/brokkr"));
        let c = Clone::default_name(Utf8Path::new("/opt/other"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("Unnamed-"));
        assert_eq!(a.len(), "Unnamed-".len() + 8);
    }

    #[test]
    fn test_validate_name_rejects_reserved() {
        assert!(matches!(
            Clone::validate_name("clone"),
            Err(Error::NameConflict { .. })
        ));
        assert!(matches!(
            Clone::validate_name("Latest"),
            Err(Error::NameConflict { .. })
        ));
        assert!(Clone::validate_name("dev").is_ok());
    }

    #[tokio::test]
    async fn test_validity_requires_lib_dir() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        assert!(!Clone::is_valid(root).await);
        make_clone_root(root);
        assert!(Clone::is_valid(root).await);
    }

    #[tokio::test]
    async fn test_validity_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        make_clone_root(root);

        assert!(Clone::is_valid(root).await);
        assert!(Clone::is_valid(root).await);
        // Normalization does not change the verdict
        let indirect = root.join(product::LIB_DIR).join("..");
        assert!(Clone::is_valid(&indirect).await);
    }

    #[tokio::test]
    async fn test_construction_finds_root_above() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        make_clone_root(root);
        let nested = root.join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let clone = Clone::new("dev", &nested).await.unwrap();
        assert_eq!(clone.path(), scan::normalize(root).unwrap().as_path());
    }

    #[tokio::test]
    async fn test_construction_falls_back_below() {
        let dir = TempDir::new().unwrap();
        let top = Utf8Path::from_path(dir.path()).unwrap();
        let inner = top.join("brokkr-main");
        make_clone_root(&inner);

        let clone = Clone::new("dev", top).await.unwrap();
        assert_eq!(clone.path(), scan::normalize(&inner).unwrap().as_path());
    }

    #[tokio::test]
    async fn test_construction_fails_without_root() {
        let dir = TempDir::new().unwrap();
        let top = Utf8Path::from_path(dir.path()).unwrap();
        let result = Clone::new("dev", top).await;
        assert!(matches!(result, Err(Error::InvalidClone { .. })));
    }

    #[tokio::test]
    async fn test_module_version_sentinel() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        make_clone_root(root);

        let clone = Clone::new("dev", root).await.unwrap();
        assert_eq!(clone.module_version(), product::UNKNOWN_VERSION);

        let marker = root.join(product::VERSION_FILE);
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "4.8.12\n").unwrap();
        assert_eq!(clone.module_version(), "4.8.12");
    }
}
