//! Deployment subsets and the redeploy sidecar
//!
//! An image install may copy only a named subset of the staged tree; the
//! subsets are declared in the clone's manifest. Whatever arguments created
//! an image deployment are recorded in a sidecar file at the clone root so
//! the deployment can be deleted and faithfully re-created later.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::manifest::ProductManifest;
use brokkr_core::product;

/// A named subset of an image used for partial installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub name: String,
    /// Relative paths to copy, in declaration order
    pub paths: Vec<Utf8PathBuf>,
}

/// Look up a deployment by name in the clone's manifest
pub fn find_deployment(clone_root: &Utf8Path, name: &str) -> Result<Deployment> {
    let manifest = ProductManifest::load(clone_root)
        .map_err(|_| Error::not_found(format!("deployment '{name}' (no readable manifest)")))?;
    let paths = manifest
        .deployments
        .get(name)
        .ok_or_else(|| Error::not_found(format!("deployment '{name}'")))?;
    Ok(Deployment {
        name: name.to_string(),
        paths: paths.iter().map(Utf8PathBuf::from).collect(),
    })
}

/// The three inputs of an image install, persisted for redeploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArgs {
    /// Image source: URL or local archive path
    pub source: String,
    pub branch: String,
    /// Deployment subset, `None` for a full-tree install
    pub deployment: Option<String>,
}

fn sidecar_path(clone_root: &Utf8Path) -> Utf8PathBuf {
    clone_root.join(product::DEPLOY_ARGS_FILE)
}

/// Write the redeploy sidecar: exactly three lines in fixed order
pub fn write_args(clone_root: &Utf8Path, args: &DeployArgs) -> Result<()> {
    let content = format!(
        "{}\n{}\n{}\n",
        args.source,
        args.branch,
        args.deployment.as_deref().unwrap_or("")
    );
    std::fs::write(sidecar_path(clone_root), content)?;
    debug!("Recorded deployment args in {}", clone_root);
    Ok(())
}

/// Read the redeploy sidecar back
///
/// An empty line means "use the product default": the default branch, the
/// default image URL for that branch, no deployment subset.
pub fn read_args(clone_root: &Utf8Path) -> Result<DeployArgs> {
    let path = sidecar_path(clone_root);
    if !path.is_file() {
        return Err(Error::resource_missing(path.as_str()));
    }
    let content = std::fs::read_to_string(&path)?;
    let mut lines = content.lines();
    let source = lines.next().unwrap_or("").trim().to_string();
    let branch = lines.next().unwrap_or("").trim().to_string();
    let deployment = lines.next().unwrap_or("").trim().to_string();

    let branch = if branch.is_empty() {
        product::DEFAULT_BRANCH.to_string()
    } else {
        branch
    };
    let source = if source.is_empty() {
        product::default_image_url(&branch)
    } else {
        source
    };
    let deployment = if deployment.is_empty() {
        None
    } else {
        Some(deployment)
    };

    Ok(DeployArgs {
        source,
        branch,
        deployment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_round_trip() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let args = DeployArgs {
            source: "https://example.com/image.zip".to_string(),
            branch: "develop".to_string(),
            deployment: Some("core".to_string()),
        };
        write_args(root, &args).unwrap();
        assert_eq!(read_args(root).unwrap(), args);
    }

    #[test]
    fn test_empty_fields_read_as_defaults() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        write_args(
            root,
            &DeployArgs {
                source: String::new(),
                branch: String::new(),
                deployment: None,
            },
        )
        .unwrap();

        let read = read_args(root).unwrap();
        assert_eq!(read.branch, product::DEFAULT_BRANCH);
        assert_eq!(read.source, product::default_image_url(product::DEFAULT_BRANCH));
        assert_eq!(read.deployment, None);
    }

    #[test]
    fn test_missing_sidecar_is_resource_missing() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        assert!(matches!(
            read_args(root),
            Err(Error::ResourceMissing { .. })
        ));
    }

    #[test]
    fn test_find_deployment() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(
            root.join(product::MANIFEST_FILE),
            "[deployments]\ncore = [\"bin\", \"brokkrlib\"]\n",
        )
        .unwrap();

        let deployment = find_deployment(root, "core").unwrap();
        assert_eq!(deployment.paths.len(), 2);
        assert!(matches!(
            find_deployment(root, "missing"),
            Err(Error::NotFound { .. })
        ));
    }
}
