//! Install, update, redeploy, and delete flows
//!
//! Each flow is a linear sequence with compensating rollback: once a
//! destructive filesystem step has run, any later failure removes
//! everything this invocation created before the original error is
//! re-raised. Cleanup failures are logged and never mask the primary
//! error. None of these flows retries anything.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use crate::clone::Clone;
use crate::deploy::{self, DeployArgs};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::{git, image};
use brokkr_core::{product, PathsConfig};

/// Options for installing from the git repository
#[derive(Debug, Clone, Default)]
pub struct RepoInstallOpts {
    pub name: String,
    /// Repository URL; product default when unset
    pub url: Option<String>,
    /// Branch to clone; product default when unset
    pub branch: Option<String>,
    /// Destination directory; `<clones dir>/<name>` when unset
    pub dest: Option<Utf8PathBuf>,
}

/// Options for installing from a zip image
#[derive(Debug, Clone, Default)]
pub struct ImageInstallOpts {
    pub name: String,
    /// Image URL or local archive path; canonical branch archive when unset
    pub source: Option<String>,
    pub branch: Option<String>,
    /// Deployment subset to copy; full tree when unset
    pub deployment: Option<String>,
    pub dest: Option<Utf8PathBuf>,
}

/// Best-effort removal of a directory this flow created
fn cleanup_dir(path: &Utf8Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!("Cleanup failed for {}: {}", path, e);
    }
}

/// Resolve the destination directory, nesting under a name-qualified
/// subdirectory when the preferred target is already taken
fn resolve_destination(
    paths: &PathsConfig,
    name: &str,
    dest: Option<Utf8PathBuf>,
) -> Result<Utf8PathBuf> {
    let mut dest = dest.unwrap_or_else(|| paths.clones_dir().join(name));
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if dest.exists() {
        dest = dest.join(name);
        if dest.exists() {
            return Err(Error::name_conflict(format!(
                "destination {dest} already exists"
            )));
        }
    }
    Ok(dest)
}

/// Install a clone by cloning the product repository
pub async fn install_from_repo(registry: &Registry, paths: &PathsConfig, opts: RepoInstallOpts) -> Result<Clone> {
    Clone::validate_name(&opts.name)?;
    let url = opts
        .url
        .unwrap_or_else(|| product::DEFAULT_CLONE_SOURCE.to_string());
    let branch = opts
        .branch
        .unwrap_or_else(|| product::DEFAULT_BRANCH.to_string());
    let dest = resolve_destination(paths, &opts.name, opts.dest)?;

    if let Err(e) = git::clone(&url, &branch, &dest).await {
        cleanup_dir(&dest);
        return Err(e);
    }

    // Verify-or-delete: no orphaned partial clone may survive this flow
    if let Err(e) = Clone::ensure_valid(&dest).await {
        cleanup_dir(&dest);
        return Err(e);
    }
    let clone = match registry.register(&opts.name, &dest, false).await {
        Ok(clone) => clone,
        Err(e) => {
            cleanup_dir(&dest);
            return Err(e);
        }
    };

    info!("Installed clone '{}' at {}", clone.name(), clone.path());
    Ok(clone)
}

/// Install a clone by deploying a zip image
pub async fn install_from_image(registry: &Registry, paths: &PathsConfig, opts: ImageInstallOpts) -> Result<Clone> {
    Clone::validate_name(&opts.name)?;
    let branch = opts
        .branch
        .unwrap_or_else(|| product::DEFAULT_BRANCH.to_string());
    let source = image::resolve_source(opts.source.as_deref(), &branch)?;

    // Download (when remote) into a throwaway directory
    let download_dir = tempfile::TempDir::new()?;
    let archive = match &source {
        image::ImageSource::Remote(url) => {
            let dir = Utf8Path::from_path(download_dir.path()).ok_or_else(|| {
                brokkr_core::Error::non_utf8_path(download_dir.path().display().to_string())
            })?;
            image::download(url, dir).await?
        }
        image::ImageSource::Local(path) => path.clone(),
    };

    // Stage the archive and locate the product root inside it
    let stage = paths.stage_dir(&opts.name);
    image::extract(&archive, &stage)?;
    let staged = match Clone::new(&opts.name, &stage).await {
        Ok(staged) => staged,
        Err(e) => {
            cleanup_dir(&stage);
            return Err(e);
        }
    };
    let staged_root = staged.path().to_path_buf();

    let dest = match resolve_destination(paths, &opts.name, opts.dest) {
        Ok(dest) => dest,
        Err(e) => {
            cleanup_dir(&stage);
            return Err(e);
        }
    };

    // Copy the requested subset, or the whole staged tree
    let copied = match &opts.deployment {
        Some(name) => deploy::find_deployment(&staged_root, name)
            .and_then(|deployment| image::copy_deployment(&staged_root, &dest, &deployment)),
        None => image::copy_tree(&staged_root, &dest),
    };
    if let Err(e) = copied {
        cleanup_dir(&stage);
        cleanup_dir(&dest);
        return Err(e);
    }
    cleanup_dir(&stage);

    // Record how this deployment was made so it can be replayed
    let args = DeployArgs {
        source: source.as_recorded(),
        branch,
        deployment: opts.deployment.clone(),
    };
    if let Err(e) = deploy::write_args(&dest, &args) {
        cleanup_dir(&dest);
        return Err(e);
    }

    let clone = match registry.register(&opts.name, &dest, false).await {
        Ok(clone) => clone,
        Err(e) => {
            cleanup_dir(&dest);
            return Err(e);
        }
    };

    info!("Deployed clone '{}' at {}", clone.name(), clone.path());
    Ok(clone)
}

/// Bring a clone up to date
///
/// Repo clones force-pull through git. Image deployments have no
/// incremental update; they are re-deployed from their recorded arguments.
/// Note the redeploy deletes the existing tree before reinstalling, so a
/// failed redeploy leaves the clone absent (but reproducible from the same
/// recorded arguments).
pub async fn update(registry: &Registry, paths: &PathsConfig, clone: &Clone) -> Result<Clone> {
    if clone.is_image_deployed() {
        redeploy(registry, paths, clone).await
    } else {
        git::force_update(clone.path()).await?;
        info!("Updated clone '{}'", clone.name());
        Ok(clone.clone())
    }
}

/// Update every registered clone sequentially
///
/// Individual failures do not stop the sweep; they are collected and
/// returned so the caller can report them.
pub async fn update_all(registry: &Registry, paths: &PathsConfig) -> Result<Vec<(String, Error)>> {
    let mut failures = Vec::new();
    for clone in registry.list().await? {
        if let Err(e) = update(registry, paths, &clone).await {
            warn!("Update failed for '{}': {}", clone.name(), e);
            failures.push((clone.name().to_string(), e));
        }
    }
    Ok(failures)
}

/// Delete an image-deployed clone and re-create it from its recorded
/// deployment arguments
pub async fn redeploy(registry: &Registry, paths: &PathsConfig, clone: &Clone) -> Result<Clone> {
    let args = deploy::read_args(clone.path())?;
    let name = clone.name().to_string();
    let dest = clone.path().to_path_buf();

    info!("Redeploying '{}' from {}", name, args.source);
    delete(registry, clone, false).await?;
    install_from_image(
        registry,
        paths,
        ImageInstallOpts {
            name,
            source: Some(args.source),
            branch: Some(args.branch),
            deployment: args.deployment,
            dest: Some(dest),
        },
    )
    .await
}

/// Unregister a clone and remove its directory tree
///
/// `clear_configs` additionally wipes the whole configuration store; that
/// reset is global, not scoped to this clone.
pub async fn delete(registry: &Registry, clone: &Clone, clear_configs: bool) -> Result<()> {
    registry.unregister(clone).await?;
    std::fs::remove_dir_all(clone.path())?;
    info!("Deleted clone '{}' at {}", clone.name(), clone.path());

    if clear_configs {
        registry.clear_config()?;
        info!("Cleared the configuration store");
    }
    Ok(())
}

/// Delete every registered clone
pub async fn delete_all(registry: &Registry, clear_configs: bool) -> Result<()> {
    for clone in registry.list().await? {
        delete(registry, &clone, false).await?;
    }
    if clear_configs {
        registry.clear_config()?;
        info!("Cleared the configuration store");
    }
    Ok(())
}
