//! External version control collaborator
//!
//! All repository transport and inspection goes through the system `git`
//! binary; this module never parses `.git` internals itself. Commands run
//! via tokio's process support and surface stderr in the returned error.

use camino::Utf8Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Run git with `args`, optionally inside `repo`, returning trimmed stdout
async fn run_git(repo: Option<&Utf8Path>, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new("git");
    if let Some(repo) = repo {
        cmd.current_dir(repo);
    }
    cmd.args(args);

    debug!("Running: git {}", args.join(" "));
    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::GitNotFound
        } else {
            Error::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::git_operation(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Clone `url` at `branch` into `dest`
pub async fn clone(url: &str, branch: &str, dest: &Utf8Path) -> Result<()> {
    info!("Cloning {} ({}) -> {}", url, branch, dest);
    run_git(
        None,
        &["clone", "--branch", branch, url, dest.as_str()],
    )
    .await?;
    Ok(())
}

/// Resolve HEAD to a commit hash
///
/// Doubles as the structural validity probe: a directory with `.git` whose
/// HEAD does not resolve is a broken repository.
pub async fn head_commit(repo: &Utf8Path) -> Result<String> {
    run_git(Some(repo), &["rev-parse", "HEAD"]).await
}

/// Name of the currently checked-out branch
pub async fn current_branch(repo: &Utf8Path) -> Result<String> {
    run_git(Some(repo), &["rev-parse", "--abbrev-ref", "HEAD"]).await
}

/// URL of the `origin` remote
pub async fn origin_url(repo: &Utf8Path) -> Result<String> {
    run_git(Some(repo), &["config", "--get", "remote.origin.url"]).await
}

/// Most recent tag reachable from HEAD, if any
pub async fn head_tag(repo: &Utf8Path) -> Result<Option<String>> {
    match run_git(Some(repo), &["describe", "--tags", "--abbrev=0"]).await {
        Ok(tag) => Ok(Some(tag)),
        // No tags in the repository is not an error for callers
        Err(Error::GitOperation { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Forcibly bring the checked-out branch up to date with its origin
///
/// Fetch then hard-reset; any local divergence is discarded. A non-zero
/// exit from either step (the subprocess analogue of an unresolved-conflict
/// result code) is a failure.
pub async fn force_update(repo: &Utf8Path) -> Result<()> {
    let branch = current_branch(repo).await?;
    info!("Updating {} (branch {})", repo, branch);
    run_git(Some(repo), &["fetch", "origin"]).await?;
    run_git(
        Some(repo),
        &["reset", "--hard", &format!("origin/{branch}")],
    )
    .await?;
    Ok(())
}
