//! Image acquisition: download, extraction, and tree copies
//!
//! Images are zip snapshots of the product tree. They come from a URL or a
//! local archive; either way they are extracted into a staging directory
//! and copied (whole or as a named deployment subset) to the destination.
//! Nothing here retries; a failed transfer surfaces to the caller.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use url::Url;

use crate::deploy::Deployment;
use crate::error::{Error, Result};
use brokkr_core::product;

/// Resolved origin of an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(Url),
    Local(Utf8PathBuf),
}

impl ImageSource {
    /// The string to record in the redeploy sidecar
    pub fn as_recorded(&self) -> String {
        match self {
            Self::Remote(url) => url.to_string(),
            Self::Local(path) => path.to_string(),
        }
    }
}

/// Resolve what the caller gave us into a usable image source
///
/// An http(s) URL downloads, an existing local file is used directly, a
/// string that is neither is a hard failure, and no source at all falls
/// back to the canonical archive for `branch`.
pub fn resolve_source(source: Option<&str>, branch: &str) -> Result<ImageSource> {
    let Some(source) = source else {
        let url = product::default_image_url(branch);
        return Ok(ImageSource::Remote(
            Url::parse(&url).map_err(|e| Error::download_failed(url.clone(), e.to_string()))?,
        ));
    };

    if let Ok(url) = Url::parse(source) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(ImageSource::Remote(url));
        }
    }
    let path = Utf8Path::new(source);
    if path.is_file() {
        return Ok(ImageSource::Local(path.to_path_buf()));
    }
    Err(Error::resource_missing(source))
}

/// Download `url` into `dest_dir`, returning the archive path
pub async fn download(url: &Url, dest_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let file_name = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("image.zip");
    let archive_path = dest_dir.join(file_name);

    info!("Downloading image: {}", url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .map_err(|e| Error::download_failed(url.as_str(), e.to_string()))?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::download_failed(url.as_str(), e.to_string()))?;
    if !response.status().is_success() {
        return Err(Error::download_failed(
            url.as_str(),
            format!("HTTP {}", response.status()),
        ));
    }

    let total = response.content_length().unwrap_or(0);
    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );

    let mut file = std::fs::File::create(&archive_path)?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::download_failed(url.as_str(), e.to_string()))?;
        std::io::Write::write_all(&mut file, &chunk)?;
        progress.inc(chunk.len() as u64);
    }
    progress.finish_and_clear();

    debug!("Downloaded image to {}", archive_path);
    Ok(archive_path)
}

/// Extract `archive` into `stage`, deleting any pre-existing stage first
pub fn extract(archive: &Utf8Path, stage: &Utf8Path) -> Result<()> {
    if stage.exists() {
        debug!("Removing stale stage at {}", stage);
        std::fs::remove_dir_all(stage)?;
    }
    std::fs::create_dir_all(stage)?;

    info!("Extracting {} -> {}", archive, stage);
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::extract_failed(archive.as_str(), e.to_string()))?;
    zip.extract(stage.as_std_path())
        .map_err(|e| Error::extract_failed(archive.as_str(), e.to_string()))?;
    Ok(())
}

/// Recursively copy the tree at `src` into `dst`
///
/// Existing files are overwritten.
pub fn copy_tree(src: &Utf8Path, dst: &Utf8Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(src.as_std_path()) {
        let entry = entry.map_err(|e| {
            Error::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk failed")
            }))
        })?;
        let rel = entry
            .path()
            .strip_prefix(src.as_std_path())
            .expect("walked entries stay under the walk root");
        let target = dst.as_std_path().join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy only a deployment's declared paths from `stage_root` into `dest`
///
/// Files overwrite their target; directories replace it (delete-then-copy).
/// A declared path missing from the stage fails the copy outright, so a
/// partial deployment never looks like success.
pub fn copy_deployment(stage_root: &Utf8Path, dest: &Utf8Path, deployment: &Deployment) -> Result<()> {
    info!(
        "Deploying subset '{}' ({} paths)",
        deployment.name,
        deployment.paths.len()
    );
    for rel in &deployment.paths {
        let src = stage_root.join(rel);
        let target = dest.join(rel);
        if src.is_dir() {
            if target.exists() {
                std::fs::remove_dir_all(&target)?;
            }
            copy_tree(&src, &target)?;
        } else if src.is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&src, &target)?;
        } else {
            return Err(Error::resource_missing(src.as_str()));
        }
    }
    Ok(())
}
