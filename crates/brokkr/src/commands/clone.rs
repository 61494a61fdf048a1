//! `brokkr clone` command handler

use anyhow::Result;

use brokkr_clones::{install, ImageInstallOpts, Registry, RepoInstallOpts};
use brokkr_core::PathsConfig;

use crate::cli::CloneArgs;
use crate::output;

/// Install a new clone, from the repository or from a zip image
pub(crate) async fn run(args: CloneArgs) -> Result<()> {
    let paths = PathsConfig::discover()?;
    paths.ensure_home()?;
    let registry = Registry::new(&paths);

    output::header("Install Clone");
    output::kv("Name", &args.name);
    if let Some(branch) = &args.branch {
        output::kv("Branch", branch);
    }

    let clone = if let Some(image) = args.image {
        // Bare --image means "the canonical archive for the branch"
        let source = image.filter(|s| !s.is_empty());
        if let Some(source) = &source {
            output::kv("Image", source);
        }
        install::install_from_image(
            &registry,
            &paths,
            ImageInstallOpts {
                name: args.name.clone(),
                source,
                branch: args.branch,
                deployment: args.deploy,
                dest: args.dest,
            },
        )
        .await?
    } else {
        if let Some(url) = &args.url {
            output::kv("Repository", url);
        }
        install::install_from_repo(
            &registry,
            &paths,
            RepoInstallOpts {
                name: args.name.clone(),
                url: args.url,
                branch: args.branch,
                dest: args.dest,
            },
        )
        .await?
    };

    println!();
    output::success(&format!("Clone '{}' installed", clone.name()));
    output::kv("Location", clone.path().as_str());
    Ok(())
}
