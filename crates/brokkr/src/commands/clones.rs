//! `brokkr clones` command handlers

use anyhow::{bail, Result};
use tabled::{settings::Style, Table, Tabled};

use brokkr_clones::{install, Clone, Registry};
use brokkr_core::PathsConfig;

use crate::cli::{
    CloneRefArgs, ClonesAddArgs, ClonesCommands, ClonesDeleteArgs, ClonesEnginesArgs,
    ClonesListArgs, ClonesRenameArgs, ClonesSelectArgs,
};
use crate::output;

pub(crate) async fn run(command: ClonesCommands) -> Result<()> {
    let paths = PathsConfig::discover()?;
    paths.ensure_home()?;
    let registry = Registry::new(&paths);

    match command {
        ClonesCommands::List(args) => list(&registry, args).await,
        ClonesCommands::Info(args) => info(&registry, args).await,
        ClonesCommands::Add(args) => add(&registry, args).await,
        ClonesCommands::Rename(args) => rename(&registry, args).await,
        ClonesCommands::Forget(args) => forget(&registry, args).await,
        ClonesCommands::Delete(args) => delete(&registry, args).await,
        ClonesCommands::Update(args) => update(&registry, &paths, args).await,
        ClonesCommands::Engines(args) => engines(&registry, args).await,
    }
}

/// Row for the clone listing
#[derive(Tabled, serde::Serialize)]
struct CloneRow {
    name: String,
    kind: String,
    #[tabled(rename = "module version")]
    module_version: String,
    path: String,
}

fn clone_kind(clone: &Clone) -> &'static str {
    if clone.is_image_deployed() {
        "image"
    } else {
        "git"
    }
}

async fn list(registry: &Registry, args: ClonesListArgs) -> Result<()> {
    let clones = registry.list().await?;
    let rows: Vec<CloneRow> = clones
        .iter()
        .map(|clone| CloneRow {
            name: clone.name().to_string(),
            kind: clone_kind(clone).to_string(),
            module_version: clone.module_version(),
            path: clone.path().to_string(),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::info("No clones registered");
        return Ok(());
    }
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

async fn info(registry: &Registry, args: CloneRefArgs) -> Result<()> {
    let clone = registry.lookup(&args.clone).await?;

    output::header(&format!("Clone '{}'", clone.name()));
    output::kv("Path", clone.path().as_str());
    output::kv("Kind", clone_kind(&clone));
    output::kv("Module version", &clone.module_version());

    let unknown = || "Unknown".to_string();
    output::kv("Branch", &clone.branch().await.unwrap_or_else(|_| unknown()));
    output::kv("Commit", &clone.commit().await.unwrap_or_else(|_| unknown()));
    output::kv("Origin", &clone.origin().await.unwrap_or_else(|_| unknown()));

    match clone.engines() {
        Ok(engines) => output::kv("Engines", &engines.len().to_string()),
        Err(e) => output::kv("Engines", &format!("none ({e})")),
    }
    Ok(())
}

async fn add(registry: &Registry, args: ClonesAddArgs) -> Result<()> {
    let clone = registry.register(&args.name, &args.path, args.force).await?;
    output::success(&format!(
        "Registered '{}' -> {}",
        clone.name(),
        clone.path()
    ));
    Ok(())
}

async fn rename(registry: &Registry, args: ClonesRenameArgs) -> Result<()> {
    let clone = registry.rename(&args.old_name, &args.new_name).await?;
    output::success(&format!(
        "Renamed '{}' to '{}'",
        args.old_name,
        clone.name()
    ));
    Ok(())
}

async fn forget(registry: &Registry, args: ClonesSelectArgs) -> Result<()> {
    if args.all {
        registry.unregister_all().await?;
        output::success("Unregistered all clones");
        return Ok(());
    }
    let Some(query) = args.clone else {
        bail!("a clone name (or --all) is required");
    };
    let clone = registry.lookup(&query).await?;
    registry.unregister(&clone).await?;
    output::success(&format!("Unregistered '{}'", clone.name()));
    Ok(())
}

async fn delete(registry: &Registry, args: ClonesDeleteArgs) -> Result<()> {
    if args.all {
        install::delete_all(registry, args.clear_configs).await?;
        output::success("Deleted all clones");
        return Ok(());
    }
    let Some(query) = args.clone else {
        bail!("a clone name (or --all) is required");
    };
    let clone = registry.lookup(&query).await?;
    install::delete(registry, &clone, args.clear_configs).await?;
    output::success(&format!("Deleted '{}'", clone.name()));
    Ok(())
}

async fn update(registry: &Registry, paths: &PathsConfig, args: ClonesSelectArgs) -> Result<()> {
    if args.all {
        let failures = install::update_all(registry, paths).await?;
        for (name, error) in &failures {
            output::warning(&format!("'{name}' failed to update: {error}"));
        }
        if failures.is_empty() {
            output::success("All clones updated");
            return Ok(());
        }
        bail!("{} clone(s) failed to update", failures.len());
    }
    let Some(query) = args.clone else {
        bail!("a clone name (or --all) is required");
    };
    let clone = registry.lookup(&query).await?;
    let spinner = output::spinner(&format!("Updating '{}'...", clone.name()));
    let result = install::update(registry, paths, &clone).await;
    spinner.finish_and_clear();
    let updated = result?;
    output::success(&format!("Updated '{}'", updated.name()));
    Ok(())
}

/// Row for the engine listing
#[derive(Tabled, serde::Serialize)]
struct EngineRow {
    version: u32,
    kernel: String,
    runtime: bool,
    description: String,
}

async fn engines(registry: &Registry, args: ClonesEnginesArgs) -> Result<()> {
    let clone = registry.lookup(&args.clone).await?;

    if let Some(query) = args.engine {
        let engine = clone.engine(query)?;
        output::header(&format!("Engine {}", engine.version));
        output::kv("Kernel", &engine.kernel);
        output::kv("Runtime", if engine.runtime { "yes" } else { "no" });
        output::kv("Assembly", engine.assembly_path().as_str());
        output::kv("Description", &engine.description);
        return Ok(());
    }

    let engines = clone.engines()?;
    if engines.is_empty() {
        output::info(&format!("Clone '{}' has no engines", clone.name()));
        return Ok(());
    }
    let rows: Vec<EngineRow> = engines
        .into_iter()
        .map(|engine| EngineRow {
            version: engine.version,
            kernel: engine.kernel,
            runtime: engine.runtime,
            description: engine.description,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}
