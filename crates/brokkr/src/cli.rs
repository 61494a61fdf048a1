//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use brokkr_clones::EngineQuery;

/// Brokkr - manage local clones of the Brokkr toolkit
#[derive(Parser, Debug)]
#[command(name = "brokkr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a new clone, from the repository or from a zip image
    Clone(CloneArgs),

    /// Manage registered clones
    #[command(subcommand)]
    Clones(ClonesCommands),

    /// Show version information
    Version(VersionArgs),
}

// Clone command
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Name for the new clone
    pub name: String,

    /// Repository URL to clone from (default: the canonical repository)
    #[arg(long, conflicts_with = "image")]
    pub url: Option<String>,

    /// Deploy from a zip image instead of cloning: a URL or a local
    /// archive path, or the canonical branch archive when given bare
    #[arg(long)]
    pub image: Option<Option<String>>,

    /// Branch to clone or snapshot
    #[arg(long)]
    pub branch: Option<String>,

    /// Deployment subset to copy (image installs only)
    #[arg(long, requires = "image")]
    pub deploy: Option<String>,

    /// Destination directory (default: the Brokkr clones directory)
    #[arg(long)]
    pub dest: Option<Utf8PathBuf>,
}

// Clones commands
#[derive(Subcommand, Debug)]
pub enum ClonesCommands {
    /// List registered clones
    List(ClonesListArgs),

    /// Show details of one clone
    Info(CloneRefArgs),

    /// Register an existing clone directory
    Add(ClonesAddArgs),

    /// Rename a registered clone
    Rename(ClonesRenameArgs),

    /// Unregister clones without touching their directories
    Forget(ClonesSelectArgs),

    /// Unregister clones and delete their directories
    Delete(ClonesDeleteArgs),

    /// Update clones (pull for repo clones, redeploy for image clones)
    Update(ClonesSelectArgs),

    /// List or resolve the engines of a clone
    Engines(ClonesEnginesArgs),
}

#[derive(Args, Debug)]
pub struct ClonesListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CloneRefArgs {
    /// Clone name or path
    pub clone: String,
}

#[derive(Args, Debug)]
pub struct ClonesAddArgs {
    /// Name to register under
    pub name: String,

    /// Path at or inside the clone
    pub path: Utf8PathBuf,

    /// Replace an existing registration for the same path
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ClonesRenameArgs {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Args, Debug)]
pub struct ClonesSelectArgs {
    /// Clone name or path
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub clone: Option<String>,

    /// Apply to every registered clone
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct ClonesDeleteArgs {
    /// Clone name or path
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub clone: Option<String>,

    /// Delete every registered clone
    #[arg(long)]
    pub all: bool,

    /// Also wipe the whole configuration store (factory reset)
    #[arg(long)]
    pub clear_configs: bool,
}

#[derive(Args, Debug)]
pub struct ClonesEnginesArgs {
    /// Clone name or path
    pub clone: String,

    /// Resolve a single engine: 'latest' or an exact version
    #[arg(long)]
    pub engine: Option<EngineQuery>,
}

// Version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
