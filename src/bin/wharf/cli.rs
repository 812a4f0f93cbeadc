//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// wharf - builds pure-Python wheels from pyproject-based projects
#[derive(Parser)]
#[command(name = "wharf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a wheel for the current project
    Build(BuildArgs),

    /// List the files a wheel would contain, without building it
    Files(FilesArgs),

    /// Extract metadata from a legacy setup.py
    Legacy(LegacyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by commands that load a project.
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to pyproject.toml (defaults to searching upward from the current directory)
    #[arg(long, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Do not drop files ignored by version control
    #[arg(long)]
    pub no_vcs: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Store entries without compression
    #[arg(long)]
    pub stored: bool,

    /// Directory to write the wheel to (defaults to `dist/` in the project)
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct FilesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args)]
pub struct LegacyArgs {
    /// Path to setup.py
    pub setup: PathBuf,

    /// Extractor script to run with python3 (overrides `[legacy] command`)
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
