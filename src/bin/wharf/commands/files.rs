//! `wharf files` command
//!
//! Prints `archive_path <- source_path` for every file the wheel would ship.

use anyhow::Result;

use crate::cli::FilesArgs;
use crate::commands::{display_path, load, respect_vcs_ignores};
use wharf::ops::list_files;
use wharf::vcs;

pub fn execute(args: FilesArgs) -> Result<()> {
    let (project, config) = load(&args.project)?;
    let provider = vcs::provider(respect_vcs_ignores(&args.project, &config));

    let manifest = list_files(&project, provider.as_ref())?;
    for entry in manifest.iter() {
        println!(
            "{} <- {}",
            entry.archive_path,
            display_path(&project.root_dir, &entry.source_path)
        );
    }

    Ok(())
}
