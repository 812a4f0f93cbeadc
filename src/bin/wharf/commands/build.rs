//! `wharf build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::{load, respect_vcs_ignores};
use wharf::builder::Compression;
use wharf::ops::{build_wheel, WheelOptions};
use wharf::vcs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let (project, config) = load(&args.project)?;

    // --stored overrides the configured compression
    let compression = if args.stored {
        Compression::Stored
    } else {
        config.compression()
    };

    let opts = WheelOptions {
        compression,
        target_dir: args.out_dir,
    };
    let provider = vcs::provider(respect_vcs_ignores(&args.project, &config));

    let wheel = build_wheel(&project, provider.as_ref(), &opts)?;

    eprintln!(
        "    Finished `{}` {} -> {}",
        project.name,
        wheel.name.version,
        wheel.path.display()
    );

    Ok(())
}
