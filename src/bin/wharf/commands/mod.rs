//! Command implementations

pub mod build;
pub mod completions;
pub mod files;
pub mod legacy;

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ProjectArgs;
use wharf::core::{load_project, ProjectDescriptor};
use wharf::util::{Config, GlobalContext};

/// Load the selected project and the configuration that applies to it.
pub fn load(args: &ProjectArgs) -> Result<(ProjectDescriptor, Config)> {
    let ctx = GlobalContext::new()?;

    let manifest_path = match args.manifest_path {
        Some(ref path) => path.clone(),
        None => ctx.find_project()?,
    };
    let project = load_project(&manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;
    let config = ctx.config(&project.root_dir);
    tracing::debug!("loaded `{}` {} from {}", project.name, project.version, manifest_path.display());

    Ok((project, config))
}

/// Whether version control ignore lists apply: CLI flag over config.
pub fn respect_vcs_ignores(args: &ProjectArgs, config: &Config) -> bool {
    !args.no_vcs && config.respect_vcs_ignores()
}

/// `path` relative to `base` when it lies below it.
pub fn display_path(base: &Path, path: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
