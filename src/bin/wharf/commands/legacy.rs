//! `wharf legacy` command

use anyhow::{anyhow, Result};

use crate::cli::LegacyArgs;
use wharf::ops::LegacyExtractor;
use wharf::util::diagnostic::{self, suggestions, Diagnostic};
use wharf::util::GlobalContext;

pub fn execute(args: LegacyArgs, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = args
        .setup
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(ctx.cwd());
    let config = ctx.config(root);

    let extractor = LegacyExtractor::from_config(&config.legacy, args.script.as_deref())
        .map_err(|e| anyhow!("{:#}\nhelp: {}", e, suggestions::LEGACY_COMMAND))?;
    let metadata = extractor.extract(&args.setup)?;

    if metadata.is_empty() {
        let diag = Diagnostic::warning(format!(
            "{} declared no metadata",
            args.setup.display()
        ))
        .with_context("the script never called `setup()`");
        diagnostic::emit(&diag, color);
    }

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
