//! Metadata extraction from legacy `setup.py` projects.
//!
//! The script is never imported in-process: an external extractor runs it
//! with `setup()` intercepted and writes the captured keyword arguments as
//! JSON. wharf only defines that contract:
//!
//! ```text
//! <command...> --setup <path/to/setup.py> --output <path/to/result.json>
//! ```
//!
//! The result is an object with optional `name`, `version`,
//! `install_requires`, `extras_require` and `python_requires` keys; `{}`
//! means the script never called `setup()`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::config::LegacyConfig;
use crate::util::process::{find_python, ProcessBuilder};

const OUTPUT_FILE: &str = "setup-metadata.json";

/// Metadata captured from a `setup()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub install_requires: Vec<String>,
    pub extras_require: Option<BTreeMap<String, Vec<String>>>,
    pub python_requires: Option<String>,
}

impl LegacyMetadata {
    /// True when the script declared nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.version.is_none()
            && self.install_requires.is_empty()
            && self.extras_require.is_none()
            && self.python_requires.is_none()
    }

    /// `Requires-Dist` values: plain requirements, then each extra's
    /// requirements marked with `extra == "<name>"`.
    pub fn requirements(&self) -> Vec<String> {
        let mut reqs = self.install_requires.clone();

        for (extra, extra_reqs) in self.extras_require.iter().flatten() {
            for req in extra_reqs {
                let marker = format!("extra == \"{}\"", extra);
                reqs.push(match req.split_once(';') {
                    Some((spec, existing)) => {
                        format!("{}; ({}) and {}", spec.trim(), existing.trim(), marker)
                    }
                    None => format!("{}; {}", req.trim(), marker),
                });
            }
        }

        reqs
    }
}

/// Runs the external extractor.
#[derive(Debug, Clone)]
pub struct LegacyExtractor {
    command: Vec<String>,
}

impl LegacyExtractor {
    /// Extractor running `command`; the first element is the program.
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            bail!("legacy extractor command is empty");
        }
        Ok(LegacyExtractor { command })
    }

    /// `python3 <script>` when a script is given, otherwise the configured command.
    pub fn from_config(config: &LegacyConfig, script: Option<&Path>) -> Result<Self> {
        if let Some(script) = script {
            let python = find_python().context("could not find `python3` or `python` in PATH")?;
            return Self::new(vec![
                python.display().to_string(),
                script.display().to_string(),
            ]);
        }
        if config.command.is_empty() {
            bail!("no legacy extractor configured");
        }
        Self::new(config.command.clone())
    }

    /// Run the extractor against `setup`.
    pub fn extract(&self, setup: &Path) -> Result<LegacyMetadata> {
        let setup = setup
            .canonicalize()
            .with_context(|| format!("failed to locate {}", setup.display()))?;
        let dir = setup.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

        let tmp = tempfile::TempDir::new().context("failed to create temporary directory")?;
        let output = tmp.path().join(OUTPUT_FILE);

        let (program, args) = self.command.split_at(1);
        ProcessBuilder::new(&program[0])
            .args(args)
            .arg("--setup")
            .arg(&setup)
            .arg("--output")
            .arg(&output)
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .cwd(&dir)
            .exec_and_check()
            .with_context(|| format!("failed to extract metadata from {}", setup.display()))?;

        let contents = std::fs::read_to_string(&output)
            .with_context(|| format!("extractor wrote no result for {}", setup.display()))?;
        let metadata: LegacyMetadata = serde_json::from_str(&contents)
            .with_context(|| format!("malformed extractor result for {}", setup.display()))?;

        if metadata.is_empty() {
            tracing::debug!("{} declared no metadata", setup.display());
        }
        Ok(metadata)
    }
}
