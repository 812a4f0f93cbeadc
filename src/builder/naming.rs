//! Artifact naming: normalized project names, versions and compatibility tags.

use std::fmt;
use std::sync::LazyLock;

use pubgrub::Range;
use regex::Regex;

use crate::core::constraint::VersionConstraint;
use crate::core::errors::BuildError;
use crate::core::project::ProjectDescriptor;
use crate::core::version::Version;

/// Extension of wheel artifacts.
pub const WHEEL_EXTENSION: &str = "whl";

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("name regex is valid")
});

static SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator regex is valid"));

/// Canonical form of a project name: lowercase, separator runs collapsed to `-`.
pub fn canonicalize_name(name: &str) -> Result<String, BuildError> {
    let trimmed = name.trim();
    if !NAME_RE.is_match(trimmed) {
        return Err(BuildError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(SEPARATORS_RE.replace_all(trimmed, "-").to_lowercase())
}

/// Name as it appears in file names, where `-` separates fields.
pub fn escape_name(name: &str) -> Result<String, BuildError> {
    Ok(canonicalize_name(name)?.replace('-', "_"))
}

/// Compatibility tags of a pure-Python wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTags {
    /// Interpreter tags, e.g. `py2` and `py3`.
    pub python: Vec<String>,
    pub abi: String,
    pub platform: String,
}

impl WheelTags {
    /// Tags for a pure wheel supporting the Pythons `python_constraint` allows.
    pub fn pure(python_constraint: &VersionConstraint) -> Self {
        WheelTags {
            python: python_tags(python_constraint),
            abi: "none".to_string(),
            platform: "any".to_string(),
        }
    }

    /// `py2.py3`
    pub fn python_tag(&self) -> String {
        self.python.join(".")
    }

    /// Expanded tag triples, one per interpreter, e.g. `py3-none-any`.
    pub fn expanded(&self) -> Vec<String> {
        self.python
            .iter()
            .map(|py| format!("{}-{}-{}", py, self.abi, self.platform))
            .collect()
    }
}

/// Major-version interpreter tags for a Python constraint.
///
/// `py2` when any 2.x is allowed, `py3` when any 3.x is; `py3` if neither.
pub fn python_tags(constraint: &VersionConstraint) -> Vec<String> {
    let tags: Vec<String> = [2u64, 3]
        .into_iter()
        .filter(|&major| {
            let line = Range::between(
                Version::from_release([major]),
                Version::from_release([major + 1]),
            );
            constraint.intersects(&line)
        })
        .map(|major| format!("py{}", major))
        .collect();

    if tags.is_empty() {
        tracing::debug!(
            "python constraint `{}` allows neither 2.x nor 3.x; tagging as py3",
            constraint
        );
        return vec!["py3".to_string()];
    }
    tags
}

/// `{name}-{version}-{python}-{abi}-{platform}.whl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    /// Escaped name (`_` separators).
    pub name: String,
    pub version: Version,
    pub tags: WheelTags,
}

impl ArtifactName {
    /// Compute the artifact name of a project.
    pub fn for_project(project: &ProjectDescriptor) -> Result<Self, BuildError> {
        Ok(ArtifactName {
            name: escape_name(&project.name)?,
            version: Version::parse(&project.version)?,
            tags: WheelTags::pure(&project.python_constraint),
        })
    }

    /// Parse a wheel file name without a build tag.
    pub fn parse(file_name: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidName {
            name: file_name.to_string(),
        };

        let stem = file_name
            .strip_suffix(&format!(".{}", WHEEL_EXTENSION))
            .ok_or_else(invalid)?;

        let [name, version, python, abi, platform]: [&str; 5] = stem
            .split('-')
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| invalid())?;

        Ok(ArtifactName {
            name: escape_name(name)?,
            version: Version::parse(version)?,
            tags: WheelTags {
                python: python.split('.').map(str::to_string).collect(),
                abi: abi.to_string(),
                platform: platform.to_string(),
            },
        })
    }

    /// `{name}-{version}`, the stem shared by the dist-info directory.
    pub fn distribution(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// `{name}-{version}.dist-info`
    pub fn dist_info_dir(&self) -> String {
        format!("{}.dist-info", self.distribution())
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}.{}",
            self.distribution(),
            self.tags.python_tag(),
            self.tags.abi,
            self.tags.platform,
            WHEEL_EXTENSION
        )
    }
}
