//! Project descriptor - the immutable model of what a build packages.
//!
//! A [`ProjectDescriptor`] is produced once (usually from `pyproject.toml`,
//! see [`crate::core::pyproject`]) and only read afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::constraint::VersionConstraint;
use crate::core::errors::BuildError;

/// Distribution format a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Wheel,
    Sdist,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wheel" | "whl" => Ok(Format::Wheel),
            "sdist" => Ok(Format::Sdist),
            _ => Err(format!("unknown format `{}` (expected `wheel` or `sdist`)", s)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Wheel => write!(f, "wheel"),
            Format::Sdist => write!(f, "sdist"),
        }
    }
}

/// Formats an entry is restricted to. Empty means every format.
fn applies(formats: &[Format], format: Format) -> bool {
    formats.is_empty() || formats.contains(&format)
}

/// A `packages` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package directory, module name, or glob, relative to the source root.
    pub include: String,
    /// Source-root prefix (e.g. `src`), stripped from archive paths.
    pub from: Option<PathBuf>,
    /// Formats this package is restricted to.
    pub formats: Vec<Format>,
}

impl PackageSpec {
    pub fn new(include: impl Into<String>) -> Self {
        PackageSpec {
            include: include.into(),
            from: None,
            formats: Vec::new(),
        }
    }

    /// Set the source-root prefix.
    pub fn with_from(mut self, from: impl Into<PathBuf>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Restrict to the given formats.
    pub fn with_formats(mut self, formats: Vec<Format>) -> Self {
        self.formats = formats;
        self
    }

    pub fn applies_to(&self, format: Format) -> bool {
        applies(&self.formats, format)
    }

    /// The directory the include is resolved against.
    pub fn source_root(&self, root_dir: &Path) -> PathBuf {
        match &self.from {
            Some(from) => root_dir.join(from),
            None => root_dir.to_path_buf(),
        }
    }
}

/// An `include` entry: an extra file, directory, or glob outside the packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    pub pattern: String,
    pub formats: Vec<Format>,
}

impl IncludeSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        IncludeSpec {
            pattern: pattern.into(),
            formats: Vec::new(),
        }
    }

    pub fn with_formats(mut self, formats: Vec<Format>) -> Self {
        self.formats = formats;
        self
    }

    pub fn applies_to(&self, format: Format) -> bool {
        applies(&self.formats, format)
    }
}

/// One entry of the ordered selection rule list.
///
/// Rules are evaluated left to right and the last rule matching a path
/// decides whether it ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRule {
    /// Paths reported as ignored by version control.
    VcsIgnored,
    /// Glob of paths to drop.
    Exclude(String),
    /// Glob of paths to ship, also adding them to the wheel when outside a package.
    Include(IncludeSpec),
}

/// A runtime requirement.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub constraint: VersionConstraint,
    pub optional: bool,
    pub extras: Vec<String>,
    /// Python versions this requirement applies to.
    pub python: Option<VersionConstraint>,
    /// Additional raw environment markers.
    pub markers: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Dependency {
            name: name.into(),
            constraint,
            optional: false,
            extras: Vec::new(),
            python: None,
            markers: None,
        }
    }
}

/// Immutable model of project metadata and layout rules.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    /// Name as declared.
    pub name: String,
    /// Version as declared; normalized only when naming the artifact.
    pub version: String,
    pub python_constraint: VersionConstraint,
    pub root_dir: PathBuf,
    pub packages: Vec<PackageSpec>,
    pub rules: Vec<SelectionRule>,

    pub description: Option<String>,
    pub license: Option<String>,
    /// License files copied into the dist-info directory.
    pub license_files: Vec<PathBuf>,
    pub authors: Vec<String>,
    pub maintainers: Vec<String>,
    pub readme: Option<PathBuf>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub documentation: Option<String>,
    pub keywords: Vec<String>,
    pub classifiers: Vec<String>,
    pub dependencies: Vec<Dependency>,
    /// Extra name to the optional dependencies it enables.
    pub extras: BTreeMap<String, Vec<String>>,
    /// Console script name to `module:callable`.
    pub scripts: BTreeMap<String, String>,
    /// Entry point group to name to target.
    pub plugins: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProjectDescriptor {
    /// Create a descriptor with no packages and no rules besides version-control ignores.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        root_dir: impl Into<PathBuf>,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        let version = version.into();

        if name.trim().is_empty() {
            return Err(BuildError::MissingField {
                field: "name".to_string(),
            });
        }
        if version.trim().is_empty() {
            return Err(BuildError::MissingField {
                field: "version".to_string(),
            });
        }

        Ok(ProjectDescriptor {
            name,
            version,
            python_constraint: VersionConstraint::any(),
            root_dir: root_dir.into(),
            packages: Vec::new(),
            rules: vec![SelectionRule::VcsIgnored],
            description: None,
            license: None,
            license_files: Vec::new(),
            authors: Vec::new(),
            maintainers: Vec::new(),
            readme: None,
            homepage: None,
            repository: None,
            documentation: None,
            keywords: Vec::new(),
            classifiers: Vec::new(),
            dependencies: Vec::new(),
            extras: BTreeMap::new(),
            scripts: BTreeMap::new(),
            plugins: BTreeMap::new(),
        })
    }

    pub fn with_package(mut self, package: PackageSpec) -> Self {
        self.packages.push(package);
        self
    }

    /// Append an exclude rule after every rule declared so far.
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.rules.push(SelectionRule::Exclude(pattern.into()));
        self
    }

    /// Append an include rule after every rule declared so far.
    pub fn with_include(mut self, include: IncludeSpec) -> Self {
        self.rules.push(SelectionRule::Include(include));
        self
    }

    pub fn with_python(mut self, constraint: VersionConstraint) -> Self {
        self.python_constraint = constraint;
        self
    }

    pub fn with_license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.license_files.push(path.into());
        self
    }

    /// Include entries in declaration order.
    pub fn includes(&self) -> impl Iterator<Item = &IncludeSpec> {
        self.rules.iter().filter_map(|rule| match rule {
            SelectionRule::Include(include) => Some(include),
            _ => None,
        })
    }
}
