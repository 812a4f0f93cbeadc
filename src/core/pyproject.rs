//! `pyproject.toml` parsing.
//!
//! Project metadata and layout rules live in the `[tool.poetry]` table.
//! Parsing goes through raw serde structs first, then gets validated and
//! converted into a [`ProjectDescriptor`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::constraint::VersionConstraint;
use crate::core::errors::BuildError;
use crate::core::project::{Dependency, Format, IncludeSpec, PackageSpec, ProjectDescriptor};

/// File name of the project file.
pub const PYPROJECT_NAME: &str = "pyproject.toml";

/// Prefixes of license files picked up when `license-file` is not declared.
const LICENSE_PREFIXES: &[&str] = &["LICENSE", "COPYING"];

#[derive(Debug, Default, Deserialize)]
struct RawPyProject {
    #[serde(default)]
    tool: Option<RawTool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTool {
    #[serde(default)]
    poetry: Option<RawPoetry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPoetry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    license_file: Option<PathBuf>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    maintainers: Vec<String>,
    #[serde(default)]
    readme: Option<PathBuf>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    documentation: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    classifiers: Vec<String>,
    #[serde(default)]
    packages: Option<Vec<RawPackage>>,
    #[serde(default)]
    include: Vec<RawInclude>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
    #[serde(default)]
    extras: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    plugins: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFormat {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    include: String,
    #[serde(default)]
    from: Option<PathBuf>,
    #[serde(default)]
    format: Option<RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInclude {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        format: Option<RawFormat>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Simple(String),
    Detailed {
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        optional: bool,
        #[serde(default)]
        python: Option<String>,
        #[serde(default)]
        extras: Vec<String>,
        #[serde(default)]
        markers: Option<String>,
    },
}

/// Load the project described by the `pyproject.toml` at `path`.
pub fn load_project(path: &Path) -> Result<ProjectDescriptor, BuildError> {
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    parse_project(&content, path, &root)
}

/// Parse `pyproject.toml` content for the project rooted at `root`.
pub fn parse_project(content: &str, path: &Path, root: &Path) -> Result<ProjectDescriptor, BuildError> {
    let raw: RawPyProject = toml::from_str(content).map_err(|e| BuildError::Manifest {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let poetry = raw
        .tool
        .and_then(|t| t.poetry)
        .ok_or_else(|| BuildError::MissingField {
            field: "tool.poetry".to_string(),
        })?;

    let name = poetry.name.unwrap_or_default();
    let version = poetry.version.unwrap_or_default();
    let mut project = ProjectDescriptor::new(name, version, root)?;

    let packages = match poetry.packages {
        Some(packages) => packages
            .into_iter()
            .map(|p| {
                Ok(PackageSpec {
                    include: p.include,
                    from: p.from,
                    formats: parse_formats(p.format, path)?,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?,
        None => vec![default_package(&project.name, root)],
    };
    project.packages = packages;

    // Excludes first, then includes: an include always overrides an exclude.
    for pattern in poetry.exclude {
        project = project.with_exclude(pattern);
    }
    for include in poetry.include {
        let spec = match include {
            RawInclude::Path(pattern) => IncludeSpec::new(pattern),
            RawInclude::Detailed { path: pattern, format } => {
                IncludeSpec::new(pattern).with_formats(parse_formats(format, path)?)
            }
        };
        project = project.with_include(spec);
    }

    for (dep_name, raw_dep) in poetry.dependencies {
        if dep_name.eq_ignore_ascii_case("python") {
            let constraint = match raw_dep {
                RawDependency::Simple(c) => c,
                RawDependency::Detailed { version, .. } => version.unwrap_or_default(),
            };
            project.python_constraint = VersionConstraint::parse(&constraint)?;
            continue;
        }
        project.dependencies.push(convert_dependency(dep_name, raw_dep)?);
    }

    project.license_files = match poetry.license_file {
        Some(file) => vec![root.join(file)],
        None => discover_license_files(root),
    };

    project.description = poetry.description;
    project.license = poetry.license;
    project.authors = poetry.authors;
    project.maintainers = poetry.maintainers;
    project.readme = poetry.readme.map(|r| root.join(r));
    project.homepage = poetry.homepage;
    project.repository = poetry.repository;
    project.documentation = poetry.documentation;
    project.keywords = poetry.keywords;
    project.classifiers = poetry.classifiers;
    project.extras = poetry.extras;
    project.scripts = poetry.scripts;
    project.plugins = poetry.plugins;

    Ok(project)
}

fn parse_formats(raw: Option<RawFormat>, path: &Path) -> Result<Vec<Format>, BuildError> {
    let names = match raw {
        None => return Ok(Vec::new()),
        Some(RawFormat::One(name)) => vec![name],
        Some(RawFormat::Many(names)) => names,
    };

    names
        .iter()
        .map(|n| {
            n.parse::<Format>().map_err(|message| BuildError::Manifest {
                path: path.to_path_buf(),
                message,
            })
        })
        .collect()
}

fn convert_dependency(name: String, raw: RawDependency) -> Result<Dependency, BuildError> {
    match raw {
        RawDependency::Simple(constraint) => {
            Ok(Dependency::new(name, VersionConstraint::parse(&constraint)?))
        }
        RawDependency::Detailed {
            version,
            optional,
            python,
            extras,
            markers,
        } => {
            let constraint = match version {
                Some(v) => VersionConstraint::parse(&v)?,
                None => VersionConstraint::any(),
            };
            let mut dep = Dependency::new(name, constraint);
            dep.optional = optional;
            dep.python = python.as_deref().map(VersionConstraint::parse).transpose()?;
            dep.extras = extras;
            dep.markers = markers;
            Ok(dep)
        }
    }
}

/// The package assumed when `packages` is not declared: the project name
/// as a module, at the root or under `src/`.
fn default_package(name: &str, root: &Path) -> PackageSpec {
    let module = name.to_lowercase().replace(['-', '.'], "_");

    let in_src = root.join("src");
    let at_root = root.join(&module).exists() || root.join(format!("{}.py", module)).exists();
    let under_src = in_src.join(&module).exists() || in_src.join(format!("{}.py", module)).exists();

    if !at_root && under_src {
        PackageSpec::new(module).with_from("src")
    } else {
        PackageSpec::new(module)
    }
}

fn discover_license_files(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| LICENSE_PREFIXES.iter().any(|prefix| n.starts_with(prefix)))
        })
        .collect();
    files.sort();
    files
}
