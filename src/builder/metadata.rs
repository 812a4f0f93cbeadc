//! Metadata assembly for the `.dist-info` directory.
//!
//! Produces `METADATA` (core metadata 2.1), `WHEEL`, the optional
//! `entry_points.txt`, stages license files into the manifest, and
//! accumulates the `RECORD` as the archive is written.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::builder::naming::{canonicalize_name, ArtifactName};
use crate::builder::selection::{Manifest, ManifestEntry};
use crate::core::errors::BuildError;
use crate::core::project::{Dependency, ProjectDescriptor};
use crate::util::hash::record_digest;

pub const METADATA_VERSION: &str = "2.1";
pub const WHEEL_VERSION: &str = "1.0";

pub const METADATA_FILE: &str = "METADATA";
pub const WHEEL_FILE: &str = "WHEEL";
pub const ENTRY_POINTS_FILE: &str = "entry_points.txt";
pub const RECORD_FILE: &str = "RECORD";

static PERSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^<>]+?)\s*(?:<(?P<email>[^<>]+)>)?\s*$").expect("person regex is valid")
});

/// A file generated into the dist-info directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistInfoFile {
    /// Archive path, including the dist-info directory.
    pub archive_path: String,
    pub contents: Vec<u8>,
}

/// Generated dist-info contents, in write order. `RECORD` is not included;
/// it is produced by [`Record`] once everything else is written.
#[derive(Debug, Clone)]
pub struct DistInfo {
    pub dir: String,
    pub files: Vec<DistInfoFile>,
}

impl DistInfo {
    fn push(&mut self, name: &str, contents: String) {
        self.files.push(DistInfoFile {
            archive_path: format!("{}/{}", self.dir, name),
            contents: contents.into_bytes(),
        });
    }

    /// Archive path of the `RECORD` file.
    pub fn record_path(&self) -> String {
        format!("{}/{}", self.dir, RECORD_FILE)
    }
}

/// Build the dist-info contents for `project`.
///
/// License files are appended to `manifest` as generated entries; nothing
/// already in it is touched.
pub fn assemble_metadata(
    project: &ProjectDescriptor,
    artifact: &ArtifactName,
    manifest: &mut Manifest,
) -> Result<DistInfo, BuildError> {
    let mut dist_info = DistInfo {
        dir: artifact.dist_info_dir(),
        files: Vec::new(),
    };

    stage_license_files(project, &dist_info.dir, manifest)?;

    dist_info.push(METADATA_FILE, render_metadata(project, artifact)?);
    dist_info.push(WHEEL_FILE, render_wheel(artifact));
    if let Some(entry_points) = render_entry_points(project) {
        dist_info.push(ENTRY_POINTS_FILE, entry_points);
    }

    Ok(dist_info)
}

fn stage_license_files(
    project: &ProjectDescriptor,
    dist_info_dir: &str,
    manifest: &mut Manifest,
) -> Result<(), BuildError> {
    for path in &project.license_files {
        if !path.is_file() {
            tracing::warn!("license file {} does not exist; skipping", path.display());
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let archive_path = format!("{}/{}", dist_info_dir, file_name.to_string_lossy());
        tracing::debug!("staging license {} -> {}", path.display(), archive_path);
        manifest.push_generated(ManifestEntry::generated(path, archive_path))?;
    }
    Ok(())
}

/// Render the core metadata file.
pub fn render_metadata(project: &ProjectDescriptor, artifact: &ArtifactName) -> Result<String, BuildError> {
    let mut out = String::new();
    let mut field = |key: &str, value: &str| {
        if !value.is_empty() {
            let _ = writeln!(out, "{}: {}", key, value);
        }
    };

    field("Metadata-Version", METADATA_VERSION);
    field("Name", project.name.trim());
    field("Version", &artifact.version.to_string());
    field("Summary", project.description.as_deref().unwrap_or_default());
    field("Home-page", project.homepage.as_deref().unwrap_or_default());
    field("License", project.license.as_deref().unwrap_or_default());
    field("Keywords", &project.keywords.join(","));

    if let Some((name, email)) = project.authors.first().map(|a| split_person(a)) {
        field("Author", name);
        field("Author-email", email.unwrap_or_default());
    }
    if let Some((name, email)) = project.maintainers.first().map(|m| split_person(m)) {
        field("Maintainer", name);
        field("Maintainer-email", email.unwrap_or_default());
    }

    field("Requires-Python", &project.python_constraint.to_specifier());

    for classifier in &project.classifiers {
        field("Classifier", classifier);
    }
    for extra in project.extras.keys() {
        field("Provides-Extra", extra);
    }
    for dependency in &project.dependencies {
        if let Some(requirement) = requirement(project, dependency)? {
            field("Requires-Dist", &requirement);
        }
    }

    if let Some(url) = &project.documentation {
        field("Project-URL", &format!("Documentation, {}", url));
    }
    if let Some(url) = &project.repository {
        field("Project-URL", &format!("Repository, {}", url));
    }

    if let Some(readme) = &project.readme {
        let body = std::fs::read_to_string(readme).map_err(|e| BuildError::io(readme, e))?;
        field("Description-Content-Type", content_type(readme));
        out.push('\n');
        out.push_str(&body);
    }

    Ok(out)
}

fn split_person(person: &str) -> (&str, Option<&str>) {
    match PERSON_RE.captures(person) {
        Some(caps) => (
            caps.name("name").map_or(person, |m| m.as_str()),
            caps.name("email").map(|m| m.as_str()),
        ),
        None => (person.trim(), None),
    }
}

fn content_type(readme: &Path) -> &'static str {
    match readme.extension().and_then(|e| e.to_str()) {
        Some("md") => "text/markdown",
        Some("rst") => "text/x-rst",
        _ => "text/plain",
    }
}

/// A `Requires-Dist` value, e.g. `pendulum (>=1.4,<2.0); extra == "time"`.
///
/// Optional dependencies no extra refers to are left out.
fn requirement(project: &ProjectDescriptor, dependency: &Dependency) -> Result<Option<String>, BuildError> {
    let mut requirement = dependency.name.clone();
    if !dependency.extras.is_empty() {
        let _ = write!(requirement, "[{}]", dependency.extras.join(","));
    }

    let specifier = dependency.constraint.to_specifier();
    if !specifier.is_empty() {
        let _ = write!(requirement, " ({})", specifier);
    }

    let mut markers = Vec::new();
    if let Some(python) = &dependency.python {
        markers.push(python.to_marker("python_version"));
    }
    if let Some(raw) = &dependency.markers {
        markers.push(raw.clone());
    }

    if dependency.optional {
        let canonical = canonicalize_name(&dependency.name)?;
        let mut extras = BTreeSet::new();
        for (extra, members) in &project.extras {
            for member in members {
                if canonicalize_name(member)? == canonical {
                    extras.insert(extra.as_str());
                }
            }
        }
        if extras.is_empty() {
            tracing::debug!("optional dependency `{}` belongs to no extra", dependency.name);
            return Ok(None);
        }
        let clauses: Vec<String> = extras.iter().map(|e| format!("extra == \"{}\"", e)).collect();
        markers.push(clauses.join(" or "));
    }

    let markers: Vec<String> = markers.into_iter().filter(|m| !m.is_empty()).collect();
    let marker = match markers.as_slice() {
        [] => String::new(),
        [single] => single.clone(),
        many => many
            .iter()
            .map(|m| if m.contains(" or ") { format!("({})", m) } else { m.clone() })
            .collect::<Vec<_>>()
            .join(" and "),
    };
    if !marker.is_empty() {
        let _ = write!(requirement, "; {}", marker);
    }

    Ok(Some(requirement))
}

/// Render the `WHEEL` file.
pub fn render_wheel(artifact: &ArtifactName) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Wheel-Version: {}", WHEEL_VERSION);
    let _ = writeln!(out, "Generator: wharf ({})", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "Root-Is-Purelib: true");
    for tag in artifact.tags.expanded() {
        let _ = writeln!(out, "Tag: {}", tag);
    }
    out
}

/// Render `entry_points.txt`, or `None` when nothing is declared.
pub fn render_entry_points(project: &ProjectDescriptor) -> Option<String> {
    let mut sections = Vec::new();

    if !project.scripts.is_empty() {
        sections.push(render_section("console_scripts", project.scripts.iter()));
    }
    for (group, entries) in &project.plugins {
        if !entries.is_empty() {
            sections.push(render_section(group, entries.iter()));
        }
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n"))
    }
}

fn render_section<'a>(name: &str, entries: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    let mut out = format!("[{}]\n", name);
    for (key, target) in entries {
        let _ = writeln!(out, "{} = {}", key, target);
    }
    out
}

/// Accumulates `RECORD` lines as entries are written.
#[derive(Debug, Default)]
pub struct Record {
    lines: Vec<String>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Record an entry with its final bytes.
    pub fn add(&mut self, archive_path: &str, contents: &[u8]) {
        self.lines.push(format!(
            "{},{},{}",
            csv_field(archive_path),
            record_digest(contents),
            contents.len()
        ));
    }

    /// Render the record, listing itself at `record_path` with no hash or size.
    pub fn finish(mut self, record_path: &str) -> String {
        self.lines.push(format!("{},,", csv_field(record_path)));
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pyproject::load_project;
    use crate::test_support::ProjectFixture;

    fn complete() -> (tempfile::TempDir, ProjectDescriptor, ArtifactName) {
        let tmp = ProjectFixture::complete().create();
        let project = load_project(&tmp.path().join("pyproject.toml")).unwrap();
        let artifact = ArtifactName::for_project(&project).unwrap();
        (tmp, project, artifact)
    }

    #[test]
    fn test_metadata_fields() {
        let (_tmp, project, artifact) = complete();
        let metadata = render_metadata(&project, &artifact).unwrap();

        let expected_head = "\
Metadata-Version: 2.1
Name: my-package
Version: 1.2.3
Summary: Some description.
Home-page: https://poetry.eustace.io/
License: MIT
Keywords: packaging,dependency,poetry
Author: Sébastien Eustace
Author-email: sebastien@eustace.io
Maintainer: People Everywhere
Maintainer-email: people@everywhere.com
Requires-Python: >=3.6,<4.0
Classifier: Topic :: Software Development :: Build Tools
Classifier: Topic :: Software Development :: Libraries :: Python Modules
Provides-Extra: time
Requires-Dist: cachy[msgpack] (>=0.2.0,<0.3.0)
Requires-Dist: cleo (>=0.6,<0.7)
Requires-Dist: pathlib2 (>=2.2,<3.0); python_version >= \"2.7\" and python_version < \"2.8\"
Requires-Dist: pendulum (>=1.4,<2.0); extra == \"time\"
Project-URL: Documentation, https://poetry.eustace.io/docs
Project-URL: Repository, https://github.com/sdispater/poetry
Description-Content-Type: text/x-rst

My Package
==========
";
        assert_eq!(metadata, expected_head);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let project = ProjectDescriptor::new("module1", "0.1", "/p").unwrap();
        let artifact = ArtifactName::for_project(&project).unwrap();
        let metadata = render_metadata(&project, &artifact).unwrap();
        assert_eq!(metadata, "Metadata-Version: 2.1\nName: module1\nVersion: 0.1\n");
    }

    #[test]
    fn test_prerelease_version_is_normalized() {
        let project = ProjectDescriptor::new("prerelease", "0.1-beta.1", "/p").unwrap();
        let artifact = ArtifactName::for_project(&project).unwrap();
        let metadata = render_metadata(&project, &artifact).unwrap();
        assert!(metadata.contains("\nVersion: 0.1b1\n"));
    }

    #[test]
    fn test_wheel_file() {
        let (_tmp, _project, artifact) = complete();
        assert_eq!(
            render_wheel(&artifact),
            format!(
                "Wheel-Version: 1.0\nGenerator: wharf ({})\nRoot-Is-Purelib: true\nTag: py3-none-any\n",
                env!("CARGO_PKG_VERSION")
            )
        );
    }

    #[test]
    fn test_entry_points() {
        let (_tmp, project, _artifact) = complete();
        assert_eq!(
            render_entry_points(&project).unwrap(),
            "[console_scripts]\n\
             my-2nd-script = my_package:main2\n\
             my-script = my_package:main\n\
             \n\
             [blogtool.parsers]\n\
             .rst = some_module::SomeClass\n"
        );

        let bare = ProjectDescriptor::new("module1", "0.1", "/p").unwrap();
        assert!(render_entry_points(&bare).is_none());
    }

    #[test]
    fn test_assemble_stages_license() {
        let (tmp, project, artifact) = complete();
        let mut manifest = Manifest::default();

        let dist_info = assemble_metadata(&project, &artifact, &mut manifest).unwrap();

        assert_eq!(dist_info.dir, "my_package-1.2.3.dist-info");
        assert_eq!(
            manifest.entries(),
            &[ManifestEntry::generated(
                tmp.path().join("LICENSE"),
                "my_package-1.2.3.dist-info/LICENSE"
            )]
        );
        let names: Vec<&str> = dist_info.files.iter().map(|f| f.archive_path.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "my_package-1.2.3.dist-info/METADATA",
                "my_package-1.2.3.dist-info/WHEEL",
                "my_package-1.2.3.dist-info/entry_points.txt",
            ]
        );
        assert_eq!(dist_info.record_path(), "my_package-1.2.3.dist-info/RECORD");
    }

    #[test]
    fn test_missing_license_file_is_skipped() {
        let project = ProjectDescriptor::new("demo", "1.0", "/nonexistent")
            .unwrap()
            .with_license_file("/nonexistent/LICENSE");
        let artifact = ArtifactName::for_project(&project).unwrap();
        let mut manifest = Manifest::default();

        assemble_metadata(&project, &artifact, &mut manifest).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_record() {
        let mut record = Record::new();
        record.add("module1.py", b"hello");
        record.add("odd,name.txt", b"");

        assert_eq!(
            record.finish("module1-0.1.dist-info/RECORD"),
            "module1.py,sha256=LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ,5\n\
             \"odd,name.txt\",sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU,0\n\
             module1-0.1.dist-info/RECORD,,\n"
        );
    }
}
