//! File selection engine.
//!
//! Turns a [`ProjectDescriptor`] into the [`Manifest`] of files a wheel
//! ships. Candidates come from the declared packages (in declaration
//! order) followed by top-level includes; each one is then run through a
//! fixed set of built-in excludes and the project's ordered rule list,
//! where the last matching rule decides.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};

use crate::core::errors::BuildError;
use crate::core::layout::{resolve_layout, LayoutKind};
use crate::core::project::{Format, ProjectDescriptor, SelectionRule};
use crate::util::fs::{glob_base, relative_path, to_archive_path, walk_files};
use crate::util::hash::sha256_file;
use crate::vcs::VcsIgnoreProvider;

/// Directory names never shipped.
const BUILTIN_EXCLUDED_DIRS: &[&str] = &["__pycache__", ".git", ".hg", ".svn", ".bzr"];

/// File names and patterns never shipped.
static BUILTIN_EXCLUDED_FILES: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    [".DS_Store", "Thumbs.db", "*.pyc", "*.pyo"]
        .iter()
        .map(|p| Pattern::new(p).expect("built-in exclude pattern is valid"))
        .collect()
});

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One file of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute path the content is read from.
    pub source_path: PathBuf,
    /// Path inside the archive, `/`-separated.
    pub archive_path: String,
    /// Whether the build synthesized or staged this entry itself.
    pub is_generated: bool,
}

impl ManifestEntry {
    pub fn new(source_path: impl Into<PathBuf>, archive_path: impl Into<String>) -> Self {
        ManifestEntry {
            source_path: source_path.into(),
            archive_path: archive_path.into(),
            is_generated: false,
        }
    }

    pub fn generated(source_path: impl Into<PathBuf>, archive_path: impl Into<String>) -> Self {
        ManifestEntry {
            is_generated: true,
            ..ManifestEntry::new(source_path, archive_path)
        }
    }
}

/// Ordered list of entries with unique archive paths.
///
/// Selection builds it; later stages may only append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, archive_path: &str) -> bool {
        self.entries.iter().any(|e| e.archive_path == archive_path)
    }

    /// Append a generated entry.
    pub fn push_generated(&mut self, entry: ManifestEntry) -> Result<(), BuildError> {
        if self.contains(&entry.archive_path) {
            return Err(BuildError::DuplicateEntry {
                path: entry.archive_path,
            });
        }
        self.entries.push(entry);
        Ok(())
    }
}

/// A rule compiled against the project root.
enum CompiledRule {
    VcsIgnored,
    Exclude(Pattern),
    Include(Pattern),
}

impl CompiledRule {
    fn compile(rule: &SelectionRule, format: Format) -> Result<Option<Self>, BuildError> {
        let pattern = |p: &str| {
            Pattern::new(p).map_err(|e| BuildError::InvalidPattern {
                pattern: p.to_string(),
                message: e.msg.to_string(),
            })
        };

        Ok(match rule {
            SelectionRule::VcsIgnored => Some(CompiledRule::VcsIgnored),
            SelectionRule::Exclude(p) => Some(CompiledRule::Exclude(pattern(p)?)),
            SelectionRule::Include(spec) if spec.applies_to(format) => {
                Some(CompiledRule::Include(pattern(&spec.pattern)?))
            }
            SelectionRule::Include(_) => None,
        })
    }

    /// Whether this rule matches `rel` (root-relative, `/`-separated) or one
    /// of its ancestor directories.
    fn matches(&self, rel: &str, source: &Path, root: &Path, ignored: &HashSet<PathBuf>) -> bool {
        match self {
            CompiledRule::VcsIgnored => {
                !ignored.is_empty()
                    && source
                        .ancestors()
                        .take_while(|p| p.starts_with(root) && *p != root)
                        .any(|p| ignored.contains(p))
            }
            CompiledRule::Exclude(pattern) | CompiledRule::Include(pattern) => {
                prefixes(rel).any(|prefix| pattern.matches_with(prefix, MATCH_OPTIONS))
            }
        }
    }

    fn includes(&self) -> bool {
        matches!(self, CompiledRule::Include(_))
    }

    fn describe(&self) -> String {
        match self {
            CompiledRule::VcsIgnored => "ignored by version control".to_string(),
            CompiledRule::Exclude(p) => format!("excluded by `{}`", p.as_str()),
            CompiledRule::Include(p) => format!("included by `{}`", p.as_str()),
        }
    }
}

/// `a`, `a/b`, `a/b/c.py` for `a/b/c.py`.
fn prefixes(rel: &str) -> impl Iterator<Item = &str> {
    rel.match_indices('/')
        .map(move |(i, _)| &rel[..i])
        .chain(std::iter::once(rel))
}

fn is_builtin_dir(name: &str) -> bool {
    BUILTIN_EXCLUDED_DIRS.contains(&name)
}

/// Whether the built-in exclude set drops `rel`. No rule can bring these back.
fn is_builtin_excluded(rel: &str) -> bool {
    let mut components = rel.split('/').peekable();
    while let Some(component) = components.next() {
        if components.peek().is_some() {
            if is_builtin_dir(component) {
                return true;
            }
        } else {
            return BUILTIN_EXCLUDED_FILES
                .iter()
                .any(|pattern| pattern.matches(component));
        }
    }
    false
}

/// A file proposed for the archive, before rules are applied.
struct Candidate {
    source: PathBuf,
    /// Root-relative path the rules match against.
    rel: String,
    archive_path: String,
}

impl Candidate {
    /// `origin` is the package or include declaration that produced `source`.
    fn new(root: &Path, base: &Path, source: PathBuf, origin: &str) -> Result<Self, BuildError> {
        let outside = |base: &Path| BuildError::InvalidPattern {
            pattern: origin.to_string(),
            message: format!("{} is outside {}", source.display(), base.display()),
        };

        let rel = to_archive_path(&relative_path(root, &source)).ok_or_else(|| outside(root))?;
        let archive_path =
            to_archive_path(&relative_path(base, &source)).ok_or_else(|| outside(base))?;

        Ok(Candidate {
            source,
            rel,
            archive_path,
        })
    }
}

/// Resolve the files the `format` build of `project` ships.
///
/// The ignore provider is queried once, and only when the rule list
/// consults it.
pub fn select_files(
    project: &ProjectDescriptor,
    vcs: &dyn VcsIgnoreProvider,
    format: Format,
) -> Result<Manifest, BuildError> {
    let root = project.root_dir.as_path();

    let rules = project
        .rules
        .iter()
        .map(|rule| CompiledRule::compile(rule, format))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()?;

    let ignored = if rules.iter().any(|r| matches!(r, CompiledRule::VcsIgnored)) {
        vcs.list_ignored(root)?
    } else {
        HashSet::new()
    };

    let mut entries: Vec<ManifestEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for candidate in collect_candidates(project, format)? {
        let rel = candidate.rel.as_str();

        if is_builtin_excluded(rel) {
            tracing::debug!("skipping {} (built-in exclude)", rel);
            continue;
        }

        let decisive = rules
            .iter()
            .rev()
            .find(|rule| rule.matches(rel, &candidate.source, root, &ignored));
        if let Some(rule) = decisive {
            tracing::debug!("{} {}", rel, rule.describe());
            if !rule.includes() {
                continue;
            }
        }

        let entry = ManifestEntry::new(candidate.source, candidate.archive_path);
        match positions.get(&entry.archive_path) {
            Some(&index) => {
                warn_on_conflict(&entries[index], &entry);
                entries[index] = entry;
            }
            None => {
                tracing::debug!("selected {} <- {}", entry.archive_path, rel);
                positions.insert(entry.archive_path.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    if entries.is_empty() {
        return Err(BuildError::NoFiles {
            root: root.to_path_buf(),
        });
    }

    Ok(Manifest { entries })
}

/// Packages in declaration order, then top-level includes.
fn collect_candidates(project: &ProjectDescriptor, format: Format) -> Result<Vec<Candidate>, BuildError> {
    let root = project.root_dir.as_path();
    let mut candidates = Vec::new();

    for spec in project.packages.iter().filter(|p| p.applies_to(format)) {
        let resolved = resolve_layout(root, spec)?;
        let source_root = resolved.source_root;

        let files = match resolved.layout {
            LayoutKind::SingleModule { path, .. } => vec![path],
            LayoutKind::PackageDirectory { path, .. } => walk_files(&path, skip_builtin_dir)?,
            LayoutKind::Glob { files, .. } => files,
        };

        for source in files {
            candidates.push(Candidate::new(root, &source_root, source, &spec.include)?);
        }
    }

    for include in project.includes().filter(|i| i.applies_to(format)) {
        let pattern = format!("{}/{}", glob_base(root), include.pattern);
        let paths = glob::glob_with(&pattern, MATCH_OPTIONS).map_err(|e| {
            BuildError::InvalidPattern {
                pattern: include.pattern.clone(),
                message: e.msg.to_string(),
            }
        })?;

        let mut matched = 0;
        for path in paths {
            let path = path.map_err(|e| {
                let failed = e.path().to_path_buf();
                BuildError::io(failed, e.into_error())
            })?;
            matched += 1;

            let files = if path.is_dir() {
                walk_files(&path, skip_builtin_dir)?
            } else {
                vec![path]
            };
            for source in files {
                candidates.push(Candidate::new(root, root, source, &include.pattern)?);
            }
        }

        if matched == 0 {
            tracing::debug!("include `{}` matched nothing", include.pattern);
        }
    }

    Ok(candidates)
}

fn skip_builtin_dir(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| is_builtin_dir(&name.to_string_lossy()))
}

fn warn_on_conflict(earlier: &ManifestEntry, later: &ManifestEntry) {
    if earlier.source_path == later.source_path {
        return;
    }

    let same_content = match (sha256_file(&earlier.source_path), sha256_file(&later.source_path)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_content {
        tracing::warn!(
            "`{}` is provided by both {} and {}; using the latter",
            later.archive_path,
            earlier.source_path.display(),
            later.source_path.display()
        );
    }
}
