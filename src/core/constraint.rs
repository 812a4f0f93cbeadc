//! Version constraints for dependencies and the Python requirement.
//!
//! Constraints are written in the project file using the caret/tilde
//! shorthand common in pyproject-based tools as well as plain PEP 440
//! comparison operators. Each one is resolved into a [`Range`] so that it
//! can be queried, and rendered back as PEP 508 specifiers or markers for
//! the core metadata file.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use pubgrub::Range;
use regex::Regex;

use crate::core::errors::BuildError;
use crate::core::version::Version;

static COMPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<op>\^|~=|~|===|==|!=|<=|>=|<|>|=)?\s*(?P<version>[^\s,<>=!~^|]+)")
        .expect("comparator regex is valid")
});

/// A single comparison within a constraint.
///
/// The shorthand forms carry the exclusive upper bound they expand to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    /// `*`
    Any,
    /// `==1.2.3` or a bare `1.2.3`
    Exact(Version),
    /// `==1.2.*` or a bare `1.2.*`
    Wildcard { prefix: Version, upper: Version },
    /// `!=1.2.*`
    NotWildcard { prefix: Version, upper: Version },
    /// `!=1.2.3`
    NotEqual(Version),
    Greater(Version),
    GreaterEq(Version),
    Less(Version),
    LessEq(Version),
    /// `^1.2.3`: changes that keep the left-most non-zero component
    Caret { lower: Version, upper: Version },
    /// `~1.2.3`: patch-level changes
    Tilde { lower: Version, upper: Version },
    /// `~=1.4.5`: PEP 440 compatible release
    Compatible { lower: Version, upper: Version },
}

impl Comparator {
    fn parse(op: Option<&str>, version: &str, raw: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidConstraint {
            constraint: raw.to_string(),
        };
        let bump = |v: &Version, index: usize| v.bump(index).ok_or_else(invalid);

        if version == "*" {
            return match op {
                None | Some("==") | Some("=") => Ok(Comparator::Any),
                _ => Err(invalid()),
            };
        }

        if let Some(prefix) = version.strip_suffix(".*") {
            let prefix = Version::parse(prefix).map_err(|_| invalid())?;
            let upper = bump(&prefix, prefix.release().len() - 1)?;
            return match op {
                None | Some("==") | Some("=") => Ok(Comparator::Wildcard { prefix, upper }),
                Some("!=") => Ok(Comparator::NotWildcard { prefix, upper }),
                _ => Err(invalid()),
            };
        }

        let v = Version::parse(version).map_err(|_| invalid())?;
        Ok(match op {
            None | Some("==") | Some("=") | Some("===") => Comparator::Exact(v),
            Some("!=") => Comparator::NotEqual(v),
            Some(">") => Comparator::Greater(v),
            Some(">=") => Comparator::GreaterEq(v),
            Some("<") => Comparator::Less(v),
            Some("<=") => Comparator::LessEq(v),
            Some("^") => {
                // ^1.2.3 := >=1.2.3,<2.0.0; ^0.2.3 := >=0.2.3,<0.3.0; ^0.0.3 := <0.0.4
                let release = v.release();
                let index = release
                    .iter()
                    .position(|&n| n != 0)
                    .unwrap_or(release.len() - 1);
                let upper = bump(&v, index)?;
                Comparator::Caret { lower: v, upper }
            }
            Some("~") => {
                // ~1.2.3 := >=1.2.3,<1.3.0; ~1 := >=1,<2
                let index = if v.release().len() > 1 { 1 } else { 0 };
                let upper = bump(&v, index)?;
                Comparator::Tilde { lower: v, upper }
            }
            Some("~=") => {
                if v.release().len() < 2 {
                    return Err(invalid());
                }
                let upper = bump(&v, v.release().len() - 2)?;
                Comparator::Compatible { lower: v, upper }
            }
            Some(_) => return Err(invalid()),
        })
    }

    /// Lower and upper bounds of the shorthand operators, as `(lower, upper)`.
    fn bounds(&self) -> Option<(&Version, &Version)> {
        match self {
            Comparator::Wildcard { prefix: lower, upper }
            | Comparator::Caret { lower, upper }
            | Comparator::Tilde { lower, upper }
            | Comparator::Compatible { lower, upper } => Some((lower, upper)),
            _ => None,
        }
    }

    /// Convert to a version range.
    pub fn to_range(&self) -> Range<Version> {
        if let Some((lower, upper)) = self.bounds() {
            return Range::between(lower.clone(), upper.clone());
        }

        match self {
            Comparator::Any => Range::full(),
            Comparator::Exact(v) => Range::singleton(v.clone()),
            Comparator::NotEqual(v) => Range::singleton(v.clone()).complement(),
            Comparator::NotWildcard { prefix, upper } => {
                Range::between(prefix.clone(), upper.clone()).complement()
            }
            Comparator::Greater(v) => Range::strictly_higher_than(v.clone()),
            Comparator::GreaterEq(v) => Range::higher_than(v.clone()),
            Comparator::Less(v) => Range::strictly_lower_than(v.clone()),
            Comparator::LessEq(v) => Range::lower_than(v.clone()),
            _ => Range::full(),
        }
    }

    /// PEP 440 specifier clauses equivalent to this comparator.
    pub fn specifiers(&self) -> Vec<(&'static str, String)> {
        if let Comparator::Wildcard { prefix, .. } = self {
            return vec![("==", format!("{}.*", prefix))];
        }
        if let Some((lower, upper)) = self.bounds() {
            return vec![(">=", lower.to_string()), ("<", upper.to_string())];
        }

        match self {
            Comparator::Any => Vec::new(),
            Comparator::Exact(v) => vec![("==", v.to_string())],
            Comparator::NotEqual(v) => vec![("!=", v.to_string())],
            Comparator::NotWildcard { prefix, .. } => vec![("!=", format!("{}.*", prefix))],
            Comparator::Greater(v) => vec![(">", v.to_string())],
            Comparator::GreaterEq(v) => vec![(">=", v.to_string())],
            Comparator::Less(v) => vec![("<", v.to_string())],
            Comparator::LessEq(v) => vec![("<=", v.to_string())],
            _ => Vec::new(),
        }
    }
}

/// A parsed version constraint: a union of comparator conjunctions.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    raw: String,
    branches: Vec<Vec<Comparator>>,
    range: Range<Version>,
}

impl VersionConstraint {
    /// The constraint that allows every version.
    pub fn any() -> Self {
        VersionConstraint {
            raw: "*".to_string(),
            branches: vec![vec![Comparator::Any]],
            range: Range::full(),
        }
    }

    /// Parse a constraint such as `^3.6`, `>=2.7,<3.0 || >=3.4` or `*`.
    pub fn parse(s: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidConstraint {
            constraint: s.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::any());
        }

        let mut branches = Vec::new();
        let mut range = Range::empty();

        for branch in trimmed.split("||").flat_map(|b| b.split('|')) {
            let branch = branch.trim();
            if branch.is_empty() {
                return Err(invalid());
            }

            let mut comparators = Vec::new();
            let mut branch_range = Range::full();
            let mut cursor = 0;

            for caps in COMPARATOR_RE.captures_iter(branch) {
                let Some(whole) = caps.get(0) else { continue };
                if !is_separator(&branch[cursor..whole.start()]) {
                    return Err(invalid());
                }
                cursor = whole.end();

                let op = caps.name("op").map(|m| m.as_str());
                let comparator = Comparator::parse(op, &caps["version"], s)?;
                branch_range = branch_range.intersection(&comparator.to_range());
                comparators.push(comparator);
            }

            if comparators.is_empty() || !is_separator(&branch[cursor..]) {
                return Err(invalid());
            }

            range = range.union(&branch_range);
            branches.push(comparators);
        }

        Ok(VersionConstraint {
            raw: trimmed.to_string(),
            branches,
            range,
        })
    }

    /// The constraint as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The set of versions this constraint allows.
    pub fn range(&self) -> &Range<Version> {
        &self.range
    }

    /// Whether every version is allowed.
    pub fn is_any(&self) -> bool {
        self.range == Range::full()
    }

    pub fn allows(&self, version: &Version) -> bool {
        self.range.contains(version)
    }

    /// Whether any version in `other` is allowed.
    pub fn intersects(&self, other: &Range<Version>) -> bool {
        self.range.intersection(other) != Range::empty()
    }

    /// Render as a PEP 508 specifier set, e.g. `>=3.6,<4.0`.
    ///
    /// Specifier sets cannot express unions, so a constraint with several
    /// branches renders as the bounds of the branches it spans.
    pub fn to_specifier(&self) -> String {
        if self.is_any() {
            return String::new();
        }

        if let [branch] = self.branches.as_slice() {
            return join_specifiers(branch.iter().flat_map(Comparator::specifiers));
        }

        tracing::debug!(
            "constraint `{}` has {} branches; rendering its outer bounds",
            self.raw,
            self.branches.len()
        );
        let mut lower: Option<(&'static str, String, Version)> = None;
        let mut upper: Option<(&'static str, String, Version)> = None;
        let mut unbounded_below = false;
        let mut unbounded_above = false;

        for branch in &self.branches {
            let specs: Vec<_> = branch.iter().flat_map(Comparator::specifiers).collect();
            let lows: Vec<_> = specs.iter().filter(|(op, _)| op.starts_with('>')).collect();
            let highs: Vec<_> = specs.iter().filter(|(op, _)| op.starts_with('<')).collect();

            if lows.is_empty() {
                unbounded_below = true;
            }
            for &(op, ref text) in lows {
                let v = Version::parse(text).unwrap_or_else(|_| Version::from_release([0]));
                if lower.as_ref().map_or(true, |(_, _, cur)| v < *cur) {
                    lower = Some((op, text.clone(), v));
                }
            }

            if highs.is_empty() {
                unbounded_above = true;
            }
            for &(op, ref text) in highs {
                let v = Version::parse(text).unwrap_or_else(|_| Version::from_release([0]));
                if upper.as_ref().map_or(true, |(_, _, cur)| v > *cur) {
                    upper = Some((op, text.clone(), v));
                }
            }
        }

        let mut specs = Vec::new();
        if let (false, Some((op, text, _))) = (unbounded_below, lower) {
            specs.push((op, text));
        }
        if let (false, Some((op, text, _))) = (unbounded_above, upper) {
            specs.push((op, text));
        }
        join_specifiers(specs)
    }

    /// Render as an environment marker over `variable`,
    /// e.g. `python_version >= "3.6" and python_version < "4.0"`.
    pub fn to_marker(&self, variable: &str) -> String {
        if self.is_any() {
            return String::new();
        }

        let branches: Vec<String> = self
            .branches
            .iter()
            .map(|branch| {
                branch
                    .iter()
                    .flat_map(Comparator::specifiers)
                    .map(|(op, v)| match v.strip_suffix(".*") {
                        Some(prefix) if op == "==" => format!("{} == \"{}\"", variable, prefix),
                        Some(prefix) => format!("{} != \"{}\"", variable, prefix),
                        None => format!("{} {} \"{}\"", variable, op, v),
                    })
                    .collect::<Vec<_>>()
                    .join(" and ")
            })
            .filter(|b| !b.is_empty())
            .collect();

        match branches.as_slice() {
            [] => String::new(),
            [single] => single.clone(),
            many => many
                .iter()
                .map(|b| if b.contains(" and ") { format!("({})", b) } else { b.clone() })
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

fn is_separator(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c == ',')
}

fn join_specifiers(specs: impl IntoIterator<Item = (&'static str, String)>) -> String {
    specs
        .into_iter()
        .map(|(op, v)| format!("{}{}", op, v))
        .collect::<Vec<_>>()
        .join(",")
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for VersionConstraint {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionConstraint::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
