//! Python package versions.
//!
//! Implements the part of PEP 440 that wheel builds need: a numeric release
//! with optional pre-release, post-release and development segments.
//! Epochs and local version labels are rejected.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::BuildError;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*v?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:
            [-_.]?
            (?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?:
            -(?P<post_n1>[0-9]+)
            |
            [-_.]?
            (?P<post_l>post|rev|r)
            [-_.]?
            (?P<post_n2>[0-9]+)?
        )?
        (?:
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
        \s*$",
    )
    .expect("version regex is valid")
});

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreKind::Alpha,
            "b" | "beta" => PreKind::Beta,
            _ => PreKind::Rc,
        }
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        }
    }
}

/// A parsed, normalized version.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
}

impl Version {
    /// Create a final release from its numeric components.
    pub fn from_release(release: impl Into<Vec<u64>>) -> Self {
        let mut release = release.into();
        if release.is_empty() {
            release.push(0);
        }
        Version {
            release,
            pre: None,
            post: None,
            dev: None,
        }
    }

    /// Parse a declared version string.
    pub fn parse(s: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidVersion {
            version: s.to_string(),
        };

        let caps = VERSION_RE.captures(s).ok_or_else(invalid)?;

        let release = caps["release"]
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        let number = |name: &str| -> Result<Option<u64>, BuildError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>().map_err(|_| invalid()))
                .transpose()
        };

        let pre = match caps.name("pre_l") {
            Some(label) => Some((PreKind::from_label(label.as_str()), number("pre_n")?.unwrap_or(0))),
            None => None,
        };

        let post = if caps.name("post_n1").is_some() {
            number("post_n1")?
        } else if caps.name("post_l").is_some() {
            Some(number("post_n2")?.unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        Ok(Version {
            release,
            pre,
            post,
            dev,
        })
    }

    /// Numeric release components.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Pre-release phase and number, if any.
    pub fn pre(&self) -> Option<(PreKind, u64)> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    /// The release with component `index` incremented and every later one zeroed.
    ///
    /// Precision is kept: `1.2.3` bumped at 0 is `2.0.0`, `3.6` at 0 is `4.0`.
    /// `None` when the component is already `u64::MAX`.
    pub fn bump(&self, index: usize) -> Option<Version> {
        let len = self.release.len().max(index + 1);
        let release = (0..len)
            .map(|i| match i.cmp(&index) {
                Ordering::Less => Some(self.release.get(i).copied().unwrap_or(0)),
                Ordering::Equal => self.release.get(i).copied().unwrap_or(0).checked_add(1),
                Ordering::Greater => Some(0),
            })
            .collect::<Option<Vec<u64>>>()?;
        Some(Version::from_release(release))
    }

    /// Release components with trailing zeros removed, for comparison.
    fn trimmed_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }

    fn suffix_key(&self) -> (u8, Option<(PreKind, u64)>, Option<u64>, (bool, u64)) {
        // A bare `.devN` sorts before any pre-release of the same release.
        let phase = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => 0,
            (Some(_), _, _) => 1,
            _ => 2,
        };
        (
            phase,
            self.pre,
            self.post,
            (self.dev.is_none(), self.dev.unwrap_or(0)),
        )
    }
}

impl FromStr for Version {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;

        if let Some((kind, n)) = self.pre {
            write!(f, "{}{}", kind.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.trimmed_release()
            .cmp(other.trimmed_release())
            .then_with(|| self.suffix_key().cmp(&other.suffix_key()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed_release().hash(state);
        self.suffix_key().hash(state);
    }
}
