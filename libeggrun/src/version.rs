use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::probe::ProbeError;

lazy_static! {
    /// Dot-separated numeric components, optionally preceded by a 'v'.
    static ref DOTTED_VERSION: Regex = Regex::new(r"^v?\d+(?:\.\d+)*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("can't parse a dotted version from: \"{token}\"")]
pub struct VersionParseError {
    token: String,
}

/// A dotted version with any number of numeric components, e.g. 2.1.4 or 2.0.15.153.
///
/// Ordering is numeric and component-wise, so 2.1.10 sorts after 2.1.4.
/// Missing trailing components count as zero: 2.1 == 2.1.0.
#[derive(Debug, Clone)]
pub struct Version {
    components: Cow<'static, [u64]>,
}

static ZERO_VERSION: Version = Version::ZERO;

impl Version {
    pub const ZERO: Version = Version::from_static(&[0, 0, 0]);

    pub const fn from_static(components: &'static [u64]) -> Self {
        Self {
            components: Cow::Borrowed(components),
        }
    }

    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self::from_components(vec![major, minor, patch])
    }

    pub fn from_components(components: Vec<u64>) -> Self {
        Self {
            components: Cow::Owned(components),
        }
    }

    /// The components as written, e.g. [2, 0, 15, 153].
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// The components with trailing zeros dropped; equal versions share this.
    fn significant(&self) -> &[u64] {
        let len = self
            .components
            .iter()
            .rposition(|&c| c != 0)
            .map_or(0, |idx| idx + 1);
        &self.components()[..len]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // with trailing zeros dropped, a shorter prefix is the smaller version
        self.significant().cmp(other.significant())
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut components = self.components.iter();
        if let Some(first) = components.next() {
            write!(f, "{first}")?;
        }
        for component in components {
            write!(f, ".{component}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parse a version token such as "2.1.4", "v2.0.15" or "2.0.15.153".
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            token: token.to_string(),
        };

        let trimmed = token.trim();
        if !DOTTED_VERSION.is_match(trimmed) {
            return Err(err());
        }

        trimmed
            .trim_start_matches('v')
            .split('.')
            .map(|component| component.parse::<u64>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()
            .map(Version::from_components)
    }
}

/// The version reported by an external tool, or the reason it couldn't be determined.
///
/// `Unknown` compares exactly like version 0.0.0: an undetectable tool is
/// treated as the oldest possible release.
#[derive(Debug, Clone)]
pub enum ToolVersion {
    Known(Version),
    Unknown(ProbeError),
}

impl ToolVersion {
    /// The version used for comparisons.
    pub fn effective(&self) -> &Version {
        match self {
            ToolVersion::Known(version) => version,
            ToolVersion::Unknown(_) => &ZERO_VERSION,
        }
    }

    /// The probe failure, if the version couldn't be determined.
    pub fn probe_error(&self) -> Option<&ProbeError> {
        match self {
            ToolVersion::Known(_) => None,
            ToolVersion::Unknown(err) => Some(err),
        }
    }
}

impl From<Version> for ToolVersion {
    fn from(version: Version) -> Self {
        ToolVersion::Known(version)
    }
}

impl From<Result<Version, ProbeError>> for ToolVersion {
    fn from(result: Result<Version, ProbeError>) -> Self {
        match result {
            Ok(version) => ToolVersion::Known(version),
            Err(err) => ToolVersion::Unknown(err),
        }
    }
}

impl Display for ToolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolVersion::Known(version) => write!(f, "{version}"),
            ToolVersion::Unknown(_) => write!(f, "unknown"),
        }
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.effective() == other.effective()
    }
}

impl Eq for ToolVersion {}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.effective().cmp(other.effective())
    }
}

impl PartialEq<Version> for ToolVersion {
    fn eq(&self, other: &Version) -> bool {
        self.effective() == other
    }
}

impl PartialOrd<Version> for ToolVersion {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.effective().cmp(other))
    }
}
