use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Highest patch value before it carries into minor.
pub const PATCH_LIMIT: u64 = 99;
/// Highest minor value before it carries into major.
pub const MINOR_LIMIT: u64 = 9;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^release-(\d+)\.(\d+)\.(\d+)$").expect("tag pattern is a valid regex")
    })
}

fn bare_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("version pattern is a valid regex")
    })
}

/// Library release version: `major.minor.patch` with a two-digit patch field.
///
/// This is a fixed-radix counter rather than semver: patch rolls over after
/// 99 and minor after 9, each carrying into the next component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// The version reported for a library that has never been tagged.
    pub fn initial() -> Self {
        SemanticVersion::default()
    }

    /// Parse either a release tag (`release-1.2.03`) or a bare version (`1.2.03`).
    ///
    /// Matching is strict: the whole input must fit one of the two forms and
    /// yield exactly three numeric groups.
    pub fn parse(input: &str) -> Result<Self> {
        let captures = tag_pattern()
            .captures(input)
            .or_else(|| bare_pattern().captures(input))
            .ok_or_else(|| ReleaseError::parse(format!("Can't parse version: '{}'", input)))?;

        if captures.len() != 4 {
            return Err(ReleaseError::parse(format!(
                "Can't parse version: '{}' - expected three numeric groups",
                input
            )));
        }

        let component = |index: usize| -> Result<u64> {
            captures[index].parse::<u64>().map_err(|_| {
                ReleaseError::parse(format!(
                    "Version component '{}' in '{}' is out of range",
                    &captures[index], input
                ))
            })
        };

        Ok(SemanticVersion {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Next version with carry: patch wraps after 99 into minor, minor wraps after 9 into major.
    pub fn increment(&self) -> Self {
        let mut next = *self;
        next.patch += 1;
        if next.patch > PATCH_LIMIT {
            next.patch = 0;
            next.minor += 1;
            if next.minor > MINOR_LIMIT {
                next.minor = 0;
                next.major += 1;
            }
        }
        next
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{:02}", self.major, self.minor, self.patch)
    }
}

impl std::str::FromStr for SemanticVersion {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}
