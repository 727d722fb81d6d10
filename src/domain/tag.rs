use crate::domain::version::SemanticVersion;
use crate::error::Result;
use std::fmt;

/// Prefix every release tag carries.
pub const TAG_PREFIX: &str = "release-";

/// A release tag such as `release-1.0.01`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTag {
    pub version: SemanticVersion,
}

impl VersionTag {
    /// Create a tag for a version
    pub fn new(version: SemanticVersion) -> Self {
        VersionTag { version }
    }

    /// Parse a tag name, failing on anything outside the `release-x.y.zz` convention
    pub fn parse(name: &str) -> Result<Self> {
        SemanticVersion::parse(name).map(VersionTag::new)
    }

    /// Full tag name (e.g., "release-1.0.01")
    pub fn name(&self) -> String {
        format!("{}{}", TAG_PREFIX, self.version)
    }

    /// Resolve the current version from a tag listing.
    ///
    /// The lexicographically-last name wins; an empty listing means the
    /// library was never released and yields `0.0.00`. That last name must
    /// parse, otherwise the whole library fails rather than guessing.
    pub fn current_version<S: AsRef<str>>(tags: &[S]) -> Result<SemanticVersion> {
        let last = tags
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !name.trim().is_empty())
            .max();

        match last {
            Some(name) => Ok(VersionTag::parse(name.trim())?.version),
            None => Ok(SemanticVersion::initial()),
        }
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TAG_PREFIX, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;

    #[test]
    fn test_tag_name() {
        let tag = VersionTag::new(SemanticVersion::new(1, 0, 1));
        assert_eq!(tag.name(), "release-1.0.01");
        assert_eq!(tag.to_string(), "release-1.0.01");
    }

    #[test]
    fn test_current_version_without_tags() {
        let tags: Vec<String> = Vec::new();
        assert_eq!(
            VersionTag::current_version(&tags).unwrap().to_string(),
            "0.0.00"
        );
    }

    #[test]
    fn test_current_version_uses_last_tag() {
        let tags = vec!["release-1.0.00", "release-1.0.02", "release-1.0.01"];
        assert_eq!(
            VersionTag::current_version(&tags).unwrap(),
            SemanticVersion::new(1, 0, 2)
        );
    }

    #[test]
    fn test_current_version_is_lexicographic() {
        // 9.x sorts after 10.x as a string
        let tags = vec!["release-10.0.00", "release-9.9.99"];
        assert_eq!(
            VersionTag::current_version(&tags).unwrap(),
            SemanticVersion::new(9, 9, 99)
        );
    }

    #[test]
    fn test_current_version_rejects_foreign_tag() {
        let tags = vec!["release-1.0.00", "v2.0.0"];
        assert!(matches!(
            VersionTag::current_version(&tags),
            Err(ReleaseError::Parse(_))
        ));
    }
}
