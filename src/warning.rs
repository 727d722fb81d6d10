use std::fmt;

/// Non-fatal conditions the operator should know about.
/// The run carries on after reporting them.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// Mainline was merged into the release line and pushed, but no tag was created
    UntaggedMerge {
        library: String,
        release_line: String,
        declined_tag: String,
    },
    /// Dependency update command failed; the manifest is still written
    InstallerFailed { command: String, reason: String },
    /// Manifest was rewritten but the aggregate commit was declined
    ManifestNotCommitted { manifest: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::UntaggedMerge {
                library,
                release_line,
                declined_tag,
            } => write!(
                f,
                "'{}' of {} holds merged work without a tag ({} was not created)",
                release_line, library, declined_tag
            ),
            ReleaseWarning::InstallerFailed { command, reason } => {
                write!(f, "Dependency update `{}` failed: {}", command, reason)
            }
            ReleaseWarning::ManifestNotCommitted { manifest } => {
                write!(f, "{} was updated but not committed", manifest)
            }
        }
    }
}
