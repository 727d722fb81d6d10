//! Domain logic - pure release rules independent of git operations

pub mod library;
pub mod tag;
pub mod task;
pub mod version;

pub use library::LibraryDescriptor;
pub use tag::VersionTag;
pub use task::TaskNumber;
pub use version::SemanticVersion;
