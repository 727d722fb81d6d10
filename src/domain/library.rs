use crate::error::{ReleaseError, Result};
use std::path::{Path, PathBuf};

/// A dependency library taking part in the release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDescriptor {
    pub name: String,
    pub working_directory: PathBuf,
}

impl LibraryDescriptor {
    pub fn new(name: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        LibraryDescriptor {
            name: name.into(),
            working_directory: working_directory.into(),
        }
    }

    /// Library living next to the primary project: `<primary>/../<name>`
    pub fn sibling_of(primary_project: &Path, name: &str) -> Self {
        LibraryDescriptor::new(name, primary_project.join("..").join(name))
    }

    /// Canonical path of the working copy, or `InvalidLibraryPath` if it does not exist.
    pub fn resolve(&self) -> Result<PathBuf> {
        let invalid = || ReleaseError::InvalidLibraryPath {
            name: self.name.clone(),
            path: self.working_directory.clone(),
        };

        let resolved = std::fs::canonicalize(&self.working_directory).map_err(|_| invalid())?;
        if !resolved.is_dir() {
            return Err(invalid());
        }
        Ok(resolved)
    }

    /// Key of this library in the primary project's manifest
    pub fn manifest_key(&self, namespace: &str) -> String {
        manifest_key(namespace, &self.name)
    }
}

/// Manifest key convention: `<namespace>/<library>`, or the bare name without a namespace
pub fn manifest_key(namespace: &str, library: &str) -> String {
    if namespace.is_empty() {
        library.to_string()
    } else {
        format!("{}/{}", namespace.trim_end_matches('/'), library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sibling_of() {
        let lib = LibraryDescriptor::sibling_of(Path::new("/work/app"), "testlib");
        assert_eq!(lib.working_directory, PathBuf::from("/work/app/../testlib"));
    }

    #[test]
    fn test_resolve_existing_sibling() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("app")).unwrap();
        std::fs::create_dir(root.path().join("testlib")).unwrap();

        let lib = LibraryDescriptor::sibling_of(&root.path().join("app"), "testlib");
        let resolved = lib.resolve().unwrap();
        assert_eq!(
            resolved,
            root.path().join("testlib").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_resolve_missing_path() {
        let root = TempDir::new().unwrap();
        let lib = LibraryDescriptor::new("ghost", root.path().join("ghost"));
        assert!(matches!(
            lib.resolve(),
            Err(ReleaseError::InvalidLibraryPath { .. })
        ));
    }

    #[test]
    fn test_resolve_file_is_invalid() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();
        let lib = LibraryDescriptor::new("notes", file);
        assert!(lib.resolve().is_err());
    }

    #[test]
    fn test_manifest_key() {
        let lib = LibraryDescriptor::new("testlib", "/tmp/testlib");
        assert_eq!(lib.manifest_key("paulchyrilov"), "paulchyrilov/testlib");
        assert_eq!(lib.manifest_key("paulchyrilov/"), "paulchyrilov/testlib");
        assert_eq!(lib.manifest_key(""), "testlib");
    }
}
