//! Dependency manifest of the primary project.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::error::{ReleaseError, Result};

/// Reads and rewrites dependency pins in a manifest file
pub trait ManifestUpdater {
    /// Current constraint of `library_key`, `None` when the key is absent
    fn read_dependency_version(&self, manifest: &Path, library_key: &str) -> Result<Option<String>>;

    /// Replace the constraint of an existing `library_key`
    ///
    /// Fails with `ManifestEntryMissing` when the key is absent; new keys are never added.
    fn write_dependency_version(&self, manifest: &Path, library_key: &str, value: &str)
        -> Result<()>;
}

/// Composer-style JSON manifest.
///
/// Keys keep their order and the file is written with four-space indentation
/// and unescaped slashes, so a rewrite only touches the changed values.
#[derive(Debug, Clone)]
pub struct JsonManifest {
    section: String,
}

impl JsonManifest {
    pub fn new(section: impl Into<String>) -> Self {
        JsonManifest {
            section: section.into(),
        }
    }

    fn load(manifest: &Path) -> Result<Value> {
        let content = fs::read_to_string(manifest)?;
        let document: Value = serde_json::from_str(&content)?;
        if !document.is_object() {
            return Err(ReleaseError::manifest(format!(
                "{} is not a JSON object",
                manifest.display()
            )));
        }
        Ok(document)
    }

    fn store(manifest: &Path, document: &Value) -> Result<()> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;
        buffer.push(b'\n');
        fs::write(manifest, buffer)?;
        Ok(())
    }
}

impl Default for JsonManifest {
    fn default() -> Self {
        JsonManifest::new("require")
    }
}

impl ManifestUpdater for JsonManifest {
    fn read_dependency_version(&self, manifest: &Path, library_key: &str) -> Result<Option<String>> {
        let document = Self::load(manifest)?;
        let value = document
            .get(&self.section)
            .and_then(|section| section.get(library_key));

        match value {
            None => Ok(None),
            Some(Value::String(constraint)) => Ok(Some(constraint.clone())),
            Some(other) => Err(ReleaseError::manifest(format!(
                "{}.{} is not a string: {}",
                self.section, library_key, other
            ))),
        }
    }

    #[instrument(skip(self), fields(manifest = %manifest.display()))]
    fn write_dependency_version(
        &self,
        manifest: &Path,
        library_key: &str,
        value: &str,
    ) -> Result<()> {
        let mut document = Self::load(manifest)?;
        let entry = document
            .get_mut(&self.section)
            .and_then(|section| section.get_mut(library_key))
            .ok_or_else(|| ReleaseError::ManifestEntryMissing {
                library: library_key.to_string(),
                manifest: manifest.to_path_buf(),
            })?;

        *entry = Value::String(value.to_string());
        Self::store(manifest, &document)?;
        debug!(library = library_key, value, "pinned dependency");
        Ok(())
    }
}
