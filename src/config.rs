use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::LibraryDescriptor;
use crate::error::{ReleaseError, Result};

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "release-libs.toml";

/// Represents the complete configuration for release-libs.
///
/// Names the libraries to release, the branch and remote conventions shared
/// by every repository, and how the primary project's manifest is updated.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Library names in processing order; each lives next to the primary project
    #[serde(default)]
    pub libraries: Vec<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub installer: InstallerConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_mainline() -> String {
    "master".to_string()
}

fn default_release() -> String {
    "release".to_string()
}

/// Development and release line names
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_mainline")]
    pub mainline: String,

    #[serde(default = "default_release")]
    pub release: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            mainline: default_mainline(),
            release: default_release(),
        }
    }
}

/// What a library is pinned to in the manifest
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PinStyle {
    /// Full tag name, e.g. `release-1.0.01`
    Tag,
    /// Bare version, e.g. `1.0.01`
    #[default]
    Version,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("composer.json")
}

fn default_manifest_section() -> String {
    "require".to_string()
}

/// Primary project dependency manifest settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ManifestConfig {
    /// Relative to the primary project
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,

    /// Vendor prefix of the manifest keys: `<namespace>/<library>`. Required.
    #[serde(default)]
    pub namespace: String,

    #[serde(default = "default_manifest_section")]
    pub section: String,

    #[serde(default)]
    pub pin: PinStyle,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            path: default_manifest_path(),
            namespace: String::new(),
            section: default_manifest_section(),
            pin: PinStyle::default(),
        }
    }
}

fn default_installer_command() -> Vec<String> {
    vec!["composer".to_string(), "update".to_string()]
}

fn default_true() -> bool {
    true
}

/// Dependency update run after the manifest is rewritten
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InstallerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_installer_command")]
    pub command: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        InstallerConfig {
            enabled: true,
            command: default_installer_command(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            libraries: Vec::new(),
            remote: default_remote(),
            branches: BranchesConfig::default(),
            manifest: ManifestConfig::default(),
            installer: InstallerConfig::default(),
        }
    }
}

/// Remote and branch names shared by every working copy in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    pub remote: String,
    pub mainline: String,
    pub release: String,
}

impl Default for BranchPolicy {
    fn default() -> Self {
        BranchPolicy {
            remote: default_remote(),
            mainline: default_mainline(),
            release: default_release(),
        }
    }
}

/// Configuration resolved against a primary project, ready to drive a run
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub primary_project: PathBuf,
    pub libraries: Vec<LibraryDescriptor>,
    pub branches: BranchPolicy,
    pub manifest_path: PathBuf,
    pub manifest_namespace: String,
    pub pin: PinStyle,
}

impl ReleaseConfig {
    /// Library descriptors for a primary project, in declaration order
    pub fn libraries_for(&self, primary_project: &Path) -> Vec<LibraryDescriptor> {
        self.libraries
            .iter()
            .map(|name| LibraryDescriptor::sibling_of(primary_project, name))
            .collect()
    }

    pub fn branch_policy(&self) -> BranchPolicy {
        BranchPolicy {
            remote: self.remote.clone(),
            mainline: self.branches.mainline.clone(),
            release: self.branches.release.clone(),
        }
    }

    /// Check that the configuration can drive a release
    pub fn validate(&self) -> Result<()> {
        if self.libraries.is_empty() {
            return Err(ReleaseError::config("no libraries configured"));
        }
        if let Some(name) = self
            .libraries
            .iter()
            .find(|name| name.trim().is_empty() || name.contains(['/', '\\']))
        {
            return Err(ReleaseError::config(format!(
                "invalid library name '{}'",
                name
            )));
        }
        if self.manifest.namespace.trim().is_empty() {
            return Err(ReleaseError::config("manifest namespace is not set"));
        }
        if self.manifest.namespace.contains('/') {
            return Err(ReleaseError::config(format!(
                "invalid manifest namespace '{}'",
                self.manifest.namespace
            )));
        }
        if self.branches.mainline == self.branches.release {
            return Err(ReleaseError::config(format!(
                "mainline and release line are both '{}'",
                self.branches.mainline
            )));
        }
        if self.installer.enabled && self.installer.command.is_empty() {
            return Err(ReleaseError::config("installer command is empty"));
        }
        Ok(())
    }

    /// Resolve this configuration against the primary project directory
    pub fn plan(&self, primary_project: &Path) -> Result<ReleasePlan> {
        self.validate()?;
        Ok(ReleasePlan {
            primary_project: primary_project.to_path_buf(),
            libraries: self.libraries_for(primary_project),
            branches: self.branch_policy(),
            manifest_path: primary_project.join(&self.manifest.path),
            manifest_namespace: self.manifest.namespace.clone(),
            pin: self.manifest.pin,
        })
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-libs.toml` in current directory
/// 3. `.release-libs.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(ReleaseConfig)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<ReleaseConfig> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        fs::read_to_string(CONFIG_FILE_NAME)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(ReleaseConfig::default());
        }
    } else {
        return Ok(ReleaseConfig::default());
    };

    parse_config(&config_str)
}

/// Parse a TOML configuration document
pub fn parse_config(content: &str) -> Result<ReleaseConfig> {
    toml::from_str(content).map_err(|e| ReleaseError::config(e.to_string()))
}
