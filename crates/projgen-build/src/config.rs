//! Generator configuration types (projgen.toml format).

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Root generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Project metadata.
    pub project: ProjectConfig,

    /// Root directories of the four file domains.
    pub directories: DirectoriesConfig,

    /// Scheme generation settings.
    #[serde(default)]
    pub schemes: SchemesConfig,
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    pub name: String,

    /// Location of the emitted project container, relative to the workspace
    /// root (e.g. `path/to/Foo.xcodeproj`).
    pub workspace_output_path: PathBuf,
}

/// Root directories of the file domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Absolute path of the workspace (source tree) root.
    pub workspace: PathBuf,

    /// Root of external dependency checkouts.
    pub external: PathBuf,

    /// Root of build outputs (`bazel-out`).
    pub generated: PathBuf,

    /// Name of the generator's scratch directory inside the container.
    #[serde(default = "default_internal_name")]
    pub internal_name: String,
}

fn default_internal_name() -> String {
    "rules_xcodeproj".to_string()
}

/// Controls whether schemes are generated for every target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeAutogenerationMode {
    /// Never autogenerate schemes.
    None,
    /// Autogenerate only when no custom schemes are configured.
    #[default]
    Auto,
    /// Always autogenerate.
    All,
}

/// Scheme settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemesConfig {
    #[serde(default)]
    pub autogeneration_mode: SchemeAutogenerationMode,

    /// User-authored schemes.
    #[serde(default)]
    pub custom: Vec<CustomSchemeConfig>,
}

/// A user-authored scheme, expressed in build labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSchemeConfig {
    /// Scheme name.
    pub name: String,

    /// Labels of targets to build.
    #[serde(default)]
    pub build_targets: Vec<String>,

    /// Labels of test targets to run.
    #[serde(default)]
    pub test_targets: Vec<String>,

    /// Label of the target to launch and profile.
    #[serde(default)]
    pub launch_target: Option<String>,

    /// Build configuration (default: the target's default configuration).
    #[serde(default)]
    pub build_configuration: Option<String>,
}

impl CustomSchemeConfig {
    /// Create a scheme that only builds the given labels.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            build_targets: Vec::new(),
            test_targets: Vec::new(),
            launch_target: None,
            build_configuration: None,
        }
    }

    /// Add build target labels.
    pub fn with_build_targets(mut self, labels: &[&str]) -> Self {
        self.build_targets = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add test target labels.
    pub fn with_test_targets(mut self, labels: &[&str]) -> Self {
        self.test_targets = labels.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the launch target label.
    pub fn with_launch_target(mut self, label: &str) -> Self {
        self.launch_target = Some(label.to_string());
        self
    }
}

impl GeneratorConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(BuildError::Validation("project.name must not be empty".into()));
        }
        if self.project.workspace_output_path.file_name().is_none() {
            return Err(BuildError::Validation(format!(
                "project.workspace_output_path {:?} has no file name",
                self.project.workspace_output_path
            )));
        }
        if !self.directories.workspace.is_absolute() {
            return Err(BuildError::Validation(format!(
                "directories.workspace {:?} must be absolute",
                self.directories.workspace
            )));
        }

        let mut seen = BTreeSet::new();
        for scheme in &self.schemes.custom {
            if !seen.insert(scheme.name.to_lowercase()) {
                return Err(BuildError::Validation(format!(
                    "duplicate custom scheme name {:?}",
                    scheme.name
                )));
            }
            if scheme.build_targets.is_empty()
                && scheme.test_targets.is_empty()
                && scheme.launch_target.is_none()
            {
                return Err(BuildError::Validation(format!(
                    "custom scheme {:?} has no targets",
                    scheme.name
                )));
            }
        }
        Ok(())
    }

    /// Names of all user-authored schemes.
    pub fn custom_scheme_names(&self) -> BTreeSet<String> {
        self.schemes.custom.iter().map(|s| s.name.clone()).collect()
    }
}
