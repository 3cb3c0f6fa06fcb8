use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The namespace a [`FilePath`] lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileDomain {
    /// Source-controlled files under the workspace root.
    Workspace,
    /// Files provided by an external dependency.
    External,
    /// Build outputs, including files generated at build time.
    Generated,
    /// The generator's own scratch files inside the project container.
    Internal,
}

impl FileDomain {
    /// Execution-root prefix that marks a path as belonging to this domain
    /// inside raw build flags.
    pub fn execroot_marker(self) -> Option<&'static str> {
        match self {
            FileDomain::External => Some("external/"),
            FileDomain::Generated => Some("bazel-out/"),
            FileDomain::Workspace | FileDomain::Internal => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileDomain::Workspace => "workspace",
            FileDomain::External => "external",
            FileDomain::Generated => "generated",
            FileDomain::Internal => "internal",
        }
    }
}

impl fmt::Display for FileDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file location tagged by domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilePath {
    pub domain: FileDomain,
    pub path: PathBuf,
}

impl FilePath {
    pub fn new(domain: FileDomain, path: impl Into<PathBuf>) -> Self {
        Self {
            domain,
            path: path.into(),
        }
    }

    pub fn workspace(path: impl Into<PathBuf>) -> Self {
        Self::new(FileDomain::Workspace, path)
    }

    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self::new(FileDomain::External, path)
    }

    pub fn generated(path: impl Into<PathBuf>) -> Self {
        Self::new(FileDomain::Generated, path)
    }

    pub fn internal(path: impl Into<PathBuf>) -> Self {
        Self::new(FileDomain::Internal, path)
    }

    /// Parse an execution-root relative path (`bazel-out/...` or
    /// `external/...`) into its domain. Returns `None` for anything else.
    pub fn from_execroot_relative(value: &str) -> Option<Self> {
        [FileDomain::Generated, FileDomain::External]
            .into_iter()
            .find_map(|domain| {
                let marker = domain.execroot_marker()?;
                value
                    .strip_prefix(marker)
                    .map(|rest| Self::new(domain, rest))
            })
    }

    /// Append a path component, staying in the same domain.
    pub fn join(&self, component: impl AsRef<Path>) -> Self {
        Self {
            domain: self.domain,
            path: self.path.join(component),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path.display())
    }
}
