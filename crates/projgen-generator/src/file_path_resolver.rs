//! Turning domain-tagged file paths into strings usable inside the project.
//!
//! Relative results are relative to the directory that contains the project
//! container (the project directory):
//! - workspace files resolve through the offset from the project directory
//!   back to the workspace root
//! - external and generated files resolve to their absolute roots
//! - internal files, and generated files the IDE regenerates itself, resolve
//!   into the scratch directory inside the container

use crate::error::{ContainerLocationError, PathResolutionError};
use projgen_build::GeneratorConfig;
use projgen_common::{quoted, FileDomain, FilePath};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Directory under the scratch root that mirrors `bazel-out` for files the
/// IDE build produces itself.
const IDE_GENERATED_DIRECTORY: &str = "bazel-out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePathResolver {
    external_directory: PathBuf,
    generated_directory: PathBuf,
    internal_directory_name: String,
    workspace_output_path: PathBuf,
    container_name: Result<OsString, ContainerLocationError>,
    workspace_offset: Result<PathBuf, ContainerLocationError>,
}

impl FilePathResolver {
    pub fn new(
        workspace_directory: impl Into<PathBuf>,
        external_directory: impl Into<PathBuf>,
        generated_directory: impl Into<PathBuf>,
        internal_directory_name: impl Into<String>,
        workspace_output_path: impl Into<PathBuf>,
    ) -> Self {
        let workspace_directory = workspace_directory.into();
        let workspace_output_path = workspace_output_path.into();

        let container_name = workspace_output_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| ContainerLocationError::MissingFileName(workspace_output_path.clone()));
        let workspace_offset = workspace_offset(&workspace_directory, &workspace_output_path);

        Self {
            external_directory: external_directory.into(),
            generated_directory: generated_directory.into(),
            internal_directory_name: internal_directory_name.into(),
            workspace_output_path,
            container_name,
            workspace_offset,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        let dirs = &config.directories;
        Self::new(
            &dirs.workspace,
            &dirs.external,
            &dirs.generated,
            &dirs.internal_name,
            &config.project.workspace_output_path,
        )
    }

    /// Reference to the container used by scheme buildable references.
    pub fn container_reference(&self) -> String {
        format!("container:{}", self.workspace_output_path.display())
    }

    /// Resolve `file_path` and shell-quote the result.
    ///
    /// `use_generated_override` marks generated files the IDE build
    /// regenerates at its own location; it has no effect on other domains.
    pub fn resolve(
        &self,
        file_path: &FilePath,
        use_generated_override: bool,
    ) -> Result<String, PathResolutionError> {
        let resolved = self.resolve_path(file_path, use_generated_override)?;
        Ok(quoted(&resolved.to_string_lossy()))
    }

    /// Resolve `file_path` without quoting.
    pub fn resolve_path(
        &self,
        file_path: &FilePath,
        use_generated_override: bool,
    ) -> Result<PathBuf, PathResolutionError> {
        let fail = |reason: &ContainerLocationError| PathResolutionError {
            path: file_path.clone(),
            reason: reason.clone(),
        };

        let resolved = match file_path.domain {
            FileDomain::Workspace => {
                let offset = self.workspace_offset.as_ref().map_err(fail)?;
                join_nonempty(offset, &file_path.path)
            }
            FileDomain::External => join_nonempty(&self.external_directory, &file_path.path),
            FileDomain::Generated if !use_generated_override => {
                join_nonempty(&self.generated_directory, &file_path.path)
            }
            FileDomain::Generated => {
                let scratch = self.scratch_directory().map_err(|e| fail(&e))?;
                join_nonempty(&scratch.join(IDE_GENERATED_DIRECTORY), &file_path.path)
            }
            FileDomain::Internal => {
                let scratch = self.scratch_directory().map_err(|e| fail(&e))?;
                join_nonempty(&scratch, &file_path.path)
            }
        };
        Ok(resolved)
    }

    /// Scratch directory relative to the project directory.
    fn scratch_directory(&self) -> Result<PathBuf, ContainerLocationError> {
        let name = self.container_name.as_ref().map_err(Clone::clone)?;
        Ok(Path::new(name).join(&self.internal_directory_name))
    }
}

fn join_nonempty(base: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        base.to_path_buf()
    } else if base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Relative path from the directory containing the container back to the
/// workspace root.
fn workspace_offset(
    workspace_directory: &Path,
    workspace_output_path: &Path,
) -> Result<PathBuf, ContainerLocationError> {
    if !workspace_directory.is_absolute() {
        return Err(ContainerLocationError::RelativeWorkspace(
            workspace_directory.to_path_buf(),
        ));
    }
    if workspace_output_path.file_name().is_none() {
        return Err(ContainerLocationError::MissingFileName(
            workspace_output_path.to_path_buf(),
        ));
    }

    let workspace = normalize(workspace_directory)?;
    let container_parent = workspace_output_path.parent().unwrap_or(Path::new(""));
    let project_directory = normalize(&workspace.join(container_parent))?;

    relative_path(&project_directory, &workspace)
}

/// Lexically resolve `.` and `..` in an absolute path.
fn normalize(path: &Path) -> Result<PathBuf, ContainerLocationError> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    return Err(ContainerLocationError::EscapesRoot(path.to_path_buf()));
                }
            }
        }
    }
    Ok(out)
}

/// Relative path from directory `from` to `to`; both absolute and normalized.
fn relative_path(from: &Path, to: &Path) -> Result<PathBuf, ContainerLocationError> {
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();

    let root_len = |parts: &[Component<'_>]| {
        parts
            .iter()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .count()
    };
    let (from_root, to_root) = (root_len(&from_parts), root_len(&to_parts));
    if from_parts[..from_root] != to_parts[..to_root] {
        return Err(ContainerLocationError::DifferentVolumes {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from_parts.len() {
        out.push("..");
    }
    for part in &to_parts[common..] {
        out.push(part.as_os_str());
    }
    Ok(out)
}
