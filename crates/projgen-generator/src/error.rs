//! Error types for the generator core.
//!
//! None of these are transient. Each one names the offending identifier so
//! the caller can log a precise diagnostic.

use miette::Diagnostic;
use projgen_common::{ConsolidatedTargetKey, FilePath, TargetId};
use std::path::PathBuf;
use thiserror::Error;

/// Why the project container's location cannot be related to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerLocationError {
    #[error("workspace directory {0:?} is not absolute")]
    RelativeWorkspace(PathBuf),

    #[error("container path {0:?} has no file name")]
    MissingFileName(PathBuf),

    #[error("path {0:?} escapes the filesystem root")]
    EscapesRoot(PathBuf),

    #[error("{from:?} and {to:?} are on different volumes")]
    DifferentVolumes { from: PathBuf, to: PathBuf },
}

/// A [`FilePath`] that cannot be expressed for use inside the project.
///
/// Fatal for the flag or entry being resolved, but never for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("cannot resolve {path}")]
#[diagnostic(
    code(projgen::path_resolution),
    help("check `project.workspace_output_path` and `directories.workspace` in projgen.toml")
)]
pub struct PathResolutionError {
    pub path: FilePath,
    #[source]
    pub reason: ContainerLocationError,
}

/// An identifier referenced but absent from an index.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolverError {
    #[error("unknown target {id} while {context}")]
    #[diagnostic(code(projgen::unknown_target))]
    UnknownTarget { id: TargetId, context: &'static str },

    #[error("no project target for key {key} while {context}")]
    #[diagnostic(code(projgen::unknown_key))]
    UnknownKey {
        key: ConsolidatedTargetKey,
        context: &'static str,
    },
}

/// Invalid consolidation groups.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConsolidationError {
    #[error("consolidation group {index} is empty")]
    #[diagnostic(code(projgen::consolidation::empty_group))]
    EmptyGroup { index: usize },

    #[error("target {id} appears in more than one consolidation group")]
    #[diagnostic(code(projgen::consolidation::duplicate_target))]
    DuplicateTarget { id: TargetId },

    #[error("target {id} is not part of any consolidation group")]
    #[diagnostic(code(projgen::consolidation::unassigned_target))]
    UnassignedTarget { id: TargetId },

    #[error("consolidation group references unknown target {id}")]
    #[diagnostic(code(projgen::consolidation::unknown_target))]
    UnknownTarget { id: TargetId },
}

/// Errors raised while assembling schemes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SchemeError {
    #[error("expected to find a target in the build action")]
    #[diagnostic(code(projgen::scheme::missing_build_target))]
    MissingBuildTarget,

    #[error("host of {target} was read before host resolution")]
    #[diagnostic(code(projgen::scheme::unresolved_host))]
    UnresolvedHost { target: String },

    #[error("{target} is not testable")]
    #[diagnostic(code(projgen::scheme::not_testable))]
    NotTestable { target: String },

    #[error("{target} is not launchable")]
    #[diagnostic(code(projgen::scheme::not_launchable))]
    NotLaunchable { target: String },

    #[error("scheme {scheme:?} references unknown label {label}")]
    #[diagnostic(
        code(projgen::scheme::unknown_label),
        help("custom scheme targets must be labels present in the build graph")
    )]
    UnknownLabel { scheme: String, label: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolver(#[from] ResolverError),
}
