//! Target consolidation and scheme synthesis for projgen.
//!
//! Given a build-graph snapshot, this crate:
//! - groups raw targets into consolidated targets ([`ConsolidatedTargetKeys`])
//! - indexes them with their platforms and hosts ([`TargetResolver`])
//! - rewrites linker inputs into project-relative flags
//!   ([`LinkerFlagProcessor`], backed by [`FilePathResolver`])
//! - assembles custom and autogenerated [`SchemeInfo`]s
//!
//! Everything here is synchronous and works on in-memory input. I/O happens
//! in `projgen-build` (loading) and `projgen-driver` (output).

mod autogenerated_schemes;
mod consolidation;
mod custom_schemes;
mod error;
mod file_path_resolver;
mod linker_flags;
mod project_target;
mod scheme_info;
mod target_resolver;

pub use autogenerated_schemes::{create_autogenerated_schemes, should_autogenerate};
pub use consolidation::ConsolidatedTargetKeys;
pub use custom_schemes::create_custom_schemes;
pub use error::{
    ConsolidationError, ContainerLocationError, PathResolutionError, ResolverError, SchemeError,
};
pub use file_path_resolver::FilePathResolver;
pub use linker_flags::{has_linker_flags, LinkerFlagProcessor};
pub use project_target::{
    create_project_targets, BuildableReference, ProjectTarget, DEFAULT_BUILD_CONFIGURATION_NAME,
};
pub use scheme_info::{
    AnalyzeActionInfo, ArchiveActionInfo, BuildActionInfo, BuildFor, BuildTargetInfo, HostInfo,
    HostResolution, LaunchActionInfo, ProfileActionInfo, SchemeActions, SchemeInfo, TargetInfo,
    TestActionInfo,
};
pub use target_resolver::{ProjectTargetInfo, TargetResolver};
