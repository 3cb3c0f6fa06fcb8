//! Scheme descriptors.
//!
//! A [`SchemeInfo`] is the run-configuration bundle handed to the
//! serialization layer: one optional action per scheme phase, each pointing
//! at [`TargetInfo`]s. Targets that can run inside several hosts (tests,
//! extensions) carry every candidate as a [`HostInfo`]; building a
//! `SchemeInfo` picks one of them per target.

use crate::error::SchemeError;
use crate::project_target::{BuildableReference, ProjectTarget};
use crate::target_resolver::ProjectTargetInfo;
use projgen_build::ExtensionPointIdentifier;
use projgen_common::{ConsolidatedTargetKey, Platform};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One candidate host of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub key: ConsolidatedTargetKey,
    pub project_target: Arc<ProjectTarget>,
    pub platforms: BTreeSet<Platform>,
    pub buildable_reference: BuildableReference,
    /// Position among the target's candidate hosts.
    pub index: usize,
}

impl HostInfo {
    pub fn new(info: &ProjectTargetInfo, index: usize) -> Self {
        Self {
            key: info.key.clone(),
            project_target: Arc::clone(&info.project_target),
            platforms: info.platforms.clone(),
            buildable_reference: info.buildable_reference.clone(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResolution {
    /// Hosts haven't been resolved yet.
    Unresolved,
    /// The target has no hosts.
    None,
    Selected(HostInfo),
}

/// A consolidated target as seen by a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub key: ConsolidatedTargetKey,
    pub project_target: Arc<ProjectTarget>,
    pub platforms: BTreeSet<Platform>,
    pub buildable_reference: BuildableReference,
    pub extension_point_identifiers: BTreeSet<ExtensionPointIdentifier>,
    pub host_infos: Vec<HostInfo>,
    pub host_resolution: HostResolution,
}

impl TargetInfo {
    pub fn name(&self) -> &str {
        self.project_target.name()
    }

    pub fn is_testable(&self) -> bool {
        self.project_target.is_testable()
    }

    pub fn is_launchable(&self) -> bool {
        self.project_target.is_launchable()
    }

    /// The host chosen for this target, if any.
    pub fn selected_host_info(&self) -> Result<Option<&HostInfo>, SchemeError> {
        match &self.host_resolution {
            HostResolution::Unresolved => Err(SchemeError::UnresolvedHost {
                target: self.name().to_string(),
            }),
            HostResolution::None => Ok(None),
            HostResolution::Selected(host_info) => Ok(Some(host_info)),
        }
    }

    /// Whether names derived from this target must say which host it runs
    /// in, because more than one could apply.
    pub fn disambiguate_host(&self) -> bool {
        self.host_infos.len() > 1
    }

    /// Pick a host: the first candidate that is itself a top-level target of
    /// the scheme, otherwise the first candidate.
    pub fn resolve_host(&self, top_level_keys: &BTreeSet<ConsolidatedTargetKey>) -> Self {
        let host_resolution = match self
            .host_infos
            .iter()
            .find(|host| top_level_keys.contains(&host.key))
            .or_else(|| self.host_infos.first())
        {
            Some(host_info) => HostResolution::Selected(host_info.clone()),
            None => HostResolution::None,
        };

        Self {
            host_resolution,
            ..self.clone()
        }
    }
}

/// Which build phases include a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildFor {
    pub running: bool,
    pub testing: bool,
    pub profiling: bool,
    pub archiving: bool,
    pub analyzing: bool,
}

impl BuildFor {
    pub const fn all_enabled() -> Self {
        Self {
            running: true,
            testing: true,
            profiling: true,
            archiving: true,
            analyzing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTargetInfo {
    pub target_info: TargetInfo,
    pub build_for: BuildFor,
}

impl BuildTargetInfo {
    pub fn new(target_info: TargetInfo, build_for: BuildFor) -> Self {
        Self {
            target_info,
            build_for,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildActionInfo {
    pub targets: Vec<BuildTargetInfo>,
}

impl BuildActionInfo {
    pub fn new(targets: Vec<BuildTargetInfo>) -> Self {
        Self { targets }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestActionInfo {
    pub build_configuration_name: String,
    pub target_infos: Vec<TargetInfo>,
}

impl TestActionInfo {
    pub fn new(
        build_configuration_name: impl Into<String>,
        target_infos: Vec<TargetInfo>,
    ) -> Result<Self, SchemeError> {
        if let Some(target_info) = target_infos.iter().find(|t| !t.is_testable()) {
            return Err(SchemeError::NotTestable {
                target: target_info.name().to_string(),
            });
        }
        Ok(Self {
            build_configuration_name: build_configuration_name.into(),
            target_infos,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchActionInfo {
    pub build_configuration_name: String,
    pub target_info: TargetInfo,
}

impl LaunchActionInfo {
    pub fn new(
        build_configuration_name: impl Into<String>,
        target_info: TargetInfo,
    ) -> Result<Self, SchemeError> {
        require_launchable(&target_info)?;
        Ok(Self {
            build_configuration_name: build_configuration_name.into(),
            target_info,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileActionInfo {
    pub build_configuration_name: String,
    pub target_info: TargetInfo,
}

impl ProfileActionInfo {
    pub fn new(
        build_configuration_name: impl Into<String>,
        target_info: TargetInfo,
    ) -> Result<Self, SchemeError> {
        require_launchable(&target_info)?;
        Ok(Self {
            build_configuration_name: build_configuration_name.into(),
            target_info,
        })
    }
}

fn require_launchable(target_info: &TargetInfo) -> Result<(), SchemeError> {
    if target_info.is_launchable() {
        Ok(())
    } else {
        Err(SchemeError::NotLaunchable {
            target: target_info.name().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeActionInfo {
    pub build_configuration_name: String,
}

impl AnalyzeActionInfo {
    pub fn new(build_configuration_name: impl Into<String>) -> Self {
        Self {
            build_configuration_name: build_configuration_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveActionInfo {
    pub build_configuration_name: String,
    pub reveal_archive_in_organizer: bool,
}

impl ArchiveActionInfo {
    pub fn new(build_configuration_name: impl Into<String>) -> Self {
        Self {
            build_configuration_name: build_configuration_name.into(),
            reveal_archive_in_organizer: true,
        }
    }
}

/// The actions of a scheme, before it has a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeActions {
    pub build: Option<BuildActionInfo>,
    pub test: Option<TestActionInfo>,
    pub launch: Option<LaunchActionInfo>,
    pub profile: Option<ProfileActionInfo>,
    pub analyze: AnalyzeActionInfo,
    pub archive: ArchiveActionInfo,
}

impl SchemeActions {
    /// Keys of the targets a scheme runs directly. Hosts are picked among
    /// these first.
    fn top_level_keys(&self) -> BTreeSet<ConsolidatedTargetKey> {
        let mut keys = BTreeSet::new();
        if let Some(launch) = &self.launch {
            keys.insert(launch.target_info.key.clone());
        }
        if let Some(profile) = &self.profile {
            keys.insert(profile.target_info.key.clone());
        }
        if let Some(test) = &self.test {
            keys.extend(test.target_infos.iter().map(|t| t.key.clone()));
        }
        keys
    }

    fn resolve_hosts(mut self) -> Self {
        let top_level_keys = self.top_level_keys();

        if let Some(build) = &mut self.build {
            for target in &mut build.targets {
                target.target_info = target.target_info.resolve_host(&top_level_keys);
            }
        }
        if let Some(test) = &mut self.test {
            for target_info in &mut test.target_infos {
                *target_info = target_info.resolve_host(&top_level_keys);
            }
        }
        if let Some(launch) = &mut self.launch {
            launch.target_info = launch.target_info.resolve_host(&top_level_keys);
        }
        if let Some(profile) = &mut self.profile {
            profile.target_info = profile.target_info.resolve_host(&top_level_keys);
        }
        self
    }
}

/// A fully assembled scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeInfo {
    pub name: String,
    pub build_action: Option<BuildActionInfo>,
    pub test_action: Option<TestActionInfo>,
    pub launch_action: Option<LaunchActionInfo>,
    pub profile_action: Option<ProfileActionInfo>,
    pub analyze_action: AnalyzeActionInfo,
    pub archive_action: ArchiveActionInfo,
}

impl SchemeInfo {
    /// Resolve hosts, then name the scheme from its resolved actions.
    pub fn new<F>(actions: SchemeActions, name: F) -> Result<Self, SchemeError>
    where
        F: FnOnce(&SchemeActions) -> Result<String, SchemeError>,
    {
        let actions = actions.resolve_hosts();
        let name = name(&actions)?;
        Ok(Self::from_parts(name, actions))
    }

    /// Resolve hosts for a scheme with a fixed name.
    pub fn named(name: impl Into<String>, actions: SchemeActions) -> Self {
        Self::from_parts(name.into(), actions.resolve_hosts())
    }

    fn from_parts(name: String, actions: SchemeActions) -> Self {
        Self {
            name,
            build_action: actions.build,
            test_action: actions.test,
            launch_action: actions.launch,
            profile_action: actions.profile,
            analyze_action: actions.analyze,
            archive_action: actions.archive,
        }
    }

    /// Names of the targets the build action builds.
    pub fn build_target_names(&self) -> Vec<&str> {
        self.build_action
            .iter()
            .flat_map(|build| build.targets.iter().map(|t| t.target_info.name()))
            .collect()
    }
}
