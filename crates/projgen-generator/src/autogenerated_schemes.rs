//! One scheme per eligible consolidated target.

use crate::error::SchemeError;
use crate::scheme_info::{
    AnalyzeActionInfo, ArchiveActionInfo, BuildActionInfo, BuildFor, BuildTargetInfo,
    LaunchActionInfo, ProfileActionInfo, SchemeActions, SchemeInfo, TargetInfo, TestActionInfo,
};
use crate::target_resolver::TargetResolver;
use projgen_build::SchemeAutogenerationMode;
use std::collections::BTreeSet;
use tracing::debug;

/// Whether `mode` allows autogeneration given the user's own schemes.
pub fn should_autogenerate(
    mode: SchemeAutogenerationMode,
    custom_scheme_names: &BTreeSet<String>,
) -> bool {
    match mode {
        SchemeAutogenerationMode::None => false,
        SchemeAutogenerationMode::All => true,
        SchemeAutogenerationMode::Auto => custom_scheme_names.is_empty(),
    }
}

/// Create the autogenerated schemes, in consolidation-key order.
///
/// A scheme whose name matches a custom scheme name (ignoring case) is
/// dropped; the custom scheme wins.
pub fn create_autogenerated_schemes(
    mode: SchemeAutogenerationMode,
    resolver: &TargetResolver,
    custom_scheme_names: &BTreeSet<String>,
) -> Result<Vec<SchemeInfo>, SchemeError> {
    if !should_autogenerate(mode, custom_scheme_names) {
        debug!(?mode, custom = custom_scheme_names.len(), "Skipping scheme autogeneration");
        return Ok(Vec::new());
    }

    let taken: BTreeSet<String> = custom_scheme_names
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    let mut schemes = Vec::new();
    for target_info in resolver.target_infos()? {
        if !target_info.project_target.should_create_scheme() {
            continue;
        }

        let scheme = SchemeInfo::new(scheme_actions(target_info)?, scheme_name)?;
        if taken.contains(&scheme.name.to_lowercase()) {
            debug!(scheme = %scheme.name, "Custom scheme shadows autogenerated scheme");
            continue;
        }
        schemes.push(scheme);
    }

    debug!(count = schemes.len(), "Autogenerated schemes");
    Ok(schemes)
}

fn scheme_actions(target_info: TargetInfo) -> Result<SchemeActions, SchemeError> {
    let build_configuration_name = target_info
        .project_target
        .default_build_configuration_name()
        .to_string();

    let test = if target_info.is_testable() {
        Some(TestActionInfo::new(
            build_configuration_name.as_str(),
            vec![target_info.clone()],
        )?)
    } else {
        None
    };

    let (launch, profile) = if target_info.is_launchable() {
        (
            Some(LaunchActionInfo::new(
                build_configuration_name.as_str(),
                target_info.clone(),
            )?),
            Some(ProfileActionInfo::new(
                build_configuration_name.as_str(),
                target_info.clone(),
            )?),
        )
    } else {
        (None, None)
    };

    Ok(SchemeActions {
        build: Some(BuildActionInfo::new(vec![BuildTargetInfo::new(
            target_info,
            BuildFor::all_enabled(),
        )])),
        test,
        launch,
        profile,
        analyze: AnalyzeActionInfo::new(build_configuration_name.as_str()),
        archive: ArchiveActionInfo::new(build_configuration_name),
    })
}

/// `"<target>"`, or `"<target> in <host>"` when the target could run in
/// more than one host.
fn scheme_name(actions: &SchemeActions) -> Result<String, SchemeError> {
    let target_info = actions
        .build
        .as_ref()
        .and_then(|build| build.targets.first())
        .map(|build_target| &build_target.target_info)
        .ok_or(SchemeError::MissingBuildTarget)?;

    let name = target_info.project_target.scheme_name();
    match target_info.selected_host_info()? {
        Some(host) if target_info.disambiguate_host() => {
            Ok(format!("{name} in {}", host.project_target.scheme_name()))
        }
        _ => Ok(name.to_string()),
    }
}
