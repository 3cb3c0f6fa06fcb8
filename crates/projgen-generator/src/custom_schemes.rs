//! User-authored schemes.
//!
//! Custom schemes name their targets by build label. Each label is resolved
//! to one raw target (simulator builds first) and from there to its
//! consolidated target.

use crate::error::SchemeError;
use crate::project_target::DEFAULT_BUILD_CONFIGURATION_NAME;
use crate::scheme_info::{
    AnalyzeActionInfo, ArchiveActionInfo, BuildActionInfo, BuildFor, BuildTargetInfo,
    LaunchActionInfo, ProfileActionInfo, SchemeActions, SchemeInfo, TargetInfo, TestActionInfo,
};
use crate::target_resolver::TargetResolver;
use indexmap::IndexMap;
use projgen_build::CustomSchemeConfig;
use tracing::debug;

/// Create one scheme per configured custom scheme, in configuration order.
pub fn create_custom_schemes(
    custom_schemes: &[CustomSchemeConfig],
    resolver: &TargetResolver,
) -> Result<Vec<SchemeInfo>, SchemeError> {
    custom_schemes
        .iter()
        .map(|config| create_custom_scheme(config, resolver))
        .collect()
}

fn create_custom_scheme(
    config: &CustomSchemeConfig,
    resolver: &TargetResolver,
) -> Result<SchemeInfo, SchemeError> {
    let resolve = |label: &String| resolve_label(&config.name, label, resolver);

    let test_targets = config
        .test_targets
        .iter()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;
    let launch_target = config.launch_target.as_ref().map(resolve).transpose()?;

    // Everything the scheme tests or launches is built too.
    let mut build_targets: IndexMap<_, TargetInfo> = IndexMap::new();
    for label in &config.build_targets {
        let target_info = resolve(label)?;
        build_targets.entry(target_info.key.clone()).or_insert(target_info);
    }
    for target_info in test_targets.iter().chain(launch_target.iter()) {
        build_targets
            .entry(target_info.key.clone())
            .or_insert_with(|| target_info.clone());
    }

    let build_configuration_name = match (&config.build_configuration, build_targets.first()) {
        (Some(name), _) => name.clone(),
        (None, Some((_, target_info))) => target_info
            .project_target
            .default_build_configuration_name()
            .to_string(),
        (None, None) => return Err(SchemeError::MissingBuildTarget),
    };

    let test = if test_targets.is_empty() {
        None
    } else {
        Some(TestActionInfo::new(
            build_configuration_name.as_str(),
            test_targets,
        )?)
    };

    let (launch, profile) = match launch_target {
        Some(target_info) => (
            Some(LaunchActionInfo::new(
                build_configuration_name.as_str(),
                target_info.clone(),
            )?),
            Some(ProfileActionInfo::new(
                build_configuration_name.as_str(),
                target_info,
            )?),
        ),
        None => (None, None),
    };

    let actions = SchemeActions {
        build: Some(BuildActionInfo::new(
            build_targets
                .into_values()
                .map(|target_info| BuildTargetInfo::new(target_info, BuildFor::all_enabled()))
                .collect(),
        )),
        test,
        launch,
        profile,
        analyze: AnalyzeActionInfo::new(build_configuration_name.as_str()),
        archive: ArchiveActionInfo::new(build_configuration_name),
    };

    debug!(scheme = %config.name, "Created custom scheme");
    Ok(SchemeInfo::named(config.name.clone(), actions))
}

fn resolve_label(
    scheme: &str,
    label: &str,
    resolver: &TargetResolver,
) -> Result<TargetInfo, SchemeError> {
    let target_id = resolver
        .target_id_for_label(label)
        .ok_or_else(|| SchemeError::UnknownLabel {
            scheme: scheme.to_string(),
            label: label.to_string(),
        })?;
    Ok(resolver.target_info(target_id)?)
}
