//! Project-target handles.
//!
//! A [`ProjectTarget`] is what the serialization layer creates for each
//! consolidated target. The core only needs a few facts about it (its name
//! and what kind of product it builds), so it is kept as a small immutable
//! value shared through [`Arc`].

use crate::consolidation::ConsolidatedTargetKeys;
use crate::error::ResolverError;
use projgen_build::Target;
use projgen_common::{ConsolidatedTargetKey, ProductType, TargetId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const DEFAULT_BUILD_CONFIGURATION_NAME: &str = "Debug";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectTarget {
    name: String,
    product_name: String,
    product_type: ProductType,
    default_build_configuration_name: String,
    testable: bool,
    launchable: bool,
}

impl ProjectTarget {
    pub fn new(name: impl Into<String>, product_type: ProductType) -> Self {
        let name = name.into();
        Self {
            product_name: name.clone(),
            name,
            product_type,
            default_build_configuration_name: DEFAULT_BUILD_CONFIGURATION_NAME.to_string(),
            testable: product_type.is_testable(),
            launchable: product_type.is_launchable(),
        }
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    /// Override what the product type implies about running this target.
    pub fn with_capabilities(mut self, testable: bool, launchable: bool) -> Self {
        self.testable = testable;
        self.launchable = launchable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheme_name(&self) -> &str {
        &self.name
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn default_build_configuration_name(&self) -> &str {
        &self.default_build_configuration_name
    }

    pub fn should_create_scheme(&self) -> bool {
        self.product_type.should_create_scheme()
    }

    pub fn is_testable(&self) -> bool {
        self.testable
    }

    pub fn is_launchable(&self) -> bool {
        self.launchable
    }

    /// File name of the built product.
    pub fn buildable_name(&self) -> String {
        let name = &self.product_name;
        match self.product_type {
            ProductType::Application | ProductType::AppClip | ProductType::WatchApp => {
                format!("{name}.app")
            }
            ProductType::AppExtension
            | ProductType::ExtensionKitExtension
            | ProductType::WatchExtension => format!("{name}.appex"),
            ProductType::UnitTestBundle | ProductType::UiTestBundle => format!("{name}.xctest"),
            ProductType::StaticLibrary => format!("lib{name}.a"),
            ProductType::DynamicLibrary => format!("lib{name}.dylib"),
            ProductType::Framework | ProductType::StaticFramework => format!("{name}.framework"),
            ProductType::Bundle => format!("{name}.bundle"),
            ProductType::CommandLineTool | ProductType::Aggregate => name.clone(),
        }
    }
}

/// How a scheme refers to a project target inside its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildableReference {
    pub blueprint_name: String,
    pub buildable_name: String,
    pub referenced_container: String,
}

impl BuildableReference {
    pub fn new(project_target: &ProjectTarget, referenced_container: &str) -> Self {
        Self {
            blueprint_name: project_target.name().to_string(),
            buildable_name: project_target.buildable_name(),
            referenced_container: referenced_container.to_string(),
        }
    }
}

/// Create one project target per consolidation key.
///
/// Names come from the product name of the key's first target. Names shared
/// by several keys get the key's OS families appended, and if that is still
/// ambiguous, the key's first target id.
pub fn create_project_targets(
    keys: &ConsolidatedTargetKeys,
    targets: &BTreeMap<TargetId, Target>,
) -> Result<BTreeMap<ConsolidatedTargetKey, Arc<ProjectTarget>>, ResolverError> {
    let mut candidates = Vec::new();
    for key in keys.unique_keys() {
        let key_targets = key
            .target_ids()
            .iter()
            .map(|id| {
                targets.get(id).ok_or_else(|| ResolverError::UnknownTarget {
                    id: id.clone(),
                    context: "creating project targets",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = key_targets.first() else {
            continue;
        };

        let os_names: BTreeSet<_> = key_targets.iter().map(|t| t.platform.os).collect();
        let os_list = os_names
            .iter()
            .map(|os| os.display_name())
            .collect::<Vec<_>>()
            .join(", ");

        candidates.push(Candidate {
            key: key.clone(),
            name: first.product.name.clone(),
            product_name: first.product.name.clone(),
            os_list,
            product_type: first.product.product_type,
        });
    }

    disambiguate(&mut candidates, |c| format!("{} ({})", c.name, c.os_list));
    disambiguate(&mut candidates, |c| {
        let first_id = c.key.first().map(TargetId::as_str).unwrap_or_default();
        format!("{} ({first_id})", c.name)
    });

    Ok(candidates
        .into_iter()
        .map(|c| {
            let project_target =
                ProjectTarget::new(c.name, c.product_type).with_product_name(c.product_name);
            (c.key, Arc::new(project_target))
        })
        .collect())
}

struct Candidate {
    key: ConsolidatedTargetKey,
    name: String,
    product_name: String,
    os_list: String,
    product_type: ProductType,
}

fn disambiguate(candidates: &mut [Candidate], rename: impl Fn(&Candidate) -> String) {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for c in candidates.iter() {
        *counts.entry(c.name.clone()).or_default() += 1;
    }
    for c in candidates.iter_mut() {
        if counts[&c.name] > 1 {
            c.name = rename(c);
        }
    }
}
