//! Build-graph snapshot parsing.
//!
//! The snapshot is produced by the build-graph extraction step and handed
//! to the generator as JSON. It is already fully resolved: every target,
//! host relationship, and generated file is listed explicitly.

use crate::error::{BuildError, Result};
use projgen_common::{FilePath, Platform, ProductType, TargetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Identifier of the extension point an app extension plugs into, e.g.
/// `com.apple.widgetkit-extension`.
pub type ExtensionPointIdentifier = String;

/// What a target produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product kind (application, unit_test_bundle, static_library, ...).
    #[serde(rename = "type")]
    pub product_type: ProductType,

    /// Product name, used as the project target name.
    pub name: String,

    /// Location of the built product, if known.
    #[serde(default)]
    pub path: Option<FilePath>,
}

/// Inputs to the link step of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerInputs {
    /// Raw linker options, possibly comma-packed (`-Wl,-foo,bar`).
    #[serde(default)]
    pub linkopts: Vec<String>,

    /// Static libraries linked into the target.
    #[serde(default)]
    pub static_libraries: Vec<FilePath>,

    /// Libraries linked with `-force_load`.
    #[serde(default)]
    pub force_load: Vec<FilePath>,

    /// Files passed with `-exported_symbols_list`.
    #[serde(default)]
    pub exported_symbols_lists: Vec<FilePath>,
}

/// One raw build-graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Build label of the logical unit, e.g. `//app:App`.
    pub label: String,

    /// Configuration the node was built in.
    #[serde(default)]
    pub configuration: String,

    pub product: Product,

    pub platform: Platform,

    #[serde(default)]
    pub linker_inputs: LinkerInputs,
}

/// A complete build-graph snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildGraph {
    /// Every raw target, keyed by id.
    pub targets: BTreeMap<TargetId, Target>,

    /// Targets that can host each target at runtime (apps hosting tests or
    /// extensions).
    #[serde(default)]
    pub target_hosts: BTreeMap<TargetId, Vec<TargetId>>,

    /// Extension point of each app extension target.
    #[serde(default)]
    pub extension_point_identifiers: BTreeMap<TargetId, ExtensionPointIdentifier>,

    /// Pre-computed consolidation groups. When absent the generator computes
    /// them itself.
    #[serde(default)]
    pub consolidation: Option<Vec<Vec<TargetId>>>,

    /// Files the IDE build regenerates itself instead of reusing the
    /// build-output copy.
    #[serde(default)]
    pub xcode_generated_files: BTreeSet<FilePath>,
}

impl BuildGraph {
    /// Load a build graph from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a build graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: BuildGraph = serde_json::from_str(json)?;
        graph.validate()?;
        debug!(
            targets = graph.targets.len(),
            hosted = graph.target_hosts.len(),
            "Loaded build graph"
        );
        Ok(graph)
    }

    /// Check that every referenced id is defined in `targets`.
    pub fn validate(&self) -> Result<()> {
        for (id, host_ids) in &self.target_hosts {
            self.require(id, "target_hosts")?;
            for host_id in host_ids {
                self.require(host_id, "target_hosts")?;
            }
        }
        for id in self.extension_point_identifiers.keys() {
            self.require(id, "extension_point_identifiers")?;
        }
        for id in self.consolidation.iter().flatten().flatten() {
            self.require(id, "consolidation")?;
        }
        Ok(())
    }

    fn require(&self, id: &TargetId, context: &'static str) -> Result<()> {
        if self.targets.contains_key(id) {
            Ok(())
        } else {
            Err(BuildError::TargetNotFound {
                id: id.clone(),
                context,
            })
        }
    }

    /// Find a target by id.
    pub fn find_target(&self, id: &TargetId) -> Option<&Target> {
        self.targets.get(id)
    }
}
