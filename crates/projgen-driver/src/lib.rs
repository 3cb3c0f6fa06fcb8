//! Generation driver.
//!
//! Runs the generator core over one configuration and one build graph and
//! collects everything the project serializer needs into a
//! [`ProjectDescription`].

use miette::Result;
use projgen_build::{BuildGraph, GeneratorConfig};
use projgen_common::{Platform, ProductType, TargetId};
use projgen_generator::{
    create_autogenerated_schemes, create_custom_schemes, has_linker_flags, ConsolidatedTargetKeys,
    FilePathResolver, LinkerFlagProcessor, SchemeInfo, TargetResolver,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, debug_span, info, warn};

/// Everything generated for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDescription {
    pub name: String,
    pub container: String,
    pub targets: Vec<TargetDescription>,
    pub schemes: Vec<SchemeSummary>,
    /// Targets whose linker flags could not be resolved.
    pub failures: Vec<TargetFailure>,
}

/// One consolidated target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetDescription {
    pub name: String,
    pub product_type: ProductType,
    pub target_ids: Vec<TargetId>,
    pub platforms: BTreeSet<Platform>,
    pub hosts: Vec<String>,
    pub extension_point_identifiers: BTreeSet<String>,
    /// Resolved linker flags, per raw target that has any.
    pub linker_flags: BTreeMap<TargetId, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemeSummary {
    pub name: String,
    pub autogenerated: bool,
    pub build_targets: Vec<String>,
    pub test_targets: Vec<String>,
    pub launch_target: Option<String>,
    pub build_configuration: String,
}

impl SchemeSummary {
    fn new(scheme: &SchemeInfo, autogenerated: bool) -> Self {
        Self {
            name: scheme.name.clone(),
            autogenerated,
            build_targets: scheme
                .build_target_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            test_targets: scheme
                .test_action
                .iter()
                .flat_map(|test| test.target_infos.iter().map(|t| t.name().to_string()))
                .collect(),
            launch_target: scheme
                .launch_action
                .as_ref()
                .map(|launch| launch.target_info.name().to_string()),
            build_configuration: scheme.archive_action.build_configuration_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub target_id: TargetId,
    pub message: String,
}

impl ProjectDescription {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| miette::miette!("Failed to serialize project description: {}", e))
    }

    pub fn find_target(&self, name: &str) -> Option<&TargetDescription> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// Generator driver that runs one generation pass.
pub struct Generator {
    config: GeneratorConfig,
    graph: BuildGraph,
    file_path_resolver: FilePathResolver,
}

impl Generator {
    pub fn new(config: GeneratorConfig, graph: BuildGraph) -> Self {
        let file_path_resolver = FilePathResolver::from_config(&config);
        Self {
            config,
            graph,
            file_path_resolver,
        }
    }

    /// Load the configuration and build graph from disk.
    pub fn from_files(config_path: impl AsRef<Path>, graph_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let graph_path = graph_path.as_ref();

        let config = GeneratorConfig::from_file(config_path)
            .map_err(|e| miette::miette!("Failed to load {}: {}", config_path.display(), e))?;
        let graph = BuildGraph::from_file(graph_path)
            .map_err(|e| miette::miette!("Failed to load {}: {}", graph_path.display(), e))?;

        Ok(Self::new(config, graph))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Consolidate targets and build the resolver.
    pub fn resolver(&self) -> Result<TargetResolver> {
        let keys = {
            let _span = debug_span!("consolidate").entered();
            ConsolidatedTargetKeys::for_graph(&self.graph)?
        };

        let _span = debug_span!("index").entered();
        Ok(TargetResolver::from_graph(
            &self.graph,
            &keys,
            &self.file_path_resolver,
        )?)
    }

    /// Linker flags of one raw target.
    pub fn linker_flags(&self, target_id: &TargetId) -> Result<Vec<String>> {
        let target = self
            .graph
            .find_target(target_id)
            .ok_or_else(|| miette::miette!("Unknown target: {}", target_id))?;
        Ok(self.linker_flag_processor().target_linker_flags(target)?)
    }

    /// Custom schemes followed by autogenerated ones.
    pub fn schemes(&self, resolver: &TargetResolver) -> Result<Vec<(SchemeInfo, bool)>> {
        let _span = debug_span!("schemes").entered();
        let schemes_config = &self.config.schemes;

        let custom = create_custom_schemes(&schemes_config.custom, resolver)?;
        let autogenerated = create_autogenerated_schemes(
            schemes_config.autogeneration_mode,
            resolver,
            &self.config.custom_scheme_names(),
        )?;
        debug!(
            custom = custom.len(),
            autogenerated = autogenerated.len(),
            "Created schemes"
        );

        Ok(custom
            .into_iter()
            .map(|scheme| (scheme, false))
            .chain(autogenerated.into_iter().map(|scheme| (scheme, true)))
            .collect())
    }

    /// Run a full generation pass.
    pub fn generate(&self) -> Result<ProjectDescription> {
        let resolver = self.resolver()?;
        let processor = self.linker_flag_processor();

        let mut failures = Vec::new();
        let mut targets = Vec::new();
        {
            let _span = debug_span!("linker_flags").entered();
            for info in resolver.project_target_infos().values() {
                let mut linker_flags = BTreeMap::new();
                for target_id in info.key.target_ids() {
                    let Some(target) = resolver.targets().get(target_id) else {
                        continue;
                    };
                    if !has_linker_flags(&target.linker_inputs) {
                        continue;
                    }
                    match processor.target_linker_flags(target) {
                        Ok(flags) => {
                            linker_flags.insert(target_id.clone(), flags);
                        }
                        Err(err) => {
                            warn!(target = %target_id, error = %err, "Skipping linker flags");
                            failures.push(TargetFailure {
                                target_id: target_id.clone(),
                                message: err.to_string(),
                            });
                        }
                    }
                }

                let hosts = info
                    .host_keys
                    .iter()
                    .filter_map(|key| resolver.project_target_infos().get(key))
                    .map(|host| host.project_target.name().to_string())
                    .collect();

                targets.push(TargetDescription {
                    name: info.project_target.name().to_string(),
                    product_type: info.project_target.product_type(),
                    target_ids: info.key.target_ids().iter().cloned().collect(),
                    platforms: info.platforms.clone(),
                    hosts,
                    extension_point_identifiers: info.extension_point_identifiers.clone(),
                    linker_flags,
                });
            }
        }

        let schemes = self
            .schemes(&resolver)?
            .iter()
            .map(|(scheme, autogenerated)| SchemeSummary::new(scheme, *autogenerated))
            .collect::<Vec<_>>();

        info!(
            targets = targets.len(),
            schemes = schemes.len(),
            failures = failures.len(),
            "Generated {}",
            self.config.project.name
        );

        Ok(ProjectDescription {
            name: self.config.project.name.clone(),
            container: self
                .config
                .project
                .workspace_output_path
                .display()
                .to_string(),
            targets,
            schemes,
            failures,
        })
    }

    fn linker_flag_processor(&self) -> LinkerFlagProcessor<'_> {
        LinkerFlagProcessor::new(&self.file_path_resolver, &self.graph.xcode_generated_files)
    }
}
