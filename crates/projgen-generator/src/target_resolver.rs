//! The central target index.
//!
//! [`TargetResolver`] maps raw target ids to consolidation keys and holds one
//! [`ProjectTargetInfo`] per key: the union of the merged targets' platforms
//! and extension points, plus the keys of every consolidated target that can
//! host it. Hosts are stored as keys into the same index, never as embedded
//! records. The resolver is built once and only read afterwards.

use crate::consolidation::ConsolidatedTargetKeys;
use crate::error::ResolverError;
use crate::file_path_resolver::FilePathResolver;
use crate::project_target::{create_project_targets, BuildableReference, ProjectTarget};
use crate::scheme_info::{HostInfo, HostResolution, TargetInfo};
use projgen_build::{BuildGraph, ExtensionPointIdentifier, Target};
use projgen_common::{ConsolidatedTargetKey, Platform, TargetId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Resolved view of one consolidated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTargetInfo {
    pub key: ConsolidatedTargetKey,
    pub project_target: Arc<ProjectTarget>,
    pub platforms: BTreeSet<Platform>,
    pub extension_point_identifiers: BTreeSet<ExtensionPointIdentifier>,
    pub buildable_reference: BuildableReference,
    /// Consolidated targets that can host this one at runtime.
    pub host_keys: BTreeSet<ConsolidatedTargetKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolver {
    targets: BTreeMap<TargetId, Target>,
    consolidated_target_keys: BTreeMap<TargetId, ConsolidatedTargetKey>,
    project_target_infos: BTreeMap<ConsolidatedTargetKey, ProjectTargetInfo>,
    ids_by_label: FxHashMap<String, Vec<TargetId>>,
}

impl TargetResolver {
    pub fn new(
        referenced_container: impl Into<String>,
        targets: BTreeMap<TargetId, Target>,
        target_hosts: BTreeMap<TargetId, Vec<TargetId>>,
        extension_point_identifiers: BTreeMap<TargetId, ExtensionPointIdentifier>,
        consolidated_target_keys: BTreeMap<TargetId, ConsolidatedTargetKey>,
        project_targets: BTreeMap<ConsolidatedTargetKey, Arc<ProjectTarget>>,
    ) -> Result<Self, ResolverError> {
        let referenced_container = referenced_container.into();
        let key_for = |id: &TargetId, context: &'static str| {
            consolidated_target_keys
                .get(id)
                .ok_or_else(|| ResolverError::UnknownTarget {
                    id: id.clone(),
                    context,
                })
        };

        let mut host_keys: BTreeMap<&ConsolidatedTargetKey, BTreeSet<ConsolidatedTargetKey>> =
            BTreeMap::new();
        for (id, host_ids) in &target_hosts {
            let key = key_for(id, "collecting host keys")?;
            let keys = host_keys.entry(key).or_default();
            for host_id in host_ids {
                keys.insert(key_for(host_id, "collecting host keys")?.clone());
            }
        }

        let mut platforms_by_key: BTreeMap<&ConsolidatedTargetKey, BTreeSet<Platform>> =
            BTreeMap::new();
        for (id, key) in &consolidated_target_keys {
            let target = targets.get(id).ok_or_else(|| ResolverError::UnknownTarget {
                id: id.clone(),
                context: "collecting platforms",
            })?;
            platforms_by_key
                .entry(key)
                .or_default()
                .insert(target.platform.clone());
        }

        let mut keyed_extension_point_identifiers: BTreeMap<
            &ConsolidatedTargetKey,
            BTreeSet<ExtensionPointIdentifier>,
        > = BTreeMap::new();
        for (id, identifier) in &extension_point_identifiers {
            let key = key_for(id, "collecting extension point identifiers")?;
            keyed_extension_point_identifiers
                .entry(key)
                .or_default()
                .insert(identifier.clone());
        }

        let mut project_target_infos = BTreeMap::new();
        for (key, project_target) in &project_targets {
            let platforms = platforms_by_key
                .get(key)
                .cloned()
                .ok_or_else(|| ResolverError::UnknownKey {
                    key: key.clone(),
                    context: "collecting platforms",
                })?;
            let info = ProjectTargetInfo {
                key: key.clone(),
                project_target: Arc::clone(project_target),
                platforms,
                extension_point_identifiers: keyed_extension_point_identifiers
                    .get(key)
                    .cloned()
                    .unwrap_or_default(),
                buildable_reference: BuildableReference::new(project_target, &referenced_container),
                host_keys: host_keys.get(key).cloned().unwrap_or_default(),
            };
            project_target_infos.insert(key.clone(), info);
        }

        let mut ids_by_label: FxHashMap<String, Vec<TargetId>> = FxHashMap::default();
        for (id, target) in &targets {
            ids_by_label.entry(target.label.clone()).or_default().push(id.clone());
        }

        debug!(
            targets = targets.len(),
            consolidated = project_target_infos.len(),
            hosted = host_keys.len(),
            "Built target resolver"
        );

        Ok(Self {
            targets,
            consolidated_target_keys,
            project_target_infos,
            ids_by_label,
        })
    }

    /// Build a resolver for a whole build graph: consolidation keys (given
    /// or computed), one project target per key, and the index.
    pub fn from_graph(
        graph: &BuildGraph,
        keys: &ConsolidatedTargetKeys,
        file_path_resolver: &FilePathResolver,
    ) -> Result<Self, ResolverError> {
        let project_targets = create_project_targets(keys, &graph.targets)?;
        Self::new(
            file_path_resolver.container_reference(),
            graph.targets.clone(),
            graph.target_hosts.clone(),
            graph.extension_point_identifiers.clone(),
            keys.as_map().clone(),
            project_targets,
        )
    }

    pub fn targets(&self) -> &BTreeMap<TargetId, Target> {
        &self.targets
    }

    pub fn project_target_infos(&self) -> &BTreeMap<ConsolidatedTargetKey, ProjectTargetInfo> {
        &self.project_target_infos
    }

    pub fn key(&self, target_id: &TargetId) -> Option<&ConsolidatedTargetKey> {
        self.consolidated_target_keys.get(target_id)
    }

    /// Fails with [`ResolverError::UnknownTarget`] when `target_id` has no
    /// key or its key has no indexed info.
    pub fn project_target_info(
        &self,
        target_id: &TargetId,
    ) -> Result<&ProjectTargetInfo, ResolverError> {
        self.key(target_id)
            .and_then(|key| self.project_target_infos.get(key))
            .ok_or_else(|| ResolverError::UnknownTarget {
                id: target_id.clone(),
                context: "finding a project target info",
            })
    }

    fn info_for_key(
        &self,
        key: &ConsolidatedTargetKey,
        context: &'static str,
    ) -> Result<&ProjectTargetInfo, ResolverError> {
        self.project_target_infos
            .get(key)
            .ok_or_else(|| ResolverError::UnknownKey {
                key: key.clone(),
                context,
            })
    }

    /// The target info of `target_id`, with host infos numbered in host-key
    /// order.
    pub fn target_info(&self, target_id: &TargetId) -> Result<TargetInfo, ResolverError> {
        let info = self.project_target_info(target_id)?;
        self.target_info_for(info)
    }

    /// One target info per consolidated target, in key order.
    pub fn target_infos(&self) -> Result<Vec<TargetInfo>, ResolverError> {
        self.project_target_infos
            .values()
            .map(|info| self.target_info_for(info))
            .collect()
    }

    fn target_info_for(&self, info: &ProjectTargetInfo) -> Result<TargetInfo, ResolverError> {
        let host_infos = info
            .host_keys
            .iter()
            .enumerate()
            .map(|(index, host_key)| {
                let host = self.info_for_key(host_key, "resolving host infos")?;
                Ok(HostInfo::new(host, index))
            })
            .collect::<Result<Vec<_>, ResolverError>>()?;

        Ok(TargetInfo {
            key: info.key.clone(),
            project_target: Arc::clone(&info.project_target),
            platforms: info.platforms.clone(),
            buildable_reference: info.buildable_reference.clone(),
            extension_point_identifiers: info.extension_point_identifiers.clone(),
            host_infos,
            host_resolution: HostResolution::Unresolved,
        })
    }

    /// All target ids built from `label`, in id order.
    pub fn target_ids_for_label(&self, label: &str) -> &[TargetId] {
        self.ids_by_label.get(label).map(Vec::as_slice).unwrap_or_default()
    }

    /// The target id a scheme should use for `label`: the first simulator
    /// build if there is one, otherwise the first id.
    pub fn target_id_for_label(&self, label: &str) -> Option<&TargetId> {
        let ids = self.target_ids_for_label(label);
        ids.iter()
            .find(|id| {
                self.targets
                    .get(*id)
                    .is_some_and(|target| target.platform.is_simulator())
            })
            .or_else(|| ids.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgen_build::{LinkerInputs, Product};
    use projgen_common::{Environment, Os, ProductType};

    fn target(label: &str, product_type: ProductType, platform: Platform) -> Target {
        Target {
            label: label.into(),
            configuration: String::new(),
            product: Product {
                product_type,
                name: label.rsplit(':').next().unwrap_or(label).into(),
                path: None,
            },
            platform,
            linker_inputs: LinkerInputs::default(),
        }
    }

    fn device() -> Platform {
        Platform::new(Os::Ios, "arm64", "15.0", Environment::Device)
    }

    fn sim() -> Platform {
        Platform::new(Os::Ios, "x86_64", "15.0", Environment::Simulator)
    }

    fn key(ids: &[&str]) -> ConsolidatedTargetKey {
        ConsolidatedTargetKey::new(ids.iter().map(|id| TargetId::from(*id)))
    }

    /// Two apps that can both host one test bundle; the test bundle and the
    /// first app each have a device and a simulator variant.
    fn fixture() -> TargetResolver {
        let targets = BTreeMap::from([
            ("App 1".into(), target("//app:App", ProductType::Application, device())),
            ("App 2".into(), target("//app:App", ProductType::Application, sim())),
            ("Other 1".into(), target("//other:Other", ProductType::Application, sim())),
            ("Tests 1".into(), target("//app:Tests", ProductType::UnitTestBundle, device())),
            ("Tests 2".into(), target("//app:Tests", ProductType::UnitTestBundle, sim())),
            ("Widget 1".into(), target("//app:Widget", ProductType::AppExtension, sim())),
        ]);
        let target_hosts = BTreeMap::from([
            ("Tests 1".into(), vec!["Other 1".into(), "App 1".into()]),
            ("Tests 2".into(), vec!["App 2".into()]),
            ("Widget 1".into(), vec!["App 2".into()]),
        ]);
        let extension_point_identifiers = BTreeMap::from([(
            "Widget 1".into(),
            "com.apple.widgetkit-extension".to_string(),
        )]);

        let keys = ConsolidatedTargetKeys::compute(&targets);
        let project_targets = create_project_targets(&keys, &targets).unwrap();

        TargetResolver::new(
            "container:Foo.xcodeproj",
            targets,
            target_hosts,
            extension_point_identifiers,
            keys.into_map(),
            project_targets,
        )
        .unwrap()
    }

    #[test]
    fn test_platforms_are_unioned_per_key() {
        let resolver = fixture();
        let info = resolver.project_target_info(&"App 1".into()).unwrap();

        assert_eq!(info.key, key(&["App 1", "App 2"]));
        assert_eq!(info.platforms, BTreeSet::from([device(), sim()]));
        assert_eq!(info.buildable_reference.referenced_container, "container:Foo.xcodeproj");
        assert_eq!(
            resolver.project_target_info(&"App 2".into()).unwrap(),
            info
        );
    }

    #[test]
    fn test_host_keys_are_unioned_across_variants() {
        let resolver = fixture();
        let info = resolver.project_target_info(&"Tests 2".into()).unwrap();

        assert_eq!(
            info.host_keys,
            BTreeSet::from([key(&["App 1", "App 2"]), key(&["Other 1"])])
        );
    }

    #[test]
    fn test_host_infos_are_numbered_in_key_order() {
        let resolver = fixture();
        let info = resolver.target_info(&"Tests 1".into()).unwrap();

        let hosts: Vec<_> = info
            .host_infos
            .iter()
            .map(|h| (h.project_target.name().to_string(), h.index))
            .collect();
        assert_eq!(hosts, vec![("App".to_string(), 0), ("Other".to_string(), 1)]);
        assert_eq!(info.host_resolution, HostResolution::Unresolved);

        // Stable across rebuilds.
        for _ in 0..3 {
            assert_eq!(fixture().target_info(&"Tests 1".into()).unwrap(), info);
        }
    }

    #[test]
    fn test_targets_without_hosts_have_no_host_infos() {
        let resolver = fixture();
        assert!(resolver.target_info(&"App 1".into()).unwrap().host_infos.is_empty());
        assert!(resolver
            .project_target_info(&"Other 1".into())
            .unwrap()
            .host_keys
            .is_empty());
    }

    #[test]
    fn test_extension_point_identifiers() {
        let resolver = fixture();
        let info = resolver.project_target_info(&"Widget 1".into()).unwrap();
        assert_eq!(
            info.extension_point_identifiers,
            BTreeSet::from(["com.apple.widgetkit-extension".to_string()])
        );
        assert!(resolver
            .project_target_info(&"App 1".into())
            .unwrap()
            .extension_point_identifiers
            .is_empty());
    }

    #[test]
    fn test_target_infos_cover_every_key_in_order() {
        let resolver = fixture();
        let names: Vec<_> = resolver
            .target_infos()
            .unwrap()
            .into_iter()
            .map(|info| info.project_target.name().to_string())
            .collect();
        assert_eq!(names, vec!["App", "Other", "Tests", "Widget"]);
    }

    #[test]
    fn test_unknown_target() {
        let resolver = fixture();
        let err = resolver.target_info(&"Nope".into()).unwrap_err();
        assert!(matches!(err, ResolverError::UnknownTarget { id, .. } if id.as_str() == "Nope"));
    }

    #[test]
    fn test_unindexed_key_reports_target_id() {
        let targets =
            BTreeMap::from([("A 1".into(), target("//a:A", ProductType::Application, sim()))]);
        let keys = ConsolidatedTargetKeys::compute(&targets);

        let resolver = TargetResolver::new(
            "container:Foo.xcodeproj",
            targets,
            BTreeMap::new(),
            BTreeMap::new(),
            keys.into_map(),
            BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(
            resolver.project_target_info(&"A 1".into()).unwrap_err(),
            ResolverError::UnknownTarget {
                id: "A 1".into(),
                context: "finding a project target info"
            }
        );
        assert!(resolver.target_infos().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_host_id_fails_construction() {
        let targets =
            BTreeMap::from([("A".into(), target("//a:A", ProductType::UnitTestBundle, sim()))]);
        let keys = ConsolidatedTargetKeys::compute(&targets);
        let project_targets = create_project_targets(&keys, &targets).unwrap();

        let err = TargetResolver::new(
            "container:Foo.xcodeproj",
            targets,
            BTreeMap::from([("A".into(), vec!["Missing".into()])]),
            BTreeMap::new(),
            keys.into_map(),
            project_targets,
        )
        .unwrap_err();

        assert_eq!(
            err,
            ResolverError::UnknownTarget {
                id: "Missing".into(),
                context: "collecting host keys"
            }
        );
    }

    #[test]
    fn test_project_target_without_platforms_fails_construction() {
        let targets =
            BTreeMap::from([("A".into(), target("//a:A", ProductType::Application, sim()))]);
        let keys = ConsolidatedTargetKeys::compute(&targets);
        let mut project_targets = create_project_targets(&keys, &targets).unwrap();
        project_targets.insert(
            key(&["Ghost"]),
            Arc::new(ProjectTarget::new("Ghost", ProductType::Application)),
        );

        let err = TargetResolver::new(
            "container:Foo.xcodeproj",
            targets,
            BTreeMap::new(),
            BTreeMap::new(),
            keys.into_map(),
            project_targets,
        )
        .unwrap_err();
        assert!(matches!(err, ResolverError::UnknownKey { .. }));
    }

    #[test]
    fn test_target_id_for_label_prefers_simulator() {
        let resolver = fixture();
        assert_eq!(
            resolver.target_ids_for_label("//app:App"),
            &[TargetId::from("App 1"), TargetId::from("App 2")]
        );
        assert_eq!(resolver.target_id_for_label("//app:App"), Some(&"App 2".into()));
        assert_eq!(resolver.target_id_for_label("//nope:Nope"), None);
    }
}
