//! Consolidation of raw build-graph targets into logical project targets.
//!
//! Raw targets that represent the same logical unit built for different
//! platforms share one [`ConsolidatedTargetKey`]. Keys normally arrive
//! pre-computed with the build graph; when they don't, they are computed
//! here from each target's non-platform settings.

use crate::error::ConsolidationError;
use projgen_build::{BuildGraph, Target};
use projgen_common::{ConsolidatedTargetKey, Platform, ProductType, TargetId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Settings that must match for two targets to be merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Fingerprint<'a> {
    label: &'a str,
    product_type: ProductType,
    product_name: &'a str,
}

impl<'a> Fingerprint<'a> {
    fn of(target: &'a Target) -> Self {
        Self {
            label: &target.label,
            product_type: target.product.product_type,
            product_name: &target.product.name,
        }
    }
}

/// Validated mapping of every target id to its consolidation key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedTargetKeys {
    keys: BTreeMap<TargetId, ConsolidatedTargetKey>,
}

impl ConsolidatedTargetKeys {
    /// Use the graph's pre-computed groups, or compute them.
    pub fn for_graph(graph: &BuildGraph) -> Result<Self, ConsolidationError> {
        match &graph.consolidation {
            Some(groups) => Self::from_groups(groups.iter().cloned(), &graph.targets),
            None => Ok(Self::compute(&graph.targets)),
        }
    }

    /// Index externally clustered groups, checking that they partition
    /// `targets` exactly.
    pub fn from_groups(
        groups: impl IntoIterator<Item = Vec<TargetId>>,
        targets: &BTreeMap<TargetId, Target>,
    ) -> Result<Self, ConsolidationError> {
        let mut keys = BTreeMap::new();

        for (index, group) in groups.into_iter().enumerate() {
            if group.is_empty() {
                return Err(ConsolidationError::EmptyGroup { index });
            }
            let key = ConsolidatedTargetKey::new(group.iter().cloned());
            for id in group {
                if !targets.contains_key(&id) {
                    return Err(ConsolidationError::UnknownTarget { id });
                }
                if keys.contains_key(&id) {
                    return Err(ConsolidationError::DuplicateTarget { id });
                }
                keys.insert(id, key.clone());
            }
        }

        if let Some(id) = targets.keys().find(|id| !keys.contains_key(*id)) {
            return Err(ConsolidationError::UnassignedTarget { id: id.clone() });
        }

        Ok(Self { keys })
    }

    /// Group targets whose label, product type, and product name agree.
    ///
    /// Within a group, targets are taken in id order and placed in the first
    /// bucket that has no target for the same platform, so a consolidated
    /// target never holds two variants for one platform.
    pub fn compute(targets: &BTreeMap<TargetId, Target>) -> Self {
        let mut groups: FxHashMap<Fingerprint<'_>, Vec<Vec<(&TargetId, &Platform)>>> =
            FxHashMap::default();

        for (id, target) in targets {
            let buckets = groups.entry(Fingerprint::of(target)).or_default();
            let free = buckets
                .iter_mut()
                .find(|bucket| bucket.iter().all(|(_, platform)| **platform != target.platform));
            match free {
                Some(bucket) => bucket.push((id, &target.platform)),
                None => buckets.push(vec![(id, &target.platform)]),
            }
        }

        let mut keys = BTreeMap::new();
        for bucket in groups.into_values().flatten() {
            let key = ConsolidatedTargetKey::new(bucket.iter().map(|(id, _)| (*id).clone()));
            for (id, _) in bucket {
                keys.insert(id.clone(), key.clone());
            }
        }

        let result = Self { keys };
        debug!(
            targets = targets.len(),
            consolidated = result.unique_keys().len(),
            "Computed consolidation keys"
        );
        result
    }

    pub fn key(&self, id: &TargetId) -> Option<&ConsolidatedTargetKey> {
        self.keys.get(id)
    }

    /// Every distinct key, in key order.
    pub fn unique_keys(&self) -> BTreeSet<&ConsolidatedTargetKey> {
        self.keys.values().collect()
    }

    pub fn as_map(&self) -> &BTreeMap<TargetId, ConsolidatedTargetKey> {
        &self.keys
    }

    pub fn into_map(self) -> BTreeMap<TargetId, ConsolidatedTargetKey> {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgen_build::{LinkerInputs, Product};
    use projgen_common::{Environment, Os};

    fn target(label: &str, name: &str, product_type: ProductType, platform: Platform) -> Target {
        Target {
            label: label.into(),
            configuration: String::new(),
            product: Product {
                product_type,
                name: name.into(),
                path: None,
            },
            platform,
            linker_inputs: LinkerInputs::default(),
        }
    }

    fn ios_device() -> Platform {
        Platform::new(Os::Ios, "arm64", "15.0", Environment::Device)
    }

    fn ios_sim() -> Platform {
        Platform::new(Os::Ios, "x86_64", "15.0", Environment::Simulator)
    }

    fn fixtures() -> BTreeMap<TargetId, Target> {
        BTreeMap::from([
            ("A 1".into(), target("//a:A", "A", ProductType::StaticLibrary, ios_device())),
            ("A 2".into(), target("//a:A", "A", ProductType::StaticLibrary, ios_sim())),
            ("A 3".into(), target("//a:A", "A", ProductType::StaticLibrary, ios_sim())),
            ("B 1".into(), target("//b:B", "B", ProductType::Application, ios_sim())),
            ("C 1".into(), target("//a:A", "A", ProductType::Framework, ios_sim())),
        ])
    }

    fn key(ids: &[&str]) -> ConsolidatedTargetKey {
        ConsolidatedTargetKey::new(ids.iter().map(|id| TargetId::from(*id)))
    }

    #[test]
    fn test_compute_merges_platform_variants() {
        let keys = ConsolidatedTargetKeys::compute(&fixtures());

        assert_eq!(keys.key(&"A 1".into()), Some(&key(&["A 1", "A 2"])));
        assert_eq!(keys.key(&"A 2".into()), Some(&key(&["A 1", "A 2"])));
        // Same platform as "A 2", so it can't join that bucket.
        assert_eq!(keys.key(&"A 3".into()), Some(&key(&["A 3"])));
        assert_eq!(keys.key(&"B 1".into()), Some(&key(&["B 1"])));
        // Different product type.
        assert_eq!(keys.key(&"C 1".into()), Some(&key(&["C 1"])));
        assert_eq!(keys.unique_keys().len(), 4);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let first = ConsolidatedTargetKeys::compute(&fixtures());
        for _ in 0..5 {
            assert_eq!(ConsolidatedTargetKeys::compute(&fixtures()), first);
        }
    }

    #[test]
    fn test_from_groups() {
        let targets = fixtures();
        let keys = ConsolidatedTargetKeys::from_groups(
            vec![
                vec!["A 1".into(), "A 2".into(), "A 3".into()],
                vec!["B 1".into()],
                vec!["C 1".into()],
            ],
            &targets,
        )
        .unwrap();

        assert_eq!(keys.key(&"A 3".into()), Some(&key(&["A 1", "A 2", "A 3"])));
        assert_eq!(keys.as_map().len(), 5);
    }

    #[test]
    fn test_from_groups_rejects_bad_partitions() {
        let targets = fixtures();

        let err = ConsolidatedTargetKeys::from_groups(vec![vec![]], &targets).unwrap_err();
        assert_eq!(err, ConsolidationError::EmptyGroup { index: 0 });

        let err = ConsolidatedTargetKeys::from_groups(
            vec![vec!["A 1".into()], vec!["A 1".into()]],
            &targets,
        )
        .unwrap_err();
        assert_eq!(err, ConsolidationError::DuplicateTarget { id: "A 1".into() });

        let err = ConsolidatedTargetKeys::from_groups(vec![vec!["Z".into()]], &targets)
            .unwrap_err();
        assert_eq!(err, ConsolidationError::UnknownTarget { id: "Z".into() });

        let err = ConsolidatedTargetKeys::from_groups(
            vec![
                vec!["A 1".into(), "A 2".into(), "A 3".into()],
                vec!["B 1".into()],
            ],
            &targets,
        )
        .unwrap_err();
        assert_eq!(err, ConsolidationError::UnassignedTarget { id: "C 1".into() });
    }
}
