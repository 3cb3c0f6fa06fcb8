use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one raw build-graph node.
///
/// A node is one platform/configuration variant of a logical unit, so a
/// single build label usually maps to several `TargetId`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(SmolStr);

impl TargetId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(SmolStr::from(id))
    }
}

/// Grouping key for raw targets merged into one logical project target.
///
/// The key is the set of merged ids itself, so two keys are equal exactly
/// when they cover the same targets. Ordering follows the sorted id lists,
/// which gives every derived index a stable iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsolidatedTargetKey(BTreeSet<TargetId>);

impl ConsolidatedTargetKey {
    pub fn new(target_ids: impl IntoIterator<Item = TargetId>) -> Self {
        Self(target_ids.into_iter().collect())
    }

    pub fn target_ids(&self) -> &BTreeSet<TargetId> {
        &self.0
    }

    /// The smallest id in the key. Keys are never empty once validated.
    pub fn first(&self) -> Option<&TargetId> {
        self.0.first()
    }
}

impl fmt::Display for ConsolidatedTargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id.as_str())?;
        }
        f.write_str("]")
    }
}
