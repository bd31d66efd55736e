//! Inventory differ.
//!
//! Compares an observed collection against a desired one and partitions the
//! union of their keys into creates, updates and deletes. The differ is pure:
//! it performs no I/O and cannot fail.

use crate::key::ResourceKey;
use crate::resource::InventoryResource;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Kind of mutation issued against the backend.
///
/// Phases run in [`Phase::ORDER`]: creates first so new resources exist
/// before anything referencing them goes away, deletes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Create a resource that is desired but not observed
    Create,
    /// Replace a resource that is both desired and observed
    Update,
    /// Delete a resource that is observed but no longer desired
    Delete,
}

impl Phase {
    /// Order in which the executor applies phases.
    pub const ORDER: [Phase; 3] = [Phase::Create, Phase::Update, Phase::Delete];

    /// Lowercase name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three disjoint result sets of a diff, each sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult<K> {
    /// Desired resources with no observed counterpart, as desired
    pub to_create: Vec<K>,
    /// Desired spec merged with observed system metadata, one per matched key
    pub to_update: Vec<K>,
    /// Observed resources with no desired counterpart, unchanged
    pub to_delete: Vec<K>,
}

impl<K> Default for DiffResult<K> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<K: InventoryResource> DiffResult<K> {
    /// The result set for `phase`.
    pub fn for_phase(&self, phase: Phase) -> &[K] {
        match phase {
            Phase::Create => &self.to_create,
            Phase::Update => &self.to_update,
            Phase::Delete => &self.to_delete,
        }
    }

    /// Every operation in apply order: creates, updates, deletes.
    pub fn operations(&self) -> impl Iterator<Item = (Phase, &K)> {
        Phase::ORDER
            .into_iter()
            .flat_map(move |phase| self.for_phase(phase).iter().map(move |obj| (phase, obj)))
    }

    /// Total number of backend calls applying this result will issue.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Whether there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys per phase, for logs and dry-run output.
    pub fn summary(&self) -> DiffSummary {
        let keys = |objs: &[K]| -> Vec<String> {
            objs.iter().map(|obj| obj.key().to_string()).collect()
        };
        DiffSummary {
            kind: K::kind_name(),
            create: keys(&self.to_create),
            update: keys(&self.to_update),
            delete: keys(&self.to_delete),
        }
    }
}

/// Serializable view of a [`DiffResult`] listing keys only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Kind the keys belong to
    pub kind: String,
    /// Keys to create
    pub create: Vec<String>,
    /// Keys to update
    pub update: Vec<String>,
    /// Keys to delete
    pub delete: Vec<String>,
}

/// Computes the create/update/delete partition of `observed` and `desired`.
///
/// Every key present in both collections lands in `to_update`, even when the
/// spec is unchanged: updates are unconditional for matched keys.
///
/// Preconditions: keys are well-formed (see [`ResourceKey::is_well_formed`])
/// and unique within each collection. A duplicated key is resolved
/// last-write-wins: the later element in the input replaces the earlier one.
pub fn diff<K: InventoryResource>(observed: Vec<K>, desired: Vec<K>) -> DiffResult<K> {
    let mut observed = index_by_key(observed);
    let desired = index_by_key(desired);

    let mut result = DiffResult::default();
    for (key, wanted) in desired {
        match observed.remove(&key) {
            Some(current) => {
                let candidate = wanted.with_metadata_from(&current);
                if candidate.spec() == current.spec() {
                    debug!("{} {}: no spec drift, updating unconditionally", K::kind_name(), key);
                }
                result.to_update.push(candidate);
            }
            None => result.to_create.push(wanted),
        }
    }
    result.to_delete = observed.into_values().collect();
    result
}

/// Keys appearing more than once in `objs`, sorted and reported once each.
pub fn duplicate_keys<K: InventoryResource>(objs: &[K]) -> Vec<ResourceKey> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for key in objs.iter().map(|obj| obj.key()) {
        if !seen.insert(key.clone()) {
            duplicates.insert(key);
        }
    }
    duplicates.into_iter().collect()
}

fn index_by_key<K: InventoryResource>(objs: Vec<K>) -> BTreeMap<ResourceKey, K> {
    objs.into_iter().map(|obj| (obj.key(), obj)).collect()
}
