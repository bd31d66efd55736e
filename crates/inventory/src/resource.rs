//! Capability trait shared by every managed kind.
//!
//! One generic differ and executor serve all kinds; what differs per kind is
//! only which fields count as "spec" and which system-assigned fields must be
//! carried from the observed object into an update.

use crate::key::ResourceKey;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// A resource the inventory engine can diff and apply.
pub trait InventoryResource:
    Resource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static
{
    /// The caller-controlled content compared between observed and desired.
    type Spec: PartialEq + Debug;

    /// Stable identity of this object.
    fn key(&self) -> ResourceKey {
        ResourceKey::of(self)
    }

    /// Kind name used in logs, events and metric labels (e.g. `Service`).
    fn kind_name() -> String {
        Self::kind(&()).into_owned()
    }

    /// The spec portion of the object, if set.
    fn spec(&self) -> Option<&Self::Spec>;

    /// Turns a desired object into an update candidate for `observed`.
    ///
    /// The result keeps the desired spec and takes the observed object's
    /// system-assigned metadata (resource version, uid, owner references) and
    /// any field the API server rejects changes to.
    #[must_use]
    fn with_metadata_from(self, observed: &Self) -> Self;
}

/// Overlays the system-assigned fields of `observed` onto `desired`.
///
/// Labels and annotations are merged with desired entries winning, so entries
/// added by other actors survive the update.
pub fn merge_system_metadata(desired: &mut ObjectMeta, observed: &ObjectMeta) {
    desired.resource_version.clone_from(&observed.resource_version);
    desired.uid.clone_from(&observed.uid);
    desired.creation_timestamp.clone_from(&observed.creation_timestamp);
    desired.generation = observed.generation;

    if observed.owner_references.is_some() {
        desired.owner_references.clone_from(&observed.owner_references);
    }
    if observed.finalizers.is_some() {
        desired.finalizers.clone_from(&observed.finalizers);
    }

    desired.labels = merge_maps(observed.labels.as_ref(), desired.labels.take());
    desired.annotations = merge_maps(observed.annotations.as_ref(), desired.annotations.take());
}

fn merge_maps(
    observed: Option<&BTreeMap<String, String>>,
    desired: Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    match (observed, desired) {
        (None, desired) => desired,
        (Some(observed), None) => Some(observed.clone()),
        (Some(observed), Some(desired)) => {
            let mut merged = observed.clone();
            merged.extend(desired);
            Some(merged)
        }
    }
}
