use crate::resource::{InventoryResource, merge_system_metadata};
use k8s_openapi::api::core::v1::ConfigMap;
use std::collections::BTreeMap;

impl InventoryResource for ConfigMap {
    type Spec = BTreeMap<String, String>;

    fn spec(&self) -> Option<&BTreeMap<String, String>> {
        self.data.as_ref()
    }

    fn with_metadata_from(mut self, observed: &Self) -> Self {
        merge_system_metadata(&mut self.metadata, &observed.metadata);
        if self.immutable.is_none() {
            self.immutable = observed.immutable;
        }
        self
    }
}
