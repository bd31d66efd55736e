use crate::resource::{InventoryResource, merge_system_metadata};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};

impl InventoryResource for Deployment {
    type Spec = DeploymentSpec;

    fn spec(&self) -> Option<&DeploymentSpec> {
        self.spec.as_ref()
    }

    fn with_metadata_from(mut self, observed: &Self) -> Self {
        merge_system_metadata(&mut self.metadata, &observed.metadata);
        // Replicas left unset are owned by an autoscaler; keep its value.
        if let (Some(desired), Some(observed)) = (self.spec.as_mut(), observed.spec.as_ref()) {
            if desired.replicas.is_none() {
                desired.replicas = observed.replicas;
            }
        }
        self
    }
}
