use crate::resource::{InventoryResource, merge_system_metadata};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};

impl InventoryResource for Service {
    type Spec = ServiceSpec;

    fn spec(&self) -> Option<&ServiceSpec> {
        self.spec.as_ref()
    }

    fn with_metadata_from(mut self, observed: &Self) -> Self {
        merge_system_metadata(&mut self.metadata, &observed.metadata);
        if let (Some(desired), Some(observed)) = (self.spec.as_mut(), observed.spec.as_ref()) {
            preserve_allocated_fields(desired, observed);
        }
        self
    }
}

/// Copies fields the API server allocates from the observed spec.
///
/// Cluster IPs are immutable once allocated, so the observed value always
/// wins. The remaining fields are only filled in where the desired spec leaves
/// them unset.
fn preserve_allocated_fields(desired: &mut ServiceSpec, observed: &ServiceSpec) {
    if observed.cluster_ip.is_some() {
        desired.cluster_ip.clone_from(&observed.cluster_ip);
    }
    if observed.cluster_ips.is_some() {
        desired.cluster_ips.clone_from(&observed.cluster_ips);
    }
    if desired.ip_families.is_none() {
        desired.ip_families.clone_from(&observed.ip_families);
    }
    if desired.ip_family_policy.is_none() {
        desired.ip_family_policy.clone_from(&observed.ip_family_policy);
    }

    let service_type = desired.type_.as_deref();
    if service_type == Some("LoadBalancer") && desired.health_check_node_port.is_none() {
        desired.health_check_node_port = observed.health_check_node_port;
    }

    // Node ports are only valid on NodePort and LoadBalancer services.
    if !matches!(service_type, Some("NodePort" | "LoadBalancer")) {
        return;
    }
    if let (Some(ports), Some(observed_ports)) = (desired.ports.as_mut(), observed.ports.as_ref()) {
        for port in ports.iter_mut().filter(|p| p.node_port.is_none()) {
            port.node_port = observed_ports
                .iter()
                .find(|o| same_port(port, o))
                .and_then(|o| o.node_port);
        }
    }
}

/// Named ports match by name; unnamed ports by port number.
fn same_port(desired: &ServicePort, observed: &ServicePort) -> bool {
    match (&desired.name, &observed.name) {
        (Some(desired_name), Some(observed_name)) => desired_name == observed_name,
        (None, None) => desired.port == observed.port,
        _ => false,
    }
}
