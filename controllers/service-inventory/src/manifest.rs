//! Desired-state manifest loading.
//!
//! The manifest is a multi-document YAML file of `v1/Service` objects. Each
//! document becomes one desired Service scoped to the managed namespace and
//! labelled so the next listing finds it again.

use crate::error::ControllerError;
use inventory::{InventoryResource, duplicate_keys};
use inventory_client::Selector;
use k8s_openapi::api::core::v1::Service;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Reads and prepares the desired Services in `path`.
pub fn load_services(path: &Path, selector: &Selector) -> Result<Vec<Service>, ControllerError> {
    let text = std::fs::read_to_string(path)?;
    let services = parse_services(&text, selector)?;
    debug!("Loaded {} services from {}", services.len(), path.display());
    Ok(services)
}

/// Parses every document of `text` into a Service and stamps it for `selector`.
///
/// Empty documents are skipped. A Service without a name, in a namespace
/// other than the selector's, or sharing a key with an earlier document is
/// rejected: the first would never be found again and the others would be
/// recreated or overwritten on every pass.
pub fn parse_services(text: &str, selector: &Selector) -> Result<Vec<Service>, ControllerError> {
    let mut services = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        let mut svc: Service = serde_yaml::from_value(value)?;

        if svc.metadata.name.as_deref().is_none_or(str::is_empty) {
            return Err(ControllerError::Manifest(format!(
                "document {} has no metadata.name",
                index + 1
            )));
        }
        stamp(&mut svc, selector)?;
        services.push(svc);
    }

    if let Some(key) = duplicate_keys(&services).into_iter().next() {
        return Err(ControllerError::Manifest(format!(
            "service {} is declared more than once",
            key
        )));
    }
    Ok(services)
}

/// Defaults the namespace and merges the selector labels into `svc`.
fn stamp(svc: &mut Service, selector: &Selector) -> Result<(), ControllerError> {
    match svc.metadata.namespace.as_deref() {
        None | Some("") => svc.metadata.namespace = Some(selector.namespace.clone()),
        Some(ns) if ns == selector.namespace => {}
        Some(ns) => {
            return Err(ControllerError::Manifest(format!(
                "service {} is in namespace {}, expected {}",
                svc.key().name,
                ns,
                selector.namespace
            )));
        }
    }

    let labels = svc.metadata.labels.get_or_insert_with(Default::default);
    for (key, value) in &selector.labels {
        labels.insert(key.clone(), value.clone());
    }
    Ok(())
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod manifest_test;
