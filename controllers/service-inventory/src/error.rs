//! Controller-specific error types.
//!
//! This module defines error types specific to the Service Inventory controller
//! that are not covered by the engine and client errors.

use inventory::InventoryError;
use inventory_client::ClientError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Service Inventory controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Backend client error outside a reconciliation pass
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Reconciliation pass failed
    #[error("Reconciliation failed: {0}")]
    Inventory(#[from] InventoryError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Desired manifest is readable but not usable
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// Reading the manifest failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest is not valid YAML for the expected kind
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Rendering the dry-run plan failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registering or encoding metrics failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
