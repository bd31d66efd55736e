//! Service Inventory Controller
//!
//! Keeps the Kubernetes Services of a tracing deployment instance in line with
//! a desired manifest:
//! - Services in the manifest but not in the cluster are created
//! - Services in both are updated, keeping cluster-assigned fields
//! - Labelled Services no longer in the manifest are deleted
//!
//! Each run is one reconciliation pass; schedule it (e.g. as a Job) to keep
//! the instance converged.

mod config;
mod controller;
mod error;
mod manifest;

use crate::config::Config;
use crate::error::ControllerError;
use controller::{Controller, PassOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Service Inventory Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Instance: {}", config.instance_name);
    info!("  Namespace: {}", config.namespace);
    info!("  Managed by: {}", config.managed_by);
    info!("  Manifest: {}", config.manifest_path.display());
    info!("  Dry run: {}", config.dry_run);
    info!("  Apply timeout: {}s", config.apply_timeout.as_secs());

    let controller = Controller::connect(config).await?;
    match controller.run().await? {
        PassOutcome::Applied(report) => {
            info!("Pass complete: {} operations applied", report.total());
        }
        PassOutcome::Planned(plan) => {
            info!("Dry run complete: {} operations planned", plan.len());
        }
    }

    Ok(())
}
