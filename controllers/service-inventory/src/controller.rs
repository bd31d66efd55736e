//! Main controller implementation.
//!
//! This module contains the `Controller` struct that runs one reconciliation
//! pass of the managed Services: load the desired manifest, list what the
//! cluster has, diff, then apply (or only log the plan in dry-run mode).

use crate::config::Config;
use crate::error::ControllerError;
use crate::manifest;
use inventory::{ApplyReport, DiffResult, PrometheusSink, Reconciler, TracingSink};
use inventory_client::{CallContext, KubeClient, ResourceLister, ResourceWriter};
use k8s_openapi::api::core::v1::Service;
use prometheus::{Registry, TextEncoder};
use tracing::{debug, info, warn};

/// Sink used by the controller: `tracing` events plus Prometheus counters.
pub type ControllerSink = (TracingSink, PrometheusSink);

/// Result of one pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// Operations were applied
    Applied(ApplyReport),
    /// Dry run: the plan that would have been applied
    Planned(DiffResult<Service>),
}

/// Controller for the Services of one tracing deployment instance.
pub struct Controller<C> {
    config: Config,
    reconciler: Reconciler<C, C, ControllerSink>,
    registry: Registry,
}

impl Controller<KubeClient> {
    /// Creates a controller talking to the cluster from the in-cluster or
    /// kubeconfig environment.
    pub async fn connect(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing Service Inventory controller");
        let client = KubeClient::try_default().await?;
        Self::with_client(config, client)
    }
}

impl<C> Controller<C>
where
    C: ResourceLister<Service> + ResourceWriter<Service> + Clone,
{
    /// Creates a controller over an existing backend client.
    pub fn with_client(config: Config, client: C) -> Result<Self, ControllerError> {
        let registry = Registry::new();
        let sink = (TracingSink, PrometheusSink::new(&registry)?);
        Ok(Self {
            config,
            reconciler: Reconciler::new(client.clone(), client, sink),
            registry,
        })
    }

    /// The Prometheus counters of this controller.
    pub fn metrics(&self) -> &PrometheusSink {
        &self.reconciler.sink().1
    }

    /// Runs one pass until it completes, fails, times out, or Ctrl-C is
    /// pressed.
    pub async fn run(&self) -> Result<PassOutcome, ControllerError> {
        let ctx = CallContext::new().with_timeout(self.config.apply_timeout);
        let shutdown = ctx.token().clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling reconciliation");
                shutdown.cancel();
            }
        });

        let outcome = self.run_with(&ctx).await;
        interrupt.abort();
        self.log_metrics();
        outcome
    }

    /// Runs one pass under `ctx`.
    pub async fn run_with(&self, ctx: &CallContext) -> Result<PassOutcome, ControllerError> {
        let selector = self.config.selector();
        let desired = manifest::load_services(&self.config.manifest_path, &selector)?;
        info!(
            "Loaded {} desired services for instance {} from {}",
            desired.len(),
            self.config.instance_name,
            self.config.manifest_path.display()
        );

        if self.config.dry_run {
            let plan: DiffResult<Service> = self.reconciler.plan(ctx, &selector, &desired).await?;
            info!("Dry run, not applying: {}", serde_json::to_string(&plan.summary())?);
            return Ok(PassOutcome::Planned(plan));
        }

        let report = self.reconciler.reconcile(ctx, &selector, &desired).await?;
        Ok(PassOutcome::Applied(report))
    }

    fn log_metrics(&self) {
        match TextEncoder::new().encode_to_string(&self.registry.gather()) {
            Ok(text) => debug!("Metrics after pass:\n{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }
}
