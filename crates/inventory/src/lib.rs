//! Service Inventory Engine
//!
//! Reconciles a collection of namespaced Kubernetes resources (the Services of
//! a tracing deployment, or any kind implementing [`InventoryResource`])
//! toward a desired collection.
//!
//! A pass has two parts:
//! - [`diff`]: pure partition of observed and desired resources into creates,
//!   updates and deletes, each sorted by [`ResourceKey`]
//! - [`Executor`]: sequential, fail-fast application of that partition through
//!   a [`ResourceWriter`](inventory_client::ResourceWriter)
//!
//! [`Reconciler`] wires both to an injected lister, writer and
//! [`ObservabilitySink`].
//!
//! # Example
//!
//! ```no_run
//! use inventory::{Reconciler, TracingSink};
//! use inventory_client::{CallContext, KubeClient, Selector};
//! use k8s_openapi::api::core::v1::Service;
//!
//! # async fn example(desired: Vec<Service>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClient::try_default().await?;
//! let reconciler = Reconciler::new(client.clone(), client, TracingSink);
//!
//! let selector = Selector::for_instance("observability", "simplest");
//! let report = reconciler
//!     .reconcile(&CallContext::new(), &selector, &desired)
//!     .await?;
//! println!("{} operations applied", report.total());
//! # Ok(())
//! # }
//! ```

pub mod apply;
pub mod diff;
pub mod error;
pub mod key;
pub mod kinds;
pub mod reconcile;
pub mod resource;
pub mod sink;
#[cfg(test)]
mod test_utils;

pub use apply::{ApplyReport, ApplyState, Executor};
pub use diff::{DiffResult, DiffSummary, Phase, diff, duplicate_keys};
pub use error::InventoryError;
pub use key::ResourceKey;
pub use reconcile::{DesiredStateProvider, Reconciler};
pub use resource::{InventoryResource, merge_system_metadata};
pub use sink::{ApplyEvent, NoopSink, ObservabilitySink, Outcome, PrometheusSink, TracingSink};
#[cfg(feature = "test-util")]
pub use sink::RecordingSink;
