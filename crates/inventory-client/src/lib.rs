//! Inventory Backend Client
//!
//! The boundary between the service inventory engine and the Kubernetes API.
//! The engine never talks to the API server directly: it lists observed
//! resources through [`ResourceLister`] and mutates them through
//! [`ResourceWriter`], both of which are implemented by [`KubeClient`] for any
//! namespaced kind.
//!
//! # Example
//!
//! ```no_run
//! use inventory_client::{CallContext, KubeClient, ResourceLister, Selector};
//! use k8s_openapi::api::core::v1::Service;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClient::try_default().await?;
//! let selector = Selector::for_instance("observability", "simplest");
//!
//! let ctx = CallContext::new();
//! let services: Vec<Service> = client.list(&ctx, &selector).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Label selection**: instance + managed-by selectors rendered for the API server
//! - **Cancellation**: every call races a cancellation token and an optional deadline
//! - **Error mapping**: 404 and 409 responses surface as typed errors
//! - **Mocking**: an in-memory backend behind the `test-util` feature

pub mod client;
pub mod context;
pub mod error;
pub mod selector;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeClient;
pub use client_trait::{ResourceLister, ResourceWriter};
pub use context::CallContext;
pub use error::ClientError;
pub use selector::Selector;
#[cfg(feature = "test-util")]
pub use mock::{FailureMode, MockCall, MockClient, MockVerb};
