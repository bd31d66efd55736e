//! Backend traits for mocking
//!
//! These traits abstract the resource backend so the engine can be driven by
//! the real Kubernetes API or by an in-memory mock in unit tests. Listing and
//! writing are separate capabilities; a backend usually implements both.

use crate::context::CallContext;
use crate::error::ClientError;
use crate::selector::Selector;

/// Lists the currently observed resources of kind `K`.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceLister<K>: Send + Sync {
    /// Returns every object in `selector.namespace` carrying all of `selector.labels`.
    async fn list(&self, ctx: &CallContext, selector: &Selector) -> Result<Vec<K>, ClientError>;
}

/// Mutates resources of kind `K`, one object per call.
#[async_trait::async_trait]
pub trait ResourceWriter<K>: Send + Sync {
    /// Creates `obj`. Fails with `Conflict` if it already exists.
    async fn create(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError>;

    /// Replaces `obj`, guarded by the resource version it carries.
    async fn update(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError>;

    /// Deletes `obj`. Fails with `NotFound` if it is already gone.
    async fn delete(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError>;
}
