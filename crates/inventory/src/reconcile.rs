//! One reconciliation pass: list → diff → apply.
//!
//! The reconciler owns no state beyond its injected collaborators. It can be
//! invoked repeatedly and concurrently for disjoint selectors; conflicting
//! writes to the same key are serialized by the backend's resource versions.

use crate::apply::{ApplyReport, Executor};
use crate::diff::{DiffResult, diff, duplicate_keys};
use crate::error::InventoryError;
use crate::resource::InventoryResource;
use crate::sink::ObservabilitySink;
use inventory_client::{CallContext, ResourceLister, ResourceWriter, Selector};
use tracing::field::Empty;
use tracing::{Instrument, Span, info, info_span, warn};
use uuid::Uuid;

/// Supplies the desired collection for a pass.
///
/// How the collection is computed (templating from a higher-level resource)
/// is outside the engine.
pub trait DesiredStateProvider<K>: Send + Sync {
    /// The desired resources, one per key.
    fn desired(&self) -> Vec<K>;
}

impl<K> DesiredStateProvider<K> for Vec<K>
where
    K: Clone + Send + Sync,
{
    fn desired(&self) -> Vec<K> {
        self.clone()
    }
}

/// Runs reconciliation passes against injected backend and sink.
#[derive(Debug)]
pub struct Reconciler<L, W, S> {
    lister: L,
    writer: W,
    sink: S,
}

impl<L, W, S> Reconciler<L, W, S>
where
    S: ObservabilitySink,
{
    /// Creates a reconciler.
    pub fn new(lister: L, writer: W, sink: S) -> Self {
        Self {
            lister,
            writer,
            sink,
        }
    }

    /// The observability sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Lists observed resources and diffs them against `desired` without
    /// mutating anything.
    pub async fn plan<K, P>(
        &self,
        ctx: &CallContext,
        selector: &Selector,
        desired: &P,
    ) -> Result<DiffResult<K>, InventoryError>
    where
        K: InventoryResource,
        L: ResourceLister<K>,
        P: DesiredStateProvider<K> + ?Sized,
    {
        let span = pass_span::<K>("plan", selector);
        let result = self
            .observe_and_diff(ctx, selector, desired)
            .instrument(span.clone())
            .await;
        if let Err(err) = &result {
            mark_failed(&span, err);
        }
        result
    }

    /// Runs one full pass: list, diff, then apply in create → update → delete
    /// order.
    ///
    /// A listing error aborts before any mutation. An apply error aborts the
    /// remaining operations; the caller retries the whole pass.
    pub async fn reconcile<K, P>(
        &self,
        ctx: &CallContext,
        selector: &Selector,
        desired: &P,
    ) -> Result<ApplyReport, InventoryError>
    where
        K: InventoryResource,
        L: ResourceLister<K>,
        W: ResourceWriter<K>,
        P: DesiredStateProvider<K> + ?Sized,
    {
        let span = pass_span::<K>("reconcile", selector);
        let result = async {
            let plan = self.observe_and_diff(ctx, selector, desired).await?;
            let report = Executor::new(&self.writer, &self.sink)
                .apply(ctx, &plan)
                .await?;
            info!(
                "Reconciled {} in {}: {} created, {} updated, {} deleted",
                K::kind_name(),
                selector,
                report.created,
                report.updated,
                report.deleted
            );
            Ok(report)
        }
        .instrument(span.clone())
        .await;
        if let Err(err) = &result {
            mark_failed(&span, err);
        }
        result
    }

    async fn observe_and_diff<K, P>(
        &self,
        ctx: &CallContext,
        selector: &Selector,
        desired: &P,
    ) -> Result<DiffResult<K>, InventoryError>
    where
        K: InventoryResource,
        L: ResourceLister<K>,
        P: DesiredStateProvider<K> + ?Sized,
    {
        let desired = desired.desired();
        check_preconditions("desired", &desired);

        let observed = match self.lister.list(ctx, selector).await {
            Ok(observed) => observed,
            Err(source) => {
                let err = InventoryError::Listing {
                    kind: K::kind_name(),
                    selector: selector.to_string(),
                    source,
                };
                self.sink.report_error(&err);
                return Err(err);
            }
        };
        check_preconditions("observed", &observed);

        let plan = diff(observed, desired);
        info!(
            "{} in {}: {} to create, {} to update, {} to delete",
            K::kind_name(),
            selector,
            plan.to_create.len(),
            plan.to_update.len(),
            plan.to_delete.len()
        );
        Ok(plan)
    }
}

fn pass_span<K: InventoryResource>(name: &'static str, selector: &Selector) -> Span {
    info_span!(
        "reconcile",
        pass = name,
        reconcile_id = %Uuid::new_v4(),
        kind = %K::kind_name(),
        namespace = %selector.namespace,
        selector = %selector.label_selector(),
        otel.status_code = Empty,
        error = Empty,
    )
}

/// Sets the OpenTelemetry status fields of a pass span.
fn mark_failed(span: &Span, err: &InventoryError) {
    span.record("otel.status_code", "ERROR");
    span.record("error", tracing::field::display(err));
}

/// Logs duplicate and malformed keys. The differ still handles them
/// deterministically (last write wins).
fn check_preconditions<K: InventoryResource>(collection: &str, objs: &[K]) {
    for key in duplicate_keys(objs) {
        warn!(
            "Duplicate key {} in {} {} collection; the last occurrence wins",
            key,
            collection,
            K::kind_name()
        );
    }
    for key in objs.iter().map(|obj| obj.key()).filter(|key| !key.is_well_formed()) {
        warn!("Malformed key {:?} in {} {} collection", key, collection, K::kind_name());
    }
}
