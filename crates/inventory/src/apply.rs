//! Apply executor.
//!
//! Issues the operations of a [`DiffResult`] against a backend writer: all
//! creates, then all updates, then all deletes, one call at a time. The first
//! failure ends the pass; operations already issued are not rolled back.

use crate::diff::{DiffResult, Phase};
use crate::error::InventoryError;
use crate::key::ResourceKey;
use crate::resource::InventoryResource;
use crate::sink::{ApplyEvent, ObservabilitySink, Outcome};
use inventory_client::{CallContext, ClientError, ResourceWriter};
use serde::Serialize;
use tracing::field::Empty;
use tracing::{Instrument, debug, info_span};

/// Progress of one apply call.
///
/// `Start → Creating → Updating → Deleting → Done`; any phase may move to
/// `Failed`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplyState {
    /// Nothing issued yet
    Start,
    /// Issuing creates
    Creating,
    /// Issuing updates
    Updating,
    /// Issuing deletes
    Deleting,
    /// Every operation succeeded
    Done,
    /// An operation failed or the context ended
    Failed,
}

impl ApplyState {
    /// The state in which `phase` operations are issued.
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Create => ApplyState::Creating,
            Phase::Update => ApplyState::Updating,
            Phase::Delete => ApplyState::Deleting,
        }
    }

    /// Whether the call has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplyState::Done | ApplyState::Failed)
    }

    /// Whether `self → next` is a legal edge.
    pub fn can_transition_to(self, next: ApplyState) -> bool {
        use ApplyState::{Creating, Deleting, Done, Failed, Start, Updating};
        matches!(
            (self, next),
            (Start, Creating)
                | (Creating, Updating)
                | (Updating, Deleting)
                | (Deleting, Done)
                | (Creating | Updating | Deleting, Failed)
        )
    }
}

/// Counts of operations applied by a successful call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Resources created
    pub created: usize,
    /// Resources updated
    pub updated: usize,
    /// Resources deleted
    pub deleted: usize,
}

impl ApplyReport {
    fn count(&mut self, phase: Phase) {
        match phase {
            Phase::Create => self.created += 1,
            Phase::Update => self.updated += 1,
            Phase::Delete => self.deleted += 1,
        }
    }

    /// Total operations applied.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Applies diff results through a writer, reporting to a sink.
///
/// The executor holds no state between calls; one executor can apply results
/// of any kind the writer supports.
pub struct Executor<'a, W: ?Sized, S: ?Sized> {
    writer: &'a W,
    sink: &'a S,
}

impl<W: ?Sized, S: ?Sized> std::fmt::Debug for Executor<'_, W, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

impl<'a, W, S> Executor<'a, W, S>
where
    W: ?Sized,
    S: ObservabilitySink + ?Sized,
{
    /// Creates an executor over `writer` reporting to `sink`.
    pub fn new(writer: &'a W, sink: &'a S) -> Self {
        Self { writer, sink }
    }

    /// Applies `plan` in create → update → delete order.
    ///
    /// Stops at the first failure, or before the next operation once `ctx` is
    /// cancelled or past its deadline, and returns the phase and key of the
    /// operation that did not complete. Never retries.
    pub async fn apply<K>(
        &self,
        ctx: &CallContext,
        plan: &DiffResult<K>,
    ) -> Result<ApplyReport, InventoryError>
    where
        K: InventoryResource,
        W: ResourceWriter<K>,
    {
        let span = info_span!(
            "apply",
            kind = %K::kind_name(),
            operations = plan.len(),
            otel.status_code = Empty,
            error = Empty,
        );
        self.apply_in_order(ctx, plan).instrument(span).await
    }

    async fn apply_in_order<K>(
        &self,
        ctx: &CallContext,
        plan: &DiffResult<K>,
    ) -> Result<ApplyReport, InventoryError>
    where
        K: InventoryResource,
        W: ResourceWriter<K>,
    {
        let kind = K::kind_name();
        let mut state = ApplyState::Start;
        let mut report = ApplyReport::default();

        for phase in Phase::ORDER {
            transition(&mut state, ApplyState::for_phase(phase));

            for obj in plan.for_phase(phase) {
                let key = obj.key();
                if let Err(source) = ctx.check() {
                    return Err(self.fail(&mut state, phase, &kind, key, source));
                }

                debug!("{} {} {}", phase, kind, key);
                match self.issue(ctx, phase, obj).await {
                    Ok(()) => {
                        self.sink
                            .record(&ApplyEvent::new(kind.as_str(), key, phase, Outcome::Applied));
                        report.count(phase);
                    }
                    Err(source) => {
                        self.sink.record(&ApplyEvent::new(
                            kind.as_str(),
                            key.clone(),
                            phase,
                            Outcome::Failed,
                        ));
                        return Err(self.fail(&mut state, phase, &kind, key, source));
                    }
                }
            }
        }

        transition(&mut state, ApplyState::Done);
        Ok(report)
    }

    async fn issue<K>(&self, ctx: &CallContext, phase: Phase, obj: &K) -> Result<(), ClientError>
    where
        K: InventoryResource,
        W: ResourceWriter<K>,
    {
        match phase {
            Phase::Create => self.writer.create(ctx, obj).await,
            Phase::Update => self.writer.update(ctx, obj).await,
            Phase::Delete => self.writer.delete(ctx, obj).await,
        }
    }

    fn fail(
        &self,
        state: &mut ApplyState,
        phase: Phase,
        kind: &str,
        key: ResourceKey,
        source: ClientError,
    ) -> InventoryError {
        transition(state, ApplyState::Failed);
        let err = InventoryError::Apply {
            phase,
            kind: kind.to_string(),
            key,
            source,
        };
        self.sink.report_error(&err);
        err
    }
}

fn transition(state: &mut ApplyState, next: ApplyState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal apply transition {:?} -> {:?}",
        state,
        next
    );
    debug!("Apply state {:?} -> {:?}", state, next);
    *state = next;
}

#[cfg(test)]
#[path = "apply_test.rs"]
mod apply_test;
