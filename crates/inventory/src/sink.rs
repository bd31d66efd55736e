//! Observability sinks.
//!
//! The executor emits one [`ApplyEvent`] per backend call and reports the
//! error that ends a pass. Where those go is up to the injected sink:
//! tracing, Prometheus counters, both, or nowhere.

use crate::diff::Phase;
use crate::error::InventoryError;
use crate::key::ResourceKey;
use chrono::{DateTime, Utc};
use prometheus::{IntCounterVec, Opts, Registry};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Span, debug, error};

/// Result of one backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The backend accepted the call
    Applied,
    /// The backend rejected the call
    Failed,
}

impl Outcome {
    /// Lowercase name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::Failed => "failed",
        }
    }
}

/// Structured record of one apply operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyEvent {
    /// Kind of the resource (e.g. `Service`)
    pub kind: String,
    /// Resource key
    pub key: ResourceKey,
    /// Operation issued
    pub phase: Phase,
    /// What the backend answered
    pub outcome: Outcome,
    /// When the call completed
    pub at: DateTime<Utc>,
}

impl ApplyEvent {
    /// Creates an event stamped with the current time.
    pub fn new(kind: impl Into<String>, key: ResourceKey, phase: Phase, outcome: Outcome) -> Self {
        Self {
            kind: kind.into(),
            key,
            phase,
            outcome,
            at: Utc::now(),
        }
    }
}

/// Receives apply events and pass-ending errors.
pub trait ObservabilitySink: Send + Sync {
    /// Called once per backend write call.
    fn record(&self, event: &ApplyEvent);

    /// Called once with the error that ended a pass.
    fn report_error(&self, error: &InventoryError);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {
    fn record(&self, _event: &ApplyEvent) {}

    fn report_error(&self, _error: &InventoryError) {}
}

/// Sink writing `tracing` events.
///
/// This is the only place the engine logs a pass-ending error. The error is
/// also recorded on the current span's `otel.status_code` and `error` fields:
/// the `apply` span for apply failures, the `reconcile` span for listing
/// failures. The reconciler marks its own pass span either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, event: &ApplyEvent) {
        debug!(
            "{} {} {}: {}",
            event.phase,
            event.kind,
            event.key,
            event.outcome.as_str()
        );
    }

    fn report_error(&self, error: &InventoryError) {
        let span = Span::current();
        span.record("otel.status_code", "ERROR");
        span.record("error", tracing::field::display(error));
        error!("{}", error);
    }
}

/// Sink counting operations in Prometheus.
#[derive(Debug, Clone)]
pub struct PrometheusSink {
    operations: IntCounterVec,
    failures: IntCounterVec,
}

impl PrometheusSink {
    /// Creates the counters and registers them with `registry`.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let operations = IntCounterVec::new(
            Opts::new(
                "inventory_apply_operations_total",
                "Backend write calls issued by the inventory executor",
            ),
            &["kind", "phase", "outcome"],
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "inventory_apply_failures_total",
                "Reconciliation passes that ended in an error, by stage",
            ),
            &["phase"],
        )?;
        registry.register(Box::new(operations.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        Ok(Self { operations, failures })
    }

    /// Current value of the operations counter for the given labels.
    pub fn operations(&self, kind: &str, phase: Phase, outcome: Outcome) -> u64 {
        self.operations
            .with_label_values(&[kind, phase.as_str(), outcome.as_str()])
            .get()
    }

    /// Current value of the failures counter for a stage (`list` or a phase).
    pub fn failures(&self, stage: &str) -> u64 {
        self.failures.with_label_values(&[stage]).get()
    }
}

impl ObservabilitySink for PrometheusSink {
    fn record(&self, event: &ApplyEvent) {
        self.operations
            .with_label_values(&[event.kind.as_str(), event.phase.as_str(), event.outcome.as_str()])
            .inc();
    }

    fn report_error(&self, error: &InventoryError) {
        self.failures.with_label_values(&[error.stage()]).inc();
    }
}

impl<A, B> ObservabilitySink for (A, B)
where
    A: ObservabilitySink,
    B: ObservabilitySink,
{
    fn record(&self, event: &ApplyEvent) {
        self.0.record(event);
        self.1.record(event);
    }

    fn report_error(&self, error: &InventoryError) {
        self.0.report_error(error);
        self.1.report_error(error);
    }
}

impl<S> ObservabilitySink for Arc<S>
where
    S: ObservabilitySink + ?Sized,
{
    fn record(&self, event: &ApplyEvent) {
        (**self).record(event);
    }

    fn report_error(&self, error: &InventoryError) {
        (**self).report_error(error);
    }
}

/// Sink keeping everything in memory (for tests)
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<ApplyEvent>>,
    errors: std::sync::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<ApplyEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Rendered errors reported so far
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ObservabilitySink for RecordingSink {
    fn record(&self, event: &ApplyEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn report_error(&self, error: &InventoryError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
