//! Test utilities for unit testing the differ and executor
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use inventory_client::{MockCall, MockClient, MockVerb, Selector};
#[cfg(test)]
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Namespace every test service lives in
#[cfg(test)]
pub const TEST_NAMESPACE: &str = "observability";

/// Instance name every test service is labelled with
#[cfg(test)]
pub const TEST_INSTANCE: &str = "simplest";

/// Selector matching the labels of [`create_test_service`]
#[cfg(test)]
pub fn test_selector() -> Selector {
    Selector::for_instance(TEST_NAMESPACE, TEST_INSTANCE)
}

/// Helper to create a labelled test Service exposing a single port
#[cfg(test)]
pub fn create_test_service(name: &str, port: i32) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            labels: Some(test_selector().labels),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Helper to create a mock backend pre-populated with `services`
#[cfg(test)]
pub fn create_test_backend(services: Vec<Service>) -> MockClient<Service> {
    let backend = MockClient::new();
    for svc in services {
        backend.insert(svc);
    }
    backend
}

/// Helper to build an expected mock call for a test service
#[cfg(test)]
pub fn call(verb: MockVerb, name: &str) -> MockCall {
    MockCall::new(verb, TEST_NAMESPACE, name)
}

/// First port of a service
#[cfg(test)]
pub fn port_of(svc: &Service) -> i32 {
    svc.spec
        .as_ref()
        .and_then(|s| s.ports.as_ref())
        .and_then(|ports| ports.first())
        .map_or(0, |p| p.port)
}

/// Span fields recorded after creation, as (span name, field, value), plus a
/// count of `ERROR` events
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordedFields {
    records: std::sync::Arc<std::sync::Mutex<Vec<(String, String, String)>>>,
    error_events: std::sync::Arc<std::sync::Mutex<usize>>,
}

#[cfg(test)]
impl RecordedFields {
    /// Installs a subscriber capturing span records on the current thread
    pub fn capture() -> (Self, tracing::subscriber::DefaultGuard) {
        use tracing_subscriber::layer::SubscriberExt;

        let fields = Self::default();
        let subscriber = tracing_subscriber::registry().with(fields.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (fields, guard)
    }

    /// Last value recorded for `field` on a span named `span`
    pub fn get(&self, span: &str, field: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, f, _)| s == span && f == field)
            .map(|(_, _, value)| value.clone())
    }

    /// Number of `ERROR` level events logged so far
    pub fn error_events(&self) -> usize {
        *self.error_events.lock().unwrap()
    }
}

#[cfg(test)]
impl<S> tracing_subscriber::Layer<S> for RecordedFields
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor {
            span: span.name(),
            records: Vec::new(),
        };
        values.record(&mut visitor);
        self.records.lock().unwrap().extend(visitor.records);
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            *self.error_events.lock().unwrap() += 1;
        }
    }
}

#[cfg(test)]
struct FieldVisitor {
    span: &'static str,
    records: Vec<(String, String, String)>,
}

#[cfg(test)]
impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.records
            .push((self.span.to_string(), field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.records
            .push((self.span.to_string(), field.name().to_string(), format!("{:?}", value)));
    }
}
