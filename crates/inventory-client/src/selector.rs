//! Label selectors for listing managed resources
//!
//! Managed objects are found by namespace plus the instance and managed-by
//! labels stamped on every object this controller creates.

use std::collections::BTreeMap;
use std::fmt;

/// Label carrying the name of the owning tracing deployment instance.
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
/// Label naming the controller that manages the object.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
/// Default value of [`MANAGED_BY_LABEL`].
pub const DEFAULT_MANAGER: &str = "jaeger-operator";

/// Namespace plus an equality-based label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Namespace to list in
    pub namespace: String,
    /// Labels that must all be present with the given values
    pub labels: BTreeMap<String, String>,
}

impl Selector {
    /// Creates a selector with no label constraints.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Selector for all objects of `instance` managed by the default manager.
    pub fn for_instance(namespace: impl Into<String>, instance: impl Into<String>) -> Self {
        Self::for_instance_managed_by(namespace, instance, DEFAULT_MANAGER)
    }

    /// Selector for all objects of `instance` managed by `manager`.
    pub fn for_instance_managed_by(
        namespace: impl Into<String>,
        instance: impl Into<String>,
        manager: impl Into<String>,
    ) -> Self {
        Self::new(namespace)
            .with_label(INSTANCE_LABEL, instance)
            .with_label(MANAGED_BY_LABEL, manager)
    }

    /// Adds a label constraint.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Renders the labels in API server syntax (`k=v,k=v`, sorted by key).
    pub fn label_selector(&self) -> String {
        self.labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether `labels` satisfies every constraint of this selector.
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.labels.iter().all(|(k, v)| {
            labels
                .and_then(|labels| labels.get(k))
                .is_some_and(|actual| actual == v)
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.namespace, self.label_selector())
    }
}
