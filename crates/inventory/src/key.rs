//! Resource identity.

use kube::Resource;
use serde::Serialize;
use std::fmt;

/// Stable identity of a resource: (namespace, name).
///
/// Ordering is lexicographic by namespace, then name. Every result set the
/// differ produces is sorted by this ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceKey {
    /// Namespace (empty when the object carries none)
    pub namespace: String,
    /// Object name (empty when the object carries none)
    pub name: String,
}

impl ResourceKey {
    /// Creates a key from its parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reads the key from an object's metadata.
    ///
    /// Missing fields become empty strings; see [`ResourceKey::is_well_formed`].
    pub fn of<K: Resource>(obj: &K) -> Self {
        let meta = obj.meta();
        Self {
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
        }
    }

    /// Whether both namespace and name are non-empty.
    ///
    /// The differ assumes well-formed keys and does not check them; callers
    /// building collections are responsible for this.
    pub fn is_well_formed(&self) -> bool {
        !self.namespace.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
