//! Mock backend for unit testing
//!
//! This module provides an in-memory implementation of [`ResourceLister`] and
//! [`ResourceWriter`] that behaves like the API server for the parts the engine
//! relies on: create rejects existing objects, update and delete reject
//! missing ones, and updates are guarded by the resource version.
//!
//! Every call is recorded so tests can assert the exact sequence issued, and
//! a failure can be injected on the n-th write or on listing.

use crate::client_trait::{ResourceLister, ResourceWriter};
use crate::context::CallContext;
use crate::error::ClientError;
use crate::selector::Selector;
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Kind of call recorded by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVerb {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// What was called
    pub verb: MockVerb,
    /// Namespace of the object (or of the selector for `list`)
    pub namespace: String,
    /// Name of the object (empty for `list`)
    pub name: String,
}

impl MockCall {
    /// Shorthand used by tests to build the expected sequence.
    pub fn new(verb: MockVerb, namespace: &str, name: &str) -> Self {
        Self {
            verb,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Error produced by an injected failure.
#[derive(Debug, Clone)]
pub enum FailureMode {
    /// Fail with `ClientError::NotFound`
    NotFound,
    /// Fail with `ClientError::Conflict`
    Conflict,
    /// Fail with `ClientError::InvalidRequest` carrying the message
    Rejected(String),
}

impl FailureMode {
    fn into_error(self, what: &str) -> ClientError {
        match self {
            FailureMode::NotFound => ClientError::NotFound(format!("{} not found", what)),
            FailureMode::Conflict => ClientError::Conflict(format!("{} was modified", what)),
            FailureMode::Rejected(msg) => ClientError::InvalidRequest(msg),
        }
    }
}

type ObjectKey = (String, String);

/// Mock backend for testing
///
/// Clones share the same store, call log and failure plan.
#[derive(Clone)]
pub struct MockClient<K> {
    pub(crate) objects: Arc<Mutex<BTreeMap<ObjectKey, K>>>,
    pub(crate) calls: Arc<Mutex<Vec<MockCall>>>,
    pub(crate) writes: Arc<Mutex<usize>>,
    pub(crate) fail_on_write: Arc<Mutex<Option<(usize, FailureMode)>>>,
    pub(crate) fail_list: Arc<Mutex<Option<FailureMode>>>,
    pub(crate) next_version: Arc<Mutex<u64>>,
}

impl<K> Default for MockClient<K> {
    fn default() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(0)),
            fail_on_write: Arc::new(Mutex::new(None)),
            fail_list: Arc::new(Mutex::new(None)),
            next_version: Arc::new(Mutex::new(1)),
        }
    }
}

impl<K> std::fmt::Debug for MockClient<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClient")
            .field("objects", &self.objects.lock().unwrap().len())
            .field("calls", &self.calls.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl<K> MockClient<K>
where
    K: Resource + Clone,
{
    /// Create an empty mock backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the store as-is (for test setup, not recorded)
    ///
    /// The object keeps whatever resource version it carries; objects without
    /// one are assigned the next version.
    pub fn insert(&self, mut obj: K) {
        if obj.meta().resource_version.is_none() {
            obj.meta_mut().resource_version = Some(self.bump_version());
        }
        let key = object_key(&obj);
        self.objects.lock().unwrap().insert(key, obj);
    }

    /// Get a stored object by namespace and name
    pub fn get(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// All stored objects, sorted by namespace and name
    pub fn objects(&self) -> Vec<K> {
        self.objects.lock().unwrap().values().cloned().collect()
    }

    /// Calls issued so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Write calls issued so far, in order
    pub fn write_calls(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.verb != MockVerb::List)
            .collect()
    }

    /// Make the `n`-th write call (1-based, counted across create/update/delete) fail
    pub fn fail_on_write(&self, n: usize, mode: FailureMode) {
        *self.fail_on_write.lock().unwrap() = Some((n, mode));
    }

    /// Make every `list` call fail
    pub fn fail_list(&self, mode: FailureMode) {
        *self.fail_list.lock().unwrap() = Some(mode);
    }

    fn bump_version(&self) -> String {
        let mut next = self.next_version.lock().unwrap();
        let current = *next;
        *next += 1;
        current.to_string()
    }

    fn record(&self, verb: MockVerb, namespace: &str, name: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(MockCall::new(verb, namespace, name));
    }

    /// Records a write and returns the injected failure, if this is the one.
    fn begin_write(&self, verb: MockVerb, obj: &K) -> Result<ObjectKey, ClientError> {
        let key = object_key(obj);
        self.record(verb, &key.0, &key.1);

        let mut writes = self.writes.lock().unwrap();
        *writes += 1;
        let fail = self.fail_on_write.lock().unwrap().clone();
        if let Some((n, mode)) = fail {
            if n == *writes {
                return Err(mode.into_error(&format!("{}/{}", key.0, key.1)));
            }
        }
        Ok(key)
    }
}

fn object_key<K: Resource>(obj: &K) -> ObjectKey {
    (
        obj.meta().namespace.clone().unwrap_or_default(),
        obj.meta().name.clone().unwrap_or_default(),
    )
}

#[async_trait::async_trait]
impl<K> ResourceLister<K> for MockClient<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    async fn list(&self, ctx: &CallContext, selector: &Selector) -> Result<Vec<K>, ClientError> {
        ctx.check()?;
        self.record(MockVerb::List, &selector.namespace, "");
        if let Some(mode) = self.fail_list.lock().unwrap().clone() {
            return Err(mode.into_error(&selector.to_string()));
        }
        let objects = self.objects.lock().unwrap();
        Ok(objects
            .iter()
            .filter(|((namespace, _), obj)| {
                *namespace == selector.namespace && selector.matches(obj.meta().labels.as_ref())
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl<K> ResourceWriter<K> for MockClient<K>
where
    K: Resource + Clone + Send + Sync + 'static,
{
    async fn create(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        ctx.check()?;
        let key = self.begin_write(MockVerb::Create, obj)?;
        if self.objects.lock().unwrap().contains_key(&key) {
            return Err(ClientError::Conflict(format!("{}/{} already exists", key.0, key.1)));
        }
        let mut stored = obj.clone();
        stored.meta_mut().resource_version = Some(self.bump_version());
        self.objects.lock().unwrap().insert(key, stored);
        Ok(())
    }

    async fn update(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        ctx.check()?;
        let key = self.begin_write(MockVerb::Update, obj)?;
        let mut objects = self.objects.lock().unwrap();
        let current = objects
            .get(&key)
            .ok_or_else(|| ClientError::NotFound(format!("{}/{} not found", key.0, key.1)))?;
        if obj.meta().resource_version != current.meta().resource_version {
            return Err(ClientError::Conflict(format!(
                "{}/{}: resource version {:?} does not match {:?}",
                key.0,
                key.1,
                obj.meta().resource_version,
                current.meta().resource_version
            )));
        }
        let mut stored = obj.clone();
        stored.meta_mut().resource_version = Some(self.bump_version());
        objects.insert(key, stored);
        Ok(())
    }

    async fn delete(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        ctx.check()?;
        let key = self.begin_write(MockVerb::Delete, obj)?;
        self.objects
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("{}/{} not found", key.0, key.1)))
    }
}
