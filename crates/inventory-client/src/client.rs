//! Kubernetes-backed implementation of the backend traits.

use crate::client_trait::{ResourceLister, ResourceWriter};
use crate::context::CallContext;
use crate::error::ClientError;
use crate::selector::Selector;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Backend client talking to the Kubernetes API server.
///
/// One client serves every namespaced kind; the typed `Api<K>` is built per
/// call from the object's namespace.
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl std::fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClient").finish_non_exhaustive()
    }
}

impl KubeClient {
    /// Wraps an existing Kubernetes client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the in-cluster or kubeconfig environment.
    pub async fn try_default() -> Result<Self, ClientError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    fn api_for<K>(&self, obj: &K) -> Result<(Api<K>, String), ClientError>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        let namespace = obj.namespace().ok_or_else(|| {
            ClientError::InvalidRequest(format!("{} has no namespace", obj.name_any()))
        })?;
        let name = obj.meta().name.clone().ok_or_else(|| {
            ClientError::InvalidRequest(format!("object in namespace {} has no name", namespace))
        })?;
        Ok((Api::namespaced(self.client.clone(), &namespace), name))
    }
}

#[async_trait::async_trait]
impl<K> ResourceLister<K> for KubeClient
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    K::DynamicType: Default,
{
    async fn list(&self, ctx: &CallContext, selector: &Selector) -> Result<Vec<K>, ClientError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &selector.namespace);
        let params = ListParams::default().labels(&selector.label_selector());

        debug!("Listing {} in {}", K::kind(&K::DynamicType::default()), selector);
        let list = ctx
            .run(async { api.list(&params).await.map_err(ClientError::from) })
            .await?;
        Ok(list.items)
    }
}

#[async_trait::async_trait]
impl<K> ResourceWriter<K> for KubeClient
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    K::DynamicType: Default,
{
    async fn create(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        let (api, _) = self.api_for(obj)?;
        ctx.run(async {
            api.create(&PostParams::default(), obj)
                .await
                .map_err(ClientError::from)
        })
        .await?;
        Ok(())
    }

    async fn update(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        let (api, name) = self.api_for(obj)?;
        ctx.run(async {
            api.replace(&name, &PostParams::default(), obj)
                .await
                .map_err(ClientError::from)
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, ctx: &CallContext, obj: &K) -> Result<(), ClientError> {
        let (api, name) = self.api_for(obj)?;
        ctx.run(async {
            api.delete(&name, &DeleteParams::default())
                .await
                .map_err(ClientError::from)
        })
        .await?;
        Ok(())
    }
}
