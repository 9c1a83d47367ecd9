//! # Secret Store
//!
//! The object store the handler materializes secrets into.
//!
//! [`KubeSecretStore`] talks to a Kubernetes API server. Every request is a
//! single call carrying a fully prepared object; concurrent writers are
//! arbitrated by the API server's resourceVersion checks only.

use super::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams, ObjectMeta, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Coarse label-equality filter evaluated by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub match_labels: BTreeMap<String, String>,
}

impl ListFilter {
    #[must_use]
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.match_labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Kubernetes label selector (`k1=v1,k2=v2`)
    #[must_use]
    pub fn label_selector(&self) -> String {
        self.match_labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Client-side evaluation of the filter
    #[must_use]
    pub fn matches(&self, meta: &ObjectMeta) -> bool {
        self.match_labels.iter().all(|(k, v)| {
            meta.labels
                .as_ref()
                .and_then(|labels| labels.get(k))
                .is_some_and(|actual| actual == v)
        })
    }
}

/// Connected client of the object store holding the target secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret by name
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;

    /// Create a secret, returning it as stored (with the server-assigned name
    /// when only `generateName` was set)
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError>;

    /// Replace an existing secret. The write is rejected with
    /// [`StoreError::Conflict`] when the secret changed since it was read.
    async fn update(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError>;

    /// List the secrets in a namespace matching the filter
    async fn list(&self, namespace: &str, filter: &ListFilter) -> Result<Vec<Secret>, StoreError>;
}

/// [`SecretStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    timeout: Duration,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Run a single API request, abandoning it once `timeout` elapses
async fn with_timeout<T, F>(timeout: Duration, request: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, kube::Error>> + Send,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_elapsed) => Err(StoreError::Timeout(timeout)),
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        debug!(namespace, name, "getting secret");
        with_timeout(self.timeout, self.api(namespace).get(name)).await
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        debug!(
            namespace,
            name = secret.metadata.name.as_deref(),
            generate_name = secret.metadata.generate_name.as_deref(),
            "creating secret"
        );
        let api = self.api(namespace);
        with_timeout(self.timeout, api.create(&PostParams::default(), secret))
            .await
    }

    async fn update(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let name = secret
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| StoreError::Other("cannot update a secret without a name".to_string()))?;
        debug!(namespace, name, "updating secret");
        let api = self.api(namespace);
        with_timeout(self.timeout, api.replace(name, &PostParams::default(), secret))
            .await
    }

    async fn list(&self, namespace: &str, filter: &ListFilter) -> Result<Vec<Secret>, StoreError> {
        let selector = filter.label_selector();
        debug!(namespace, selector = %selector, "listing secrets");
        let params = if selector.is_empty() {
            ListParams::default()
        } else {
            ListParams::default().labels(&selector)
        };
        let api = self.api(namespace);
        let list = with_timeout(self.timeout, api.list(&params)).await?;
        Ok(list.items)
    }
}
