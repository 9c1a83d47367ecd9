//! # Namespace Target
//!
//! A [`DeploymentTarget`] for a single namespace of the local cluster.

use crate::binding::{DeploymentTarget, ObjectKey, SecretStore};
use crate::constants::NAMESPACE_TARGET_TYPE;
use crate::crd::{LinkableSecretSpec, RemoteSecret, RemoteSecretTarget};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("the RemoteSecret has no name or namespace")]
    MissingIdentity,
    #[error("target {namespace} in cluster {api_url} is not a local namespace")]
    RemoteTarget { namespace: String, api_url: String },
}

pub struct NamespaceTarget {
    store: Arc<dyn SecretStore>,
    spec: LinkableSecretSpec,
    namespace: String,
    owner: ObjectKey,
    actual_secret_name: Option<String>,
}

impl std::fmt::Debug for NamespaceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceTarget")
            .field("namespace", &self.namespace)
            .field("owner", &self.owner)
            .field("spec", &self.spec)
            .field("actual_secret_name", &self.actual_secret_name)
            .finish_non_exhaustive()
    }
}

impl NamespaceTarget {
    pub fn new(
        store: Arc<dyn SecretStore>,
        spec: LinkableSecretSpec,
        namespace: impl Into<String>,
        owner: ObjectKey,
    ) -> Self {
        Self {
            store,
            spec,
            namespace: namespace.into(),
            owner,
            actual_secret_name: None,
        }
    }

    /// Record the name of the secret a previous sync materialized
    #[must_use]
    pub fn with_actual_secret_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.actual_secret_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Target for one of the local `spec.targets` of a RemoteSecret.
    ///
    /// The previously materialized secret name is taken from the matching
    /// `status.targets` entry.
    pub fn from_remote_secret(
        store: Arc<dyn SecretStore>,
        remote_secret: &RemoteSecret,
        target: &RemoteSecretTarget,
    ) -> Result<Self, TargetError> {
        if !target.is_local() {
            return Err(TargetError::RemoteTarget {
                namespace: target.namespace.clone(),
                api_url: target.api_url.clone().unwrap_or_default(),
            });
        }

        let owner = ObjectKey::from_resource(remote_secret).ok_or(TargetError::MissingIdentity)?;

        let actual = remote_secret
            .status
            .as_ref()
            .and_then(|status| status.target(&target.namespace, None))
            .map(|t| t.secret_name.clone())
            .unwrap_or_default();

        Ok(Self::new(
            store,
            remote_secret.spec.secret.clone(),
            target.namespace.clone(),
            owner,
        )
        .with_actual_secret_name(actual))
    }
}

impl DeploymentTarget for NamespaceTarget {
    fn client(&self) -> &dyn SecretStore {
        self.store.as_ref()
    }

    fn spec(&self) -> &LinkableSecretSpec {
        &self.spec
    }

    fn target_namespace(&self) -> &str {
        &self.namespace
    }

    fn target_object_key(&self) -> &ObjectKey {
        &self.owner
    }

    fn actual_secret_name(&self) -> Option<&str> {
        self.actual_secret_name.as_deref()
    }

    fn target_type(&self) -> &str {
        NAMESPACE_TARGET_TYPE
    }
}
