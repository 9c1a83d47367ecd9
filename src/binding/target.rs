//! # Deployment Targets and Data Providers
//!
//! Collaborators the synchronization handler consumes.

use super::{ObjectKey, ProviderError, SecretStore};
use crate::crd::LinkableSecretSpec;
use async_trait::async_trait;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Contents of a secret: key to raw bytes
pub type SecretData = BTreeMap<String, ByteString>;

/// A place secrets are materialized in
pub trait DeploymentTarget: Send + Sync {
    /// Store client connected to the target cluster
    fn client(&self) -> &dyn SecretStore;

    /// Desired shape of the secret
    fn spec(&self) -> &LinkableSecretSpec;

    /// Namespace the secret lives in
    fn target_namespace(&self) -> &str;

    /// Identity of the owner this target belongs to
    fn target_object_key(&self) -> &ObjectKey;

    /// Name of the secret materialized by a previous sync, if any
    fn actual_secret_name(&self) -> Option<&str>;

    /// Diagnostic type of the target, used in errors and logs
    fn target_type(&self) -> &str;
}

/// Source of the secret data, looked up by a caller-defined key
#[async_trait]
pub trait SecretDataProvider<K>: Send + Sync
where
    K: Send + Sync,
{
    async fn get_data(&self, key: &K) -> Result<SecretData, ProviderError>;
}
