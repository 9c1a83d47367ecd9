//! Commonly used types, for glob import.

pub use crate::binding::{
    DeploymentTarget, ErrorReason, KubeSecretStore, ListFilter, MarkerError, ObjectKey,
    ObjectMarker, ProviderError, SecretData, SecretDataProvider, SecretHandler, SecretStore,
    StoreError, SyncError,
};
pub use crate::config::SyncConfig;
pub use crate::crd::{LinkableSecretSpec, RemoteSecret, RemoteSecretSpec, RemoteSecretTarget};
pub use crate::namespacetarget::{NamespaceObjectMarker, NamespaceTarget};
pub use crate::provider::{SecretSourceProvider, StaticDataProvider};
