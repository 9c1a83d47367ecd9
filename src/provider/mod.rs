//! # Secret Data Providers
//!
//! Sources of the data written into target secrets.
//!
//! - [`StaticDataProvider`]: data held in memory, e.g. the `uploadData` of a RemoteSecret
//! - [`SecretSourceProvider`]: data copied from an existing source secret

use crate::binding::{ObjectKey, ProviderError, SecretData, SecretDataProvider, SecretStore};
use crate::crd::RemoteSecret;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroize;

/// Convert string values to secret bytes
#[must_use]
pub fn string_data(entries: &BTreeMap<String, String>) -> SecretData {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
        .collect()
}

/// Decode base64 encoded values into secret bytes
pub fn decode_base64_data(entries: &BTreeMap<String, String>) -> Result<SecretData, ProviderError> {
    entries
        .iter()
        .map(|(k, v)| {
            STANDARD
                .decode(v.trim())
                .map(|bytes| (k.clone(), ByteString(bytes)))
                .map_err(|e| ProviderError::Invalid(format!("value of '{k}' is not base64: {e}")))
        })
        .collect()
}

/// In-memory data per owner key.
///
/// The provider's own copies are wiped when it is dropped or an entry is
/// replaced. Data returned by `get_data` is an independent copy owned by the
/// caller and is not wiped.
#[derive(Default)]
pub struct StaticDataProvider {
    data: HashMap<ObjectKey, SecretData>,
}

impl std::fmt::Debug for StaticDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticDataProvider")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl StaticDataProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_data(mut self, key: ObjectKey, data: SecretData) -> Self {
        self.insert(key, data);
        self
    }

    /// Set the data of `key`, replacing any previous data
    pub fn insert(&mut self, key: ObjectKey, data: SecretData) {
        if let Some(mut previous) = self.data.insert(key, data) {
            wipe(&mut previous);
        }
    }

    /// Provider holding the `uploadData` of a RemoteSecret under its own key.
    ///
    /// Returns `None` if the RemoteSecret has no identity or no upload data.
    #[must_use]
    pub fn from_upload_data(remote_secret: &RemoteSecret) -> Option<Self> {
        let key = ObjectKey::from_resource(remote_secret)?;
        let upload = remote_secret.spec.upload_data.as_ref()?;
        Some(Self::new().with_data(key, string_data(upload)))
    }
}

impl Drop for StaticDataProvider {
    fn drop(&mut self) {
        for data in self.data.values_mut() {
            wipe(data);
        }
    }
}

fn wipe(data: &mut SecretData) {
    for value in data.values_mut() {
        value.0.zeroize();
    }
}

#[async_trait]
impl SecretDataProvider<ObjectKey> for StaticDataProvider {
    async fn get_data(&self, key: &ObjectKey) -> Result<SecretData, ProviderError> {
        self.data
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(key.to_string()))
    }
}

/// Copies the data of a source secret, addressed by its key
pub struct SecretSourceProvider {
    store: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for SecretSourceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSourceProvider").finish_non_exhaustive()
    }
}

impl SecretSourceProvider {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SecretDataProvider<ObjectKey> for SecretSourceProvider {
    async fn get_data(&self, key: &ObjectKey) -> Result<SecretData, ProviderError> {
        let source = match self.store.get(&key.namespace, &key.name).await {
            Ok(secret) => secret,
            Err(e) if e.is_not_found() => return Err(ProviderError::NotFound(key.to_string())),
            Err(e) => return Err(ProviderError::Store(e)),
        };

        // stringData takes precedence, as it does on the API server
        let mut data = source.data.unwrap_or_default();
        if let Some(string_entries) = source.string_data {
            data.extend(string_data(&string_entries));
        }

        debug!(source = %key, keys = data.len(), "read source secret data");
        Ok(data)
    }
}
