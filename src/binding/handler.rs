//! # Secret Handler
//!
//! Materializes the secret of a deployment target and keeps its ownership
//! metadata current.
//!
//! ## Races
//!
//! The handler takes no locks. Two interleavings with concurrent writers are
//! resolved by switching to the opposite code path:
//!
//! - create fails because the name already exists: update the existing secret
//! - update fails because the secret disappeared: create it again
//!
//! Each switch is taken at most once per [`SecretHandler::sync`] call. If the
//! same race hits again after its fallback the error is returned, and the next
//! reconciliation is expected to settle it.

use super::{
    name_corresponds, DeploymentTarget, ListFailure, MarkerError, ObjectMarker, SecretData,
    SecretDataProvider, StoreError, SyncError,
};
use crate::constants::DEFAULT_GENERATE_NAME_SUFFIX;
use crate::crd::LinkableSecretSpec;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Creates, updates, detects staleness of, and lists the secrets of a single
/// deployment target. `K` is the key the data provider is queried with.
pub struct SecretHandler<K>
where
    K: Send + Sync,
{
    target: Arc<dyn DeploymentTarget>,
    marker: Arc<dyn ObjectMarker>,
    data_provider: Arc<dyn SecretDataProvider<K>>,
}

impl<K> std::fmt::Debug for SecretHandler<K>
where
    K: Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHandler")
            .field("target", &self.target.target_object_key())
            .field("target_type", &self.target.target_type())
            .field("namespace", &self.target.target_namespace())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Create,
    Update,
}

/// Failure of a single create or update attempt
#[derive(Debug)]
enum AttemptError {
    Store(StoreError),
    Marking(MarkerError),
}

/// Everything needed to write the secret, computed once per sync
struct DesiredSecret<'a> {
    name: String,
    generate_name: String,
    spec: &'a LinkableSecretSpec,
    data: SecretData,
}

impl<K> SecretHandler<K>
where
    K: Send + Sync,
{
    pub fn new(
        target: Arc<dyn DeploymentTarget>,
        marker: Arc<dyn ObjectMarker>,
        data_provider: Arc<dyn SecretDataProvider<K>>,
    ) -> Self {
        Self {
            target,
            marker,
            data_provider,
        }
    }

    /// Detect whether the secret previously materialized for the target no
    /// longer corresponds to the target spec.
    ///
    /// Returns the stale secret so the caller can clean it up, or `None` if
    /// there is nothing stale (no previous secret, the name still matches, or
    /// the previous secret is already gone).
    pub async fn get_stale(&self) -> Result<Option<Secret>, SyncError> {
        let Some(existing_name) = self.target.actual_secret_name().filter(|n| !n.is_empty())
        else {
            return Ok(None);
        };

        let spec = self.target.spec();
        if name_corresponds(existing_name, &spec.name, &spec.generate_name) {
            return Ok(None);
        }

        let namespace = self.target.target_namespace();
        match self.target.client().get(namespace, existing_name).await {
            Ok(secret) => {
                info!(
                    target_key = %self.target.target_object_key(),
                    target_type = self.target.target_type(),
                    namespace,
                    secret = existing_name,
                    "secret no longer corresponds to the target spec"
                );
                metrics::increment_stale_secrets();
                Ok(Some(secret))
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    namespace,
                    secret = existing_name,
                    "previous secret already gone, nothing stale"
                );
                Ok(None)
            }
            Err(source) => Err(SyncError::StaleDetection {
                target: self.target.target_object_key().clone(),
                target_type: self.target.target_type().to_string(),
                namespace: namespace.to_string(),
                secret_name: existing_name.to_string(),
                source,
            }),
        }
    }

    /// Create or update the target secret with the data obtained for `key`.
    ///
    /// `recreate` ignores the name of the previously materialized secret and
    /// writes the secret under the name from the RemoteSecret spec, which is how stale
    /// secrets (see [`SecretHandler::get_stale`]) are replaced.
    pub async fn sync(&self, key: &K, recreate: bool) -> Result<Secret, SyncError> {
        let start = Instant::now();
        let result = self.sync_secret(key, recreate).await;
        metrics::observe_sync_duration(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::increment_sync_errors(e.reason().as_str());
        }
        result
    }

    async fn sync_secret(&self, key: &K, recreate: bool) -> Result<Secret, SyncError> {
        let data = self
            .data_provider
            .get_data(key)
            .await
            .map_err(|source| SyncError::DataFetch {
                target: self.target.target_object_key().clone(),
                target_type: self.target.target_type().to_string(),
                source,
            })?;

        let spec = self.target.spec();

        let name = match self.target.actual_secret_name() {
            Some(actual) if !recreate && !actual.is_empty() => actual.to_string(),
            _ => spec.name.clone(),
        };

        let generate_name = if spec.generate_name.is_empty() {
            format!(
                "{}{}",
                self.target.target_object_key().name,
                DEFAULT_GENERATE_NAME_SUFFIX
            )
        } else {
            spec.generate_name.clone()
        };

        let desired = DesiredSecret {
            name,
            generate_name,
            spec,
            data,
        };

        // Without a name there is nothing to update, the store generates one
        let first = if desired.name.is_empty() {
            Attempt::Create
        } else {
            Attempt::Update
        };

        self.materialize(&desired, first)
            .await
            .map_err(|e| self.attempt_error(e))
    }

    async fn materialize(
        &self,
        desired: &DesiredSecret<'_>,
        first: Attempt,
    ) -> Result<Secret, AttemptError> {
        let mut attempt = first;
        let mut exists_fallback_taken = false;
        let mut gone_fallback_taken = false;

        loop {
            let result = match attempt {
                Attempt::Create => self.create_target_secret(desired).await,
                Attempt::Update => self.update_target_secret(desired).await,
            };

            match (attempt, result) {
                (_, Ok(secret)) => return Ok(secret),
                (Attempt::Create, Err(AttemptError::Store(e)))
                    if e.is_already_exists()
                        && !desired.name.is_empty()
                        && !exists_fallback_taken =>
                {
                    warn!(
                        namespace = self.target.target_namespace(),
                        secret = %desired.name,
                        "secret created concurrently, updating it instead"
                    );
                    metrics::increment_sync_fallbacks("create");
                    exists_fallback_taken = true;
                    attempt = Attempt::Update;
                }
                (Attempt::Update, Err(AttemptError::Store(e)))
                    if e.is_not_found() && !gone_fallback_taken =>
                {
                    warn!(
                        namespace = self.target.target_namespace(),
                        secret = %desired.name,
                        "secret not found for update, creating it instead"
                    );
                    metrics::increment_sync_fallbacks("update");
                    gone_fallback_taken = true;
                    attempt = Attempt::Create;
                }
                (_, Err(e)) => return Err(e),
            }
        }
    }

    async fn create_target_secret(
        &self,
        desired: &DesiredSecret<'_>,
    ) -> Result<Secret, AttemptError> {
        let namespace = self.target.target_namespace();
        let spec = desired.spec;

        let mut secret = Secret {
            metadata: ObjectMeta {
                name: (!desired.name.is_empty()).then(|| desired.name.clone()),
                generate_name: Some(desired.generate_name.clone()),
                namespace: Some(namespace.to_string()),
                labels: non_empty(&spec.labels),
                annotations: non_empty(&spec.annotations),
                ..ObjectMeta::default()
            },
            data: Some(desired.data.clone()),
            type_: spec.r#type.clone(),
            ..Secret::default()
        };

        // Ownership is part of the create request, so the secret never exists unmarked
        self.marker
            .mark_managed(self.target.target_object_key(), &mut secret.metadata)
            .map_err(AttemptError::Marking)?;

        let created = self
            .target
            .client()
            .create(namespace, &secret)
            .await
            .map_err(AttemptError::Store)?;

        metrics::increment_sync_operations("create");
        info!(
            target_key = %self.target.target_object_key(),
            target_type = self.target.target_type(),
            namespace,
            secret = created.metadata.name.as_deref().unwrap_or_default(),
            "created target secret"
        );
        Ok(created)
    }

    async fn update_target_secret(
        &self,
        desired: &DesiredSecret<'_>,
    ) -> Result<Secret, AttemptError> {
        let namespace = self.target.target_namespace();
        let client = self.target.client();
        let spec = desired.spec;

        let mut secret = client
            .get(namespace, &desired.name)
            .await
            .map_err(AttemptError::Store)?;

        // Desired keys overwrite, everything else on the secret is left in place
        merge_into(&mut secret.metadata.labels, &spec.labels);
        merge_into(&mut secret.metadata.annotations, &spec.annotations);
        secret
            .data
            .get_or_insert_with(BTreeMap::new)
            .extend(desired.data.iter().map(|(k, v)| (k.clone(), v.clone())));

        let took_over = self
            .marker
            .mark_managed(self.target.target_object_key(), &mut secret.metadata)
            .map_err(AttemptError::Marking)?;
        if took_over {
            debug!(
                namespace,
                secret = %desired.name,
                "ownership metadata of the secret changed"
            );
        }

        let updated = client
            .update(namespace, &secret)
            .await
            .map_err(AttemptError::Store)?;

        metrics::increment_sync_operations("update");
        debug!(
            target_key = %self.target.target_object_key(),
            namespace,
            secret = %desired.name,
            "updated target secret"
        );
        Ok(updated)
    }

    /// List the secrets in the target namespace managed by this target's owner.
    ///
    /// Fails as a whole if the ownership of any candidate cannot be determined.
    pub async fn list(&self) -> Result<Vec<Secret>, SyncError> {
        let owner = self.target.target_object_key();
        let namespace = self.target.target_namespace();

        let filter = self
            .marker
            .list_managed_options(owner)
            .map_err(|e| self.list_error(ListFailure::Options(e)))?;

        let candidates = self
            .target
            .client()
            .list(namespace, &filter)
            .await
            .map_err(|e| self.list_error(ListFailure::Store(e)))?;

        debug!(
            target_type = self.target.target_type(),
            target_key = %owner,
            namespace,
            selector = %filter.label_selector(),
            candidates = candidates.len(),
            "listing secrets managed by target"
        );

        let mut managed = Vec::with_capacity(candidates.len());
        for secret in candidates {
            let is_managed = self
                .marker
                .is_managed_by(owner, &secret.metadata)
                .map_err(|source| {
                    self.list_error(ListFailure::Ownership {
                        secret: format!(
                            "{}/{}",
                            namespace,
                            secret.metadata.name.as_deref().unwrap_or_default()
                        ),
                        source,
                    })
                })?;
            if is_managed {
                managed.push(secret);
            }
        }

        metrics::increment_list();
        Ok(managed)
    }

    fn attempt_error(&self, err: AttemptError) -> SyncError {
        let target = self.target.target_object_key().clone();
        let target_type = self.target.target_type().to_string();
        match err {
            AttemptError::Store(source) => SyncError::SecretUpdate {
                target,
                target_type,
                source,
            },
            AttemptError::Marking(source) => SyncError::Marking {
                target,
                target_type,
                source,
            },
        }
    }

    fn list_error(&self, source: ListFailure) -> SyncError {
        SyncError::List {
            target: self.target.target_object_key().clone(),
            target_type: self.target.target_type().to_string(),
            source,
        }
    }
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}

fn merge_into(existing: &mut Option<BTreeMap<String, String>>, desired: &BTreeMap<String, String>) {
    if desired.is_empty() {
        return;
    }
    existing
        .get_or_insert_with(BTreeMap::new)
        .extend(desired.iter().map(|(k, v)| (k.clone(), v.clone())));
}
