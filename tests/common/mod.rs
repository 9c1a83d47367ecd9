//! Common test utilities for the integration tests
//!
//! Provides an in-memory [`SecretStore`] emulating the parts of the API
//! server the handler relies on (generated names, resourceVersion conflicts)
//! plus one-shot hooks simulating concurrent writers and store failures.

#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use remote_secret_controller::binding::{
    ListFilter, ObjectKey, SecretData, SecretHandler, SecretStore, StoreError,
};
use remote_secret_controller::crd::LinkableSecretSpec;
use remote_secret_controller::namespacetarget::{NamespaceObjectMarker, NamespaceTarget};
use remote_secret_controller::provider::StaticDataProvider;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const TARGET_NAMESPACE: &str = "target-ns";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Create,
    Update,
    List,
}

pub type Objects = BTreeMap<(String, String), Secret>;

enum Hook {
    /// Mutate the stored objects before the operation runs
    Mutate(Box<dyn FnOnce(&mut Objects) + Send>),
    /// Fail the operation without touching the stored objects
    Fail(Box<dyn FnOnce() -> StoreError + Send>),
}

#[derive(Default)]
struct State {
    objects: Objects,
    hooks: VecDeque<(Op, Hook)>,
    resource_version: u64,
    generated: u64,
    calls: Vec<Op>,
}

impl State {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    /// Run the first pending hook registered for `op`
    fn run_hook(&mut self, op: Op) -> Result<(), StoreError> {
        self.calls.push(op);
        let Some(index) = self.hooks.iter().position(|(hook_op, _)| *hook_op == op) else {
            return Ok(());
        };
        let (_, hook) = self.hooks.remove(index).unwrap();
        match hook {
            Hook::Mutate(mutate) => {
                mutate(&mut self.objects);
                Ok(())
            }
            Hook::Fail(fail) => Err(fail()),
        }
    }
}

#[derive(Default)]
pub struct InMemorySecretStore {
    state: Mutex<State>,
}

impl InMemorySecretStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a secret as if it had been created by someone else
    pub fn insert(&self, mut secret: Secret) {
        let mut state = self.state.lock().unwrap();
        secret.metadata.namespace.get_or_insert_with(|| TARGET_NAMESPACE.to_string());
        secret.metadata.resource_version = Some(state.next_resource_version());
        let key = object_key(&secret.metadata);
        state.objects.insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    /// Operations performed so far, in order
    pub fn calls(&self) -> Vec<Op> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Mutate the stored objects right before the next `op`
    pub fn before_next<F>(&self, op: Op, mutate: F)
    where
        F: FnOnce(&mut Objects) + Send + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .hooks
            .push_back((op, Hook::Mutate(Box::new(mutate))));
    }

    /// Fail the next `op` with the given error
    pub fn fail_next<F>(&self, op: Op, error: F)
    where
        F: FnOnce() -> StoreError + Send + 'static,
    {
        self.state
            .lock()
            .unwrap()
            .hooks
            .push_back((op, Hook::Fail(Box::new(error))));
    }
}

fn object_key(meta: &ObjectMeta) -> (String, String) {
    (
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
    )
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.run_hook(Op::Get)?;
        state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{namespace}/{name}")))
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.run_hook(Op::Create)?;

        let mut created = secret.clone();
        let name = match secret.metadata.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                state.generated += 1;
                format!(
                    "{}{:05}",
                    secret.metadata.generate_name.as_deref().unwrap_or_default(),
                    state.generated
                )
            }
        };

        let key = (namespace.to_string(), name.clone());
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("{namespace}/{name}")));
        }

        created.metadata.name = Some(name);
        created.metadata.namespace = Some(namespace.to_string());
        created.metadata.resource_version = Some(state.next_resource_version());
        state.objects.insert(key, created.clone());
        Ok(created)
    }

    async fn update(&self, namespace: &str, secret: &Secret) -> Result<Secret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.run_hook(Op::Update)?;

        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        let Some(stored) = state.objects.get(&key) else {
            return Err(StoreError::NotFound(format!("{namespace}/{name}")));
        };

        if secret.metadata.resource_version.is_some()
            && secret.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(StoreError::Conflict(format!(
                "{namespace}/{name} was modified concurrently"
            )));
        }

        let mut updated = secret.clone();
        updated.metadata.resource_version = Some(state.next_resource_version());
        state.objects.insert(key, updated.clone());
        Ok(updated)
    }

    async fn list(&self, namespace: &str, filter: &ListFilter) -> Result<Vec<Secret>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.run_hook(Op::List)?;
        Ok(state
            .objects
            .values()
            .filter(|s| s.metadata.namespace.as_deref() == Some(namespace))
            .filter(|s| filter.matches(&s.metadata))
            .cloned()
            .collect())
    }
}

pub fn owner() -> ObjectKey {
    ObjectKey::new("team-a", "creds")
}

pub fn data(entries: &[(&str, &str)]) -> SecretData {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect()
}

pub fn bytes(value: &str) -> ByteString {
    ByteString(value.as_bytes().to_vec())
}

pub fn named_spec(name: &str) -> LinkableSecretSpec {
    LinkableSecretSpec {
        name: name.to_string(),
        ..LinkableSecretSpec::default()
    }
}

pub fn secret(name: &str, entries: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TARGET_NAMESPACE.to_string()),
            ..ObjectMeta::default()
        },
        data: Some(data(entries)),
        ..Secret::default()
    }
}

pub fn provider_with(key: ObjectKey, entries: &[(&str, &str)]) -> Arc<StaticDataProvider> {
    Arc::new(StaticDataProvider::new().with_data(key, data(entries)))
}

/// Handler for `owner()` deploying `spec` into [`TARGET_NAMESPACE`]
pub fn handler(
    store: &Arc<InMemorySecretStore>,
    spec: LinkableSecretSpec,
    actual_name: Option<&str>,
    provider: Arc<StaticDataProvider>,
) -> SecretHandler<ObjectKey> {
    handler_for(owner(), store, spec, actual_name, provider)
}

pub fn handler_for(
    owner: ObjectKey,
    store: &Arc<InMemorySecretStore>,
    spec: LinkableSecretSpec,
    actual_name: Option<&str>,
    provider: Arc<StaticDataProvider>,
) -> SecretHandler<ObjectKey> {
    let mut target = NamespaceTarget::new(store.clone(), spec, TARGET_NAMESPACE, owner);
    if let Some(name) = actual_name {
        target = target.with_actual_secret_name(name);
    }
    SecretHandler::new(
        Arc::new(target),
        Arc::new(NamespaceObjectMarker::new()),
        provider,
    )
}
