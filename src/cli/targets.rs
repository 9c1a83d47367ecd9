//! Commands running the synchronization handler over the local targets of a RemoteSecret.

use anyhow::{anyhow, bail, Context, Result};
use futures::future::join_all;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use remote_secret_controller::binding::{
    KubeSecretStore, ObjectKey, ObjectMarker, SecretDataProvider, SecretHandler, SecretStore,
    SyncError,
};
use remote_secret_controller::config::SyncConfig;
use remote_secret_controller::crd::{RemoteSecret, RemoteSecretStatus};
use remote_secret_controller::namespacetarget::{NamespaceObjectMarker, NamespaceTarget};
use remote_secret_controller::provider::{
    decode_base64_data, string_data, SecretSourceProvider, StaticDataProvider,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where `rsctl sync` takes the secret data from
#[derive(Debug)]
pub enum DataSource {
    /// The `uploadData` of the RemoteSecret
    UploadData,
    Secret(ObjectKey),
    /// Entries given on the command line
    Entries {
        literal: BTreeMap<String, String>,
        base64: BTreeMap<String, String>,
    },
}

impl DataSource {
    pub fn from_args(
        from_secret: Option<ObjectKey>,
        from_literal: Vec<(String, String)>,
        from_base64: Vec<(String, String)>,
    ) -> Self {
        if let Some(secret) = from_secret {
            DataSource::Secret(secret)
        } else if from_literal.is_empty() && from_base64.is_empty() {
            DataSource::UploadData
        } else {
            DataSource::Entries {
                literal: from_literal.into_iter().collect(),
                base64: from_base64.into_iter().collect(),
            }
        }
    }
}

type Handler = SecretHandler<ObjectKey>;

async fn fetch_remote_secret(client: Client, namespace: &str, name: &str) -> Result<RemoteSecret> {
    let api: Api<RemoteSecret> = Api::namespaced(client, namespace);
    api.get(name)
        .await
        .with_context(|| format!("Failed to get RemoteSecret '{namespace}/{name}'"))
}

/// One handler per local target, paired with the target namespace
fn local_handlers(
    remote_secret: &RemoteSecret,
    store: &Arc<dyn SecretStore>,
    provider: &Arc<dyn SecretDataProvider<ObjectKey>>,
) -> Result<Vec<(String, Handler)>> {
    let marker: Arc<dyn ObjectMarker> = Arc::new(NamespaceObjectMarker::new());
    let mut handlers = Vec::new();

    for target in &remote_secret.spec.targets {
        if !target.is_local() {
            println!(
                "⚠️  Skipping target '{}' in remote cluster '{}'",
                target.namespace,
                target.api_url.as_deref().unwrap_or_default()
            );
            continue;
        }
        let deployment = NamespaceTarget::from_remote_secret(Arc::clone(store), remote_secret, target)?;
        handlers.push((
            target.namespace.clone(),
            SecretHandler::new(Arc::new(deployment), Arc::clone(&marker), Arc::clone(provider)),
        ));
    }

    if handlers.is_empty() {
        bail!("RemoteSecret has no local targets");
    }
    Ok(handlers)
}

fn kube_store(client: Client, config: &SyncConfig) -> Arc<dyn SecretStore> {
    Arc::new(KubeSecretStore::new(client, config.request_timeout()))
}

fn no_data() -> Arc<dyn SecretDataProvider<ObjectKey>> {
    Arc::new(StaticDataProvider::new())
}

/// Sync the secret of every local target concurrently
pub async fn sync_command(
    client: Client,
    config: &SyncConfig,
    namespace: &str,
    name: &str,
    source: DataSource,
    recreate: bool,
) -> Result<()> {
    let remote_secret = fetch_remote_secret(client.clone(), namespace, name).await?;
    let owner = ObjectKey::from_resource(&remote_secret)
        .ok_or_else(|| anyhow!("RemoteSecret '{namespace}/{name}' has no identity"))?;
    let store = kube_store(client.clone(), config);

    let (provider, key): (Arc<dyn SecretDataProvider<ObjectKey>>, ObjectKey) = match source {
        DataSource::UploadData => {
            let provider = StaticDataProvider::from_upload_data(&remote_secret).ok_or_else(|| {
                anyhow!(
                    "RemoteSecret '{owner}' has no uploadData.\n\n\
                    Pass the data explicitly with --from-secret, --from-literal or --from-base64"
                )
            })?;
            (Arc::new(provider), owner.clone())
        }
        DataSource::Secret(source) => (Arc::new(SecretSourceProvider::new(Arc::clone(&store))), source),
        DataSource::Entries { literal, base64 } => {
            // Base64 entries win on key clashes
            let mut data = string_data(&literal);
            data.extend(decode_base64_data(&base64)?);
            (
                Arc::new(StaticDataProvider::new().with_data(owner.clone(), data)),
                owner.clone(),
            )
        }
    };

    let handlers = local_handlers(&remote_secret, &store, &provider)?;
    println!("🔄 Syncing RemoteSecret '{owner}' to {} target(s)...", handlers.len());

    let key = &key;
    let results = join_all(handlers.iter().map(|(target_namespace, handler)| async move {
        if recreate {
            if let Some(stale) = handler.get_stale().await? {
                println!(
                    "   ⚠️  {target_namespace}: secret '{}' no longer matches its desired name and can be deleted",
                    stale.metadata.name.as_deref().unwrap_or_default()
                );
            }
        }
        handler.sync(key, recreate).await
    }))
    .await;

    let mut status = remote_secret.status.clone().unwrap_or_default();
    let failures = record_results(&mut status, &handlers, &results);

    // Later syncs read the materialized names back from the status
    let api: Api<RemoteSecret> = Api::namespaced(client, namespace);
    api.patch_status(
        name,
        &PatchParams::apply("rsctl"),
        &Patch::Merge(json!({ "status": { "targets": status.targets } })),
    )
    .await
    .with_context(|| format!("Failed to update the status of RemoteSecret '{owner}'"))?;

    if failures > 0 {
        bail!("{failures} target(s) failed to sync");
    }
    Ok(())
}

/// Print the outcome of every target and record it in `status`, returning the number of failures
fn record_results(
    status: &mut RemoteSecretStatus,
    handlers: &[(String, Handler)],
    results: &[Result<Secret, SyncError>],
) -> usize {
    let mut failures = 0;
    for ((target_namespace, _), result) in handlers.iter().zip(results) {
        match result {
            Ok(secret) => {
                let secret_name = secret.metadata.name.as_deref().unwrap_or_default();
                println!("   ✅ {target_namespace}: {secret_name}");
                status.record_deployed(target_namespace, None, secret_name);
            }
            Err(e) => {
                failures += 1;
                println!("   ❌ {target_namespace}: [{}] {e}", e.reason());
                status.record_failed(target_namespace, None, &e.to_string());
            }
        }
    }
    failures
}

/// List the managed secrets of every local target
pub async fn list_command(
    client: Client,
    config: &SyncConfig,
    namespace: &str,
    name: &str,
) -> Result<()> {
    let remote_secret = fetch_remote_secret(client.clone(), namespace, name).await?;
    let handlers = local_handlers(&remote_secret, &kube_store(client, config), &no_data())?;

    println!("{:<30} {:<40} {:<20}", "NAMESPACE", "SECRET", "TYPE");
    for (target_namespace, handler) in &handlers {
        let secrets = handler
            .list()
            .await
            .with_context(|| format!("Failed to list secrets in '{target_namespace}'"))?;
        for secret in secrets {
            println!(
                "{:<30} {:<40} {:<20}",
                target_namespace,
                secret.metadata.name.as_deref().unwrap_or_default(),
                secret.type_.as_deref().unwrap_or("Opaque")
            );
        }
    }
    Ok(())
}

/// Show the stale secret of every local target, if any
pub async fn stale_command(
    client: Client,
    config: &SyncConfig,
    namespace: &str,
    name: &str,
) -> Result<()> {
    let remote_secret = fetch_remote_secret(client.clone(), namespace, name).await?;
    let handlers = local_handlers(&remote_secret, &kube_store(client, config), &no_data())?;

    let mut found = 0;
    for (target_namespace, handler) in &handlers {
        if let Some(stale) = handler.get_stale().await? {
            found += 1;
            println!(
                "{target_namespace}/{}",
                stale.metadata.name.as_deref().unwrap_or_default()
            );
        }
    }

    if found == 0 {
        println!("No stale secrets found");
    }
    Ok(())
}
