//! Commands inspecting and editing the ownership tags of a single secret.

use anyhow::{Context, Result};
use kube::api::ObjectMeta;
use kube::Client;
use remote_secret_controller::binding::{
    KubeSecretStore, MarkerError, ObjectKey, ObjectMarker, SecretStore,
};
use remote_secret_controller::config::SyncConfig;
use remote_secret_controller::namespacetarget::NamespaceObjectMarker;

/// Owners referencing an object, each paired with whether it manages the object
fn owner_rows(
    marker: &dyn ObjectMarker,
    meta: &ObjectMeta,
) -> Result<Vec<(ObjectKey, bool)>, MarkerError> {
    marker
        .get_referencing_targets(meta)?
        .into_iter()
        .map(|owner| {
            let managing = marker.is_managed_by(&owner, meta)?;
            Ok((owner, managing))
        })
        .collect()
}

/// Print the owners referencing a secret, flagging the managing one
pub async fn owners_command(
    client: Client,
    config: &SyncConfig,
    namespace: &str,
    name: &str,
) -> Result<()> {
    let store = KubeSecretStore::new(client, config.request_timeout());
    let secret = store
        .get(namespace, name)
        .await
        .with_context(|| format!("Failed to get secret '{namespace}/{name}'"))?;

    let rows = owner_rows(&NamespaceObjectMarker::new(), &secret.metadata)?;
    if rows.is_empty() {
        println!("Secret '{namespace}/{name}' is not referenced by any RemoteSecret");
        return Ok(());
    }

    println!("{:<50} {:<10}", "OWNER", "MANAGING");
    for (owner, managing) in rows {
        println!("{:<50} {:<10}", owner.to_string(), managing);
    }
    Ok(())
}

/// Remove `owner` from the owners of a secret
pub async fn unlink_command(
    client: Client,
    config: &SyncConfig,
    namespace: &str,
    name: &str,
    owner: &ObjectKey,
) -> Result<()> {
    let store = KubeSecretStore::new(client, config.request_timeout());
    let mut secret = store
        .get(namespace, name)
        .await
        .with_context(|| format!("Failed to get secret '{namespace}/{name}'"))?;

    let marker = NamespaceObjectMarker::new();
    if !marker.unmark_referenced(owner, &mut secret.metadata)? {
        println!("Secret '{namespace}/{name}' is not referenced by '{owner}', nothing to do");
        return Ok(());
    }

    store
        .update(namespace, &secret)
        .await
        .with_context(|| format!("Failed to update secret '{namespace}/{name}'"))?;

    println!("✅ Unlinked '{owner}' from secret '{namespace}/{name}'");
    if marker.get_referencing_targets(&secret.metadata)?.is_empty() {
        println!("   The secret is no longer referenced by any RemoteSecret");
    }
    Ok(())
}
