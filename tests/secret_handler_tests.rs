//! # Secret Handler Tests
//!
//! Exercises the synchronization handler against the in-memory store:
//! create and update, stale detection, the create/update race fallbacks and
//! owner scoped listing.

mod common;

use common::*;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use remote_secret_controller::binding::{
    ErrorReason, ObjectKey, ObjectMarker, StoreError, SyncError,
};
use remote_secret_controller::constants::{
    LINKED_BY_REMOTE_SECRET_LABEL, LINKED_REMOTE_SECRETS_ANNOTATION,
    MANAGING_REMOTE_SECRET_ANNOTATION,
};
use remote_secret_controller::crd::LinkableSecretSpec;
use remote_secret_controller::namespacetarget::NamespaceObjectMarker;
use remote_secret_controller::provider::StaticDataProvider;
use std::collections::BTreeMap;
use std::sync::Arc;

fn is_managed_by(owner: &ObjectKey, secret: &Secret) -> bool {
    NamespaceObjectMarker::new()
        .is_managed_by(owner, &secret.metadata)
        .unwrap()
}

#[tokio::test]
async fn test_sync_creates_then_updates() {
    let store = InMemorySecretStore::new();

    let first = handler(
        &store,
        named_spec("db"),
        None,
        provider_with(owner(), &[("user", "admin"), ("password", "one")]),
    );
    let created = first.sync(&owner(), false).await.unwrap();

    assert_eq!(created.metadata.name.as_deref(), Some("db"));
    assert!(is_managed_by(&owner(), &created));
    assert_eq!(
        created.data.as_ref().unwrap(),
        &data(&[("user", "admin"), ("password", "one")])
    );

    // Someone adds a key the RemoteSecret does not know about
    let mut edited = store.secret(TARGET_NAMESPACE, "db").unwrap();
    edited
        .data
        .as_mut()
        .unwrap()
        .insert("extra".to_string(), bytes("kept"));
    store.insert(edited);

    let second = handler(
        &store,
        named_spec("db"),
        Some("db"),
        provider_with(owner(), &[("password", "two")]),
    );
    let updated = second.sync(&owner(), false).await.unwrap();

    assert_eq!(updated.metadata.name.as_deref(), Some("db"));
    assert_eq!(store.len(), 1);
    let stored = updated.data.unwrap();
    assert_eq!(stored["password"], bytes("two"));
    assert_eq!(stored["user"], bytes("admin"));
    assert_eq!(stored["extra"], bytes("kept"));
    assert!(is_managed_by(&owner(), &store.secret(TARGET_NAMESPACE, "db").unwrap()));
}

#[tokio::test]
async fn test_sync_applies_spec_metadata() {
    let store = InMemorySecretStore::new();
    let spec = LinkableSecretSpec {
        name: "db".to_string(),
        r#type: Some("kubernetes.io/basic-auth".to_string()),
        labels: BTreeMap::from([("app".to_string(), "backend".to_string())]),
        annotations: BTreeMap::from([("team".to_string(), "a".to_string())]),
        ..LinkableSecretSpec::default()
    };

    let created = handler(&store, spec, None, provider_with(owner(), &[("k", "v")]))
        .sync(&owner(), false)
        .await
        .unwrap();

    let labels = created.metadata.labels.unwrap();
    let annotations = created.metadata.annotations.unwrap();
    assert_eq!(created.type_.as_deref(), Some("kubernetes.io/basic-auth"));
    assert_eq!(labels["app"], "backend");
    assert_eq!(labels[LINKED_BY_REMOTE_SECRET_LABEL], "true");
    assert_eq!(annotations["team"], "a");
    assert_eq!(annotations[MANAGING_REMOTE_SECRET_ANNOTATION], "team-a/creds");
    assert_eq!(annotations[LINKED_REMOTE_SECRETS_ANNOTATION], "team-a/creds");
}

#[tokio::test]
async fn test_update_takes_over_management_and_keeps_references() {
    let store = InMemorySecretStore::new();
    let other = ObjectKey::new("team-b", "creds");

    handler_for(
        other.clone(),
        &store,
        named_spec("shared"),
        None,
        provider_with(other.clone(), &[("k", "b")]),
    )
    .sync(&other, false)
    .await
    .unwrap();

    let updated = handler(
        &store,
        named_spec("shared"),
        Some("shared"),
        provider_with(owner(), &[("k", "a")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap();

    let marker = NamespaceObjectMarker::new();
    assert!(marker.is_managed_by(&owner(), &updated.metadata).unwrap());
    assert!(!marker.is_managed_by(&other, &updated.metadata).unwrap());
    assert!(marker.is_referenced_by(&other, &updated.metadata).unwrap());
    assert_eq!(
        marker.get_referencing_targets(&updated.metadata).unwrap(),
        vec![other, owner()]
    );
}

#[tokio::test]
async fn test_spec_cannot_override_ownership_annotations() {
    let store = InMemorySecretStore::new();
    store.insert(secret("db", &[]));
    let spec = LinkableSecretSpec {
        name: "db".to_string(),
        annotations: BTreeMap::from([(
            MANAGING_REMOTE_SECRET_ANNOTATION.to_string(),
            "someone/else".to_string(),
        )]),
        ..LinkableSecretSpec::default()
    };

    let updated = handler(&store, spec, Some("db"), provider_with(owner(), &[("k", "v")]))
        .sync(&owner(), false)
        .await
        .unwrap();

    assert!(is_managed_by(&owner(), &updated));
}

#[tokio::test]
async fn test_sync_with_generated_name() {
    let store = InMemorySecretStore::new();
    let spec = LinkableSecretSpec {
        generate_name: "db-".to_string(),
        ..LinkableSecretSpec::default()
    };

    let created = handler(&store, spec, None, provider_with(owner(), &[("k", "v")]))
        .sync(&owner(), false)
        .await
        .unwrap();

    let name = created.metadata.name.unwrap();
    assert!(name.starts_with("db-"), "unexpected name {name}");
    assert_eq!(store.calls(), vec![Op::Create]);
}

#[tokio::test]
async fn test_sync_defaults_generated_name_to_owner_name() {
    let store = InMemorySecretStore::new();

    let created = handler(
        &store,
        LinkableSecretSpec::default(),
        None,
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap();

    assert!(created.metadata.name.unwrap().starts_with("creds-secret-"));
}

#[tokio::test]
async fn test_sync_updates_generated_secret_in_place() {
    let store = InMemorySecretStore::new();
    let spec = LinkableSecretSpec {
        generate_name: "db-".to_string(),
        ..LinkableSecretSpec::default()
    };

    let created = handler(&store, spec.clone(), None, provider_with(owner(), &[("k", "1")]))
        .sync(&owner(), false)
        .await
        .unwrap();
    let name = created.metadata.name.unwrap();

    let updated = handler(&store, spec, Some(&name), provider_with(owner(), &[("k", "2")]))
        .sync(&owner(), false)
        .await
        .unwrap();

    assert_eq!(updated.metadata.name.as_deref(), Some(name.as_str()));
    assert_eq!(store.len(), 1);
    assert_eq!(updated.data.unwrap()["k"], bytes("2"));
}

#[tokio::test]
async fn test_recreate_uses_spec_name() {
    let store = InMemorySecretStore::new();
    store.insert(secret("old", &[("k", "v")]));

    let created = handler(
        &store,
        named_spec("new"),
        Some("old"),
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), true)
    .await
    .unwrap();

    assert_eq!(created.metadata.name.as_deref(), Some("new"));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_get_stale_returns_secret_under_previous_name() {
    let store = InMemorySecretStore::new();
    store.insert(secret("old", &[("k", "v")]));
    let handler = handler(
        &store,
        named_spec("new"),
        Some("old"),
        Arc::new(StaticDataProvider::new()),
    );

    let stale = handler.get_stale().await.unwrap().unwrap();
    assert_eq!(stale.metadata.name.as_deref(), Some("old"));
    assert_eq!(store.calls(), vec![Op::Get]);
}

#[tokio::test]
async fn test_get_stale_ignores_deleted_secret() {
    let store = InMemorySecretStore::new();
    let handler = handler(
        &store,
        named_spec("new"),
        Some("old"),
        Arc::new(StaticDataProvider::new()),
    );

    assert!(handler.get_stale().await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_stale_without_name_change_does_not_read() {
    let store = InMemorySecretStore::new();
    let spec = LinkableSecretSpec {
        generate_name: "db-".to_string(),
        ..LinkableSecretSpec::default()
    };

    let unchanged = handler(
        &store,
        named_spec("db"),
        Some("db"),
        Arc::new(StaticDataProvider::new()),
    );
    let generated = handler(&store, spec, Some("db-00001"), Arc::new(StaticDataProvider::new()));
    let first_sync = handler(&store, named_spec("db"), None, Arc::new(StaticDataProvider::new()));

    assert!(unchanged.get_stale().await.unwrap().is_none());
    assert!(generated.get_stale().await.unwrap().is_none());
    assert!(first_sync.get_stale().await.unwrap().is_none());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_get_stale_reports_store_failure() {
    let store = InMemorySecretStore::new();
    store.fail_next(Op::Get, || StoreError::Other("connection reset".to_string()));
    let handler = handler(
        &store,
        named_spec("new"),
        Some("old"),
        Arc::new(StaticDataProvider::new()),
    );

    let err = handler.get_stale().await.unwrap_err();
    assert_eq!(err.reason(), ErrorReason::StaleDetection);
    match err {
        SyncError::StaleDetection {
            namespace,
            secret_name,
            ..
        } => {
            assert_eq!(namespace, TARGET_NAMESPACE);
            assert_eq!(secret_name, "old");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_update_falls_back_to_create_when_secret_disappears() {
    let store = InMemorySecretStore::new();
    store.insert(secret("db", &[("k", "v")]));
    // Deleted between our read and our write
    store.before_next(Op::Update, |objects| {
        objects.clear();
    });

    let synced = handler(
        &store,
        named_spec("db"),
        Some("db"),
        provider_with(owner(), &[("k", "new")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap();

    assert_eq!(synced.metadata.name.as_deref(), Some("db"));
    assert!(is_managed_by(&owner(), &synced));
    assert_eq!(store.calls(), vec![Op::Get, Op::Update, Op::Create]);
}

#[tokio::test]
async fn test_create_falls_back_to_update_when_secret_appears() {
    let store = InMemorySecretStore::new();
    // Created by another writer right before our create
    store.before_next(Op::Create, |objects| {
        let mut concurrent = secret("db", &[("other", "x")]);
        concurrent.metadata.resource_version = Some("100".to_string());
        objects.insert((TARGET_NAMESPACE.to_string(), "db".to_string()), concurrent);
    });

    let synced = handler(
        &store,
        named_spec("db"),
        None,
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap();

    let stored = synced.data.as_ref().unwrap();
    assert_eq!(stored["k"], bytes("v"));
    assert_eq!(stored["other"], bytes("x"));
    assert!(is_managed_by(&owner(), &synced));
    assert_eq!(
        store.calls(),
        vec![Op::Get, Op::Create, Op::Get, Op::Update]
    );
}

#[tokio::test]
async fn test_repeated_race_is_a_hard_error() {
    let store = InMemorySecretStore::new();
    store.before_next(Op::Create, |objects| {
        objects.insert(
            (TARGET_NAMESPACE.to_string(), "db".to_string()),
            secret("db", &[]),
        );
    });
    store.fail_next(Op::Update, || StoreError::NotFound("db".to_string()));

    let err = handler(
        &store,
        named_spec("db"),
        None,
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::SecretUpdate);
    assert!(matches!(
        err,
        SyncError::SecretUpdate {
            source: StoreError::NotFound(_),
            ..
        }
    ));
    assert_eq!(
        store.calls(),
        vec![Op::Get, Op::Create, Op::Get, Op::Update]
    );
}

#[tokio::test]
async fn test_generated_name_create_does_not_fall_back() {
    let store = InMemorySecretStore::new();
    store.fail_next(Op::Create, || StoreError::AlreadyExists("db-x".to_string()));

    let err = handler(
        &store,
        LinkableSecretSpec::default(),
        None,
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::SecretUpdate);
    assert_eq!(store.calls(), vec![Op::Create]);
}

#[tokio::test]
async fn test_update_conflict_is_surfaced() {
    let store = InMemorySecretStore::new();
    store.insert(secret("db", &[]));
    store.fail_next(Op::Update, || StoreError::Conflict("db".to_string()));

    let err = handler(
        &store,
        named_spec("db"),
        Some("db"),
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SyncError::SecretUpdate {
            source: StoreError::Conflict(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_missing_data_is_a_data_fetch_error() {
    let store = InMemorySecretStore::new();

    let err = handler(
        &store,
        named_spec("db"),
        None,
        Arc::new(StaticDataProvider::new()),
    )
    .sync(&owner(), false)
    .await
    .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::DataFetch);
    assert!(err.to_string().contains("team-a/creds (namespace)"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_marking_failure_is_reported_as_secret_update() {
    let store = InMemorySecretStore::new();
    let owner = ObjectKey::new("team-a", "a,b");

    let err = handler_for(
        owner.clone(),
        &store,
        named_spec("db"),
        None,
        provider_with(owner.clone(), &[("k", "v")]),
    )
    .sync(&owner, false)
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Marking { .. }));
    assert_eq!(err.reason(), ErrorReason::SecretUpdate);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_list_returns_only_managed_secrets() {
    let store = InMemorySecretStore::new();
    let marker = NamespaceObjectMarker::new();
    let other = ObjectKey::new("team-b", "creds");

    let mut managed = secret("managed", &[]);
    marker.mark_managed(&owner(), &mut managed.metadata).unwrap();

    let mut referenced = secret("referenced", &[]);
    marker
        .mark_referenced(&owner(), &mut referenced.metadata)
        .unwrap();
    marker.mark_managed(&other, &mut referenced.metadata).unwrap();

    store.insert(managed);
    store.insert(referenced);
    store.insert(secret("unrelated", &[]));

    let listed = handler(
        &store,
        named_spec("managed"),
        None,
        Arc::new(StaticDataProvider::new()),
    )
    .list()
    .await
    .unwrap();

    let names: Vec<_> = listed
        .iter()
        .filter_map(|s| s.metadata.name.as_deref())
        .collect();
    assert_eq!(names, vec!["managed"]);
}

#[tokio::test]
async fn test_list_failure() {
    let store = InMemorySecretStore::new();
    store.fail_next(Op::List, || StoreError::Timeout(std::time::Duration::from_secs(1)));

    let err = handler(
        &store,
        named_spec("db"),
        None,
        Arc::new(StaticDataProvider::new()),
    )
    .list()
    .await
    .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::ListFailure);
}

#[tokio::test]
async fn test_list_rejects_unencodable_owner() {
    let store = InMemorySecretStore::new();
    let owner = ObjectKey::new("team-a", "a,b");

    let err = handler_for(
        owner,
        &store,
        named_spec("db"),
        None,
        Arc::new(StaticDataProvider::new()),
    )
    .list()
    .await
    .unwrap_err();

    assert_eq!(err.reason(), ErrorReason::ListFailure);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_unmarked_secret_is_not_listed_after_unlink() {
    let store = InMemorySecretStore::new();
    let synced = handler(
        &store,
        named_spec("db"),
        None,
        provider_with(owner(), &[("k", "v")]),
    )
    .sync(&owner(), false)
    .await
    .unwrap();

    let mut meta: ObjectMeta = synced.metadata.clone();
    NamespaceObjectMarker::new()
        .unmark_referenced(&owner(), &mut meta)
        .unwrap();
    store.insert(Secret {
        metadata: meta,
        ..synced
    });

    let listed = handler(
        &store,
        named_spec("db"),
        Some("db"),
        Arc::new(StaticDataProvider::new()),
    )
    .list()
    .await
    .unwrap();
    assert!(listed.is_empty());
}
