//! # RemoteSecret Spec
//!
//! Main CRD specification types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// RemoteSecret Custom Resource Definition
///
/// A RemoteSecret holds secret data outside of the target namespaces and
/// materializes it as a Kubernetes `Secret` in each of its targets.
///
/// # Example
///
/// ```yaml
/// apiVersion: remotesecret.dev/v1beta1
/// kind: RemoteSecret
/// metadata:
///   name: db-credentials
///   namespace: team-a
/// spec:
///   secret:
///     generateName: db-credentials-
///     type: Opaque
///     labels:
///       app: backend
///   targets:
///     - namespace: team-a-dev
///     - namespace: team-a-stage
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "RemoteSecret",
    group = "remotesecret.dev",
    version = "v1beta1",
    namespaced,
    status = "crate::crd::RemoteSecretStatus",
    shortname = "rs",
    printcolumn = r#"{"name":"DataObtained", "type":"string", "jsonPath":".status.conditions[?(@.type==\"DataObtained\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSecretSpec {
    /// Desired shape of the secret created in every target
    #[serde(default)]
    pub secret: LinkableSecretSpec,
    /// Namespaces (optionally in remote clusters) the secret is deployed to
    #[serde(default)]
    pub targets: Vec<RemoteSecretTarget>,
    /// Copy the data from another RemoteSecret instead of uploading it.
    /// Mutually exclusive with `uploadData`.
    #[serde(default)]
    pub data_from: Option<RemoteSecretDataFrom>,
    /// Secret data supplied inline at creation time.
    /// Mutually exclusive with a non-empty `dataFrom`.
    #[serde(default)]
    pub upload_data: Option<BTreeMap<String, String>>,
}

/// Desired shape of a materialized secret
///
/// Either `name` or `generateName` is used. When `name` is empty the store
/// generates one from `generateName` (or from a default prefix derived from the
/// owning RemoteSecret).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkableSecretSpec {
    /// Fixed name of the secret
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Prefix of the server-generated name, used when `name` is empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    /// Secret type (e.g. `Opaque`, `kubernetes.io/dockerconfigjson`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    /// Labels merged into the secret
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations merged into the secret
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A single deployment target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSecretTarget {
    /// Namespace the secret is created in
    pub namespace: String,
    /// API server URL of a remote cluster. Empty means the local cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Secret in the RemoteSecret namespace holding the kubeconfig of the remote cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_credentials_secret: Option<String>,
}

impl RemoteSecretTarget {
    /// Whether this target lives in the cluster the controller runs in
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.api_url.as_deref().is_none_or(str::is_empty)
    }
}

/// Reference to another RemoteSecret the data is copied from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSecretDataFrom {
    /// Name of the source RemoteSecret
    #[serde(default)]
    pub name: String,
    /// Namespace of the source RemoteSecret (defaults to the namespace of this one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl RemoteSecretDataFrom {
    /// An empty reference is treated as absent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}
