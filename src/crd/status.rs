//! # RemoteSecret Status
//!
//! Status types for tracking data availability and deployed targets.

use serde::{Deserialize, Serialize};

/// Status of the RemoteSecret resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSecretStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Deployment state of every target
    #[serde(default)]
    pub targets: Vec<TargetStatus>,
}

impl RemoteSecretStatus {
    /// Whether the condition of the given type is `True`
    #[must_use]
    pub fn is_condition_true(&self, condition_type: &str) -> bool {
        self.conditions
            .iter()
            .any(|c| c.r#type == condition_type && c.status == "True")
    }

    /// Status entry of the target deployed to the given namespace/cluster
    #[must_use]
    pub fn target(&self, namespace: &str, api_url: Option<&str>) -> Option<&TargetStatus> {
        self.targets.iter().find(|t| {
            t.namespace == namespace
                && t.api_url.as_deref().unwrap_or_default() == api_url.unwrap_or_default()
        })
    }

    fn target_mut(&mut self, namespace: &str, api_url: Option<&str>) -> &mut TargetStatus {
        let index = self.targets.iter().position(|t| {
            t.namespace == namespace
                && t.api_url.as_deref().unwrap_or_default() == api_url.unwrap_or_default()
        });
        match index {
            Some(index) => &mut self.targets[index],
            None => {
                self.targets.push(TargetStatus {
                    namespace: namespace.to_string(),
                    api_url: api_url.filter(|url| !url.is_empty()).map(str::to_string),
                    ..TargetStatus::default()
                });
                let last = self.targets.len() - 1;
                &mut self.targets[last]
            }
        }
    }

    /// Record the secret materialized in a target, clearing any previous error.
    ///
    /// Later syncs read the name back to update the same secret instead of
    /// creating another one from the generated-name prefix.
    pub fn record_deployed(&mut self, namespace: &str, api_url: Option<&str>, secret_name: &str) {
        let target = self.target_mut(namespace, api_url);
        target.secret_name = secret_name.to_string();
        target.error = None;
    }

    /// Record a failed deployment, keeping the last known secret name
    pub fn record_failed(&mut self, namespace: &str, api_url: Option<&str>, error: &str) {
        self.target_mut(namespace, api_url).error = Some(error.to_string());
    }
}

/// Deployment state of a single target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetStatus {
    /// Namespace of the target
    pub namespace: String,
    /// API server URL of the target cluster (empty for the local cluster)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Actual name of the secret materialized in the target
    #[serde(default)]
    pub secret_name: String,
    /// Last error encountered while deploying to this target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
