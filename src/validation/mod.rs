//! # Validation
//!
//! Admission rules for `RemoteSecret` resources, applied before a resource
//! reaches the synchronization handler.
//!
//! - `kubernetes`: RFC 1123 name and namespace checks

mod kubernetes;

pub use kubernetes::{validate_generate_name, validate_kubernetes_name, validate_kubernetes_namespace};

use crate::constants::DATA_OBTAINED_CONDITION;
use crate::crd::RemoteSecret;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("dataFrom and uploadData cannot be specified at the same time")]
    ConflictingDataSources,
    #[error("dataFrom cannot be set once the RemoteSecret has obtained its data")]
    DataAlreadyObtained,
    #[error("target namespace '{namespace}' in cluster '{}' is listed more than once", .api_url.as_deref().unwrap_or("local"))]
    DuplicateTarget {
        namespace: String,
        api_url: Option<String>,
    },
    #[error("{field} '{value}' is invalid: {reason}")]
    InvalidName {
        field: String,
        value: String,
        reason: String,
    },
    #[error("failed to compile validation pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Validate a RemoteSecret being created
pub fn validate_create(remote_secret: &RemoteSecret) -> Result<(), ValidationError> {
    validate_data_sources(remote_secret)?;
    validate_secret_names(remote_secret)?;
    validate_targets(remote_secret)
}

/// Validate an update of `old` to `new`
///
/// In addition to the create rules, `dataFrom` is rejected once the data has
/// been obtained.
pub fn validate_update(old: &RemoteSecret, new: &RemoteSecret) -> Result<(), ValidationError> {
    validate_create(new)?;

    let wants_data_from = new.spec.data_from.as_ref().is_some_and(|d| !d.is_empty());
    let data_obtained = [old, new].iter().any(|rs| {
        rs.status
            .as_ref()
            .is_some_and(|s| s.is_condition_true(DATA_OBTAINED_CONDITION))
    });
    if wants_data_from && data_obtained {
        return Err(ValidationError::DataAlreadyObtained);
    }

    Ok(())
}

/// Deleting is always allowed
#[allow(clippy::unnecessary_wraps, reason = "uniform signature with the other admission checks")]
pub fn validate_delete(_remote_secret: &RemoteSecret) -> Result<(), ValidationError> {
    Ok(())
}

fn validate_data_sources(remote_secret: &RemoteSecret) -> Result<(), ValidationError> {
    let spec = &remote_secret.spec;
    let has_data_from = spec.data_from.as_ref().is_some_and(|d| !d.is_empty());
    let has_upload_data = spec.upload_data.as_ref().is_some_and(|d| !d.is_empty());

    if has_data_from && has_upload_data {
        return Err(ValidationError::ConflictingDataSources);
    }
    Ok(())
}

fn validate_secret_names(remote_secret: &RemoteSecret) -> Result<(), ValidationError> {
    let secret = &remote_secret.spec.secret;
    if !secret.name.is_empty() {
        validate_kubernetes_name(&secret.name, "spec.secret.name")?;
    }
    if !secret.generate_name.is_empty() {
        validate_generate_name(&secret.generate_name, "spec.secret.generateName")?;
    }
    Ok(())
}

fn validate_targets(remote_secret: &RemoteSecret) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for target in &remote_secret.spec.targets {
        validate_kubernetes_namespace(&target.namespace, "spec.targets.namespace")?;

        let api_url = target.api_url.clone().filter(|u| !u.is_empty());
        if !seen.insert((target.namespace.clone(), api_url.clone())) {
            return Err(ValidationError::DuplicateTarget {
                namespace: target.namespace.clone(),
                api_url,
            });
        }
    }
    Ok(())
}
