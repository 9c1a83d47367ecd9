//! # Errors
//!
//! Typed failures of the object store, data providers, object markers and
//! the synchronization handler.

use super::ObjectKey;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single object store request
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    /// The store rejected a write made against a stale resourceVersion
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("kubernetes API error: {0}")]
    Kube(kube::Error),
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_))
    }
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(api_err) if api_err.code == 404 => {
                StoreError::NotFound(api_err.message)
            }
            kube::Error::Api(api_err) if api_err.code == 409 => {
                if api_err.reason == "AlreadyExists" {
                    StoreError::AlreadyExists(api_err.message)
                } else {
                    StoreError::Conflict(api_err.message)
                }
            }
            other => StoreError::Kube(other),
        }
    }
}

/// Failure of a [`super::SecretDataProvider`]
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no secret data available for {0}")]
    NotFound(String),
    #[error("failed to read the secret data: {0}")]
    Store(#[from] StoreError),
    #[error("invalid secret data: {0}")]
    Invalid(String),
}

/// Failure of an [`super::ObjectMarker`] to read or mutate ownership metadata
#[derive(Debug, Error)]
pub enum MarkerError {
    /// The owner key contains the delimiter of the referenced set
    #[error("owner key '{0}' cannot be stored in the referenced set")]
    InvalidOwnerKey(String),
    /// Writing the ownership annotations would exceed the object annotation size limit
    #[error("annotations would grow to {size} bytes, exceeding the limit of {limit} bytes")]
    AnnotationsTooLarge { size: usize, limit: usize },
}

/// Reason code reported alongside a [`SyncError`]
///
/// The string forms are stable and meant for status conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
    /// The data provider could not produce the secret content
    DataFetch,
    /// Creating or updating the secret failed
    SecretUpdate,
    /// Reading the previously materialized secret failed
    StaleDetection,
    /// Listing the secrets managed by the target failed
    ListFailure,
}

impl ErrorReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::DataFetch => "DataFetch",
            ErrorReason::SecretUpdate => "SecretUpdate",
            ErrorReason::StaleDetection => "StaleDetection",
            ErrorReason::ListFailure => "ListFailure",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a [`super::SecretHandler`] operation
///
/// Every variant names the deployment target (its owner key and type).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to obtain the secret data for the deployment target {target} ({target_type}): {source}")]
    DataFetch {
        target: ObjectKey,
        target_type: String,
        #[source]
        source: ProviderError,
    },
    #[error("failed to sync the target secret of the deployment target {target} ({target_type}): {source}")]
    SecretUpdate {
        target: ObjectKey,
        target_type: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to mark the target secret of the deployment target {target} ({target_type}): {source}")]
    Marking {
        target: ObjectKey,
        target_type: String,
        #[source]
        source: MarkerError,
    },
    #[error("failed to detect whether the secret {namespace}/{secret_name} of the deployment target {target} ({target_type}) is stale: {source}")]
    StaleDetection {
        target: ObjectKey,
        target_type: String,
        namespace: String,
        secret_name: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to list the secrets of the deployment target {target} ({target_type}): {source}")]
    List {
        target: ObjectKey,
        target_type: String,
        #[source]
        source: ListFailure,
    },
}

/// Step of a listing that failed
#[derive(Debug, Error)]
pub enum ListFailure {
    #[error("failed to formulate the list options: {0}")]
    Options(#[source] MarkerError),
    #[error("failed to list the secrets: {0}")]
    Store(#[source] StoreError),
    #[error("failed to determine whether the secret {secret} is managed: {source}")]
    Ownership {
        secret: String,
        #[source]
        source: MarkerError,
    },
}

impl SyncError {
    /// Reason code of this failure
    ///
    /// Marking failures report [`ErrorReason::SecretUpdate`], callers do not
    /// distinguish them from store failures.
    #[must_use]
    pub fn reason(&self) -> ErrorReason {
        match self {
            SyncError::DataFetch { .. } => ErrorReason::DataFetch,
            SyncError::SecretUpdate { .. } | SyncError::Marking { .. } => {
                ErrorReason::SecretUpdate
            }
            SyncError::StaleDetection { .. } => ErrorReason::StaleDetection,
            SyncError::List { .. } => ErrorReason::ListFailure,
        }
    }
}
