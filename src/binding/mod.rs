//! # Bindings
//!
//! Synchronization of secrets onto deployment targets and tracking of their
//! owners in object metadata.
//!
//! - `codec`: comma-separated encoding of the set of referencing owners
//! - `owner`: owner keys (`<namespace>/<name>`)
//! - `marker`: the [`ObjectMarker`] capability interface
//! - `target`: [`DeploymentTarget`] and [`SecretDataProvider`] collaborators
//! - `store`: the [`SecretStore`] client and its Kubernetes implementation
//! - `names`: name correspondence used by stale detection
//! - `handler`: the [`SecretHandler`] tying everything together

mod codec;
mod errors;
mod handler;
mod marker;
mod names;
mod owner;
mod store;
mod target;

pub use codec::ReferencedSet;
pub use errors::{ErrorReason, ListFailure, MarkerError, ProviderError, StoreError, SyncError};
pub use handler::SecretHandler;
pub use marker::ObjectMarker;
pub use names::name_corresponds;
pub use owner::ObjectKey;
pub use store::{KubeSecretStore, ListFilter, SecretStore};
pub use target::{DeploymentTarget, SecretData, SecretDataProvider};
