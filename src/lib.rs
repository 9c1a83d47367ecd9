//! RemoteSecret Controller Library
//!
//! Synchronizes declarative secret specifications onto Kubernetes namespaces
//! and tracks the owning RemoteSecrets in the metadata of the created objects.
//!
//! ## Module Structure
//!
//! - `binding` - Secret synchronization handler, ownership codec and the
//!   collaborator traits (store, deployment target, data provider, object marker)
//! - `namespacetarget` - Object marker and deployment target for local namespaces
//! - `provider` - Secret data providers
//! - `crd` - The `RemoteSecret` custom resource
//! - `validation` - Admission rules for `RemoteSecret` resources
//! - `config` - Environment based configuration
//! - `observability` - Metrics and logging
//! - `constants` - Metadata tag names and defaults

pub mod binding;
pub mod config;
pub mod constants;
pub mod crd;
pub mod namespacetarget;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod validation;
