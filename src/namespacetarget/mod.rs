//! # Namespace Targets
//!
//! Deployment into namespaces of the cluster the controller runs in.
//!
//! - `marker`: [`NamespaceObjectMarker`], the ownership tags used on secrets in
//!   local namespaces
//! - `target`: [`NamespaceTarget`], a [`crate::binding::DeploymentTarget`] for a
//!   single local namespace

mod marker;
mod target;

pub use marker::NamespaceObjectMarker;
pub use target::{NamespaceTarget, TargetError};
