//! # Custom Resource Definitions
//!
//! CRD types for the RemoteSecret controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `RemoteSecret` specification, including the desired shape of the
//!   materialized secret (`LinkableSecretSpec`)
//! - `status.rs` - Status types for tracking data availability and deployed targets

mod spec;
mod status;

pub use spec::{
    LinkableSecretSpec, RemoteSecret, RemoteSecretDataFrom, RemoteSecretSpec, RemoteSecretTarget,
};
pub use status::{Condition, RemoteSecretStatus, TargetStatus};
