//! # CRD Generator
//!
//! Prints the CustomResourceDefinition of the `RemoteSecret` resource as YAML.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/remotesecret.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use kube::CustomResourceExt;
use remote_secret_controller::crd::RemoteSecret;

fn main() -> Result<()> {
    let crd = RemoteSecret::crd();
    let yaml = serde_yaml::to_string(&crd).context("Failed to serialize the RemoteSecret CRD")?;
    print!("{yaml}");
    Ok(())
}
