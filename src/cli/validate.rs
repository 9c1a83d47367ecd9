//! Offline validation of RemoteSecret manifests.

use anyhow::{Context, Result};
use remote_secret_controller::crd::RemoteSecret;
use remote_secret_controller::validation;
use std::path::Path;

fn read_manifest(path: &Path) -> Result<RemoteSecret> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("'{}' is not a RemoteSecret manifest", path.display()))
}

pub fn validate_command(file: &Path, old: Option<&Path>) -> Result<()> {
    let remote_secret = read_manifest(file)?;

    match old {
        Some(old) => {
            let previous = read_manifest(old)?;
            validation::validate_update(&previous, &remote_secret)
        }
        None => validation::validate_create(&remote_secret),
    }
    .with_context(|| format!("'{}' is invalid", file.display()))?;

    println!("✅ '{}' is valid", file.display());
    Ok(())
}
