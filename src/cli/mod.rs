//! # RSCTL CLI
//!
//! Command-line interface for RemoteSecret synchronization.
//!
//! Runs the synchronization handler against the cluster of the current
//! kubeconfig context, for inspection and manual repair.
//!
//! ## Usage
//!
//! ```bash
//! # Sync the uploadData of a RemoteSecret to all its local targets
//! rsctl sync my-remote-secret --namespace team-a
//!
//! # Sync literal data, replacing secrets whose name no longer matches the RemoteSecret spec
//! rsctl sync my-remote-secret --from-literal user=admin --recreate
//!
//! # List the secrets managed by a RemoteSecret
//! rsctl list my-remote-secret
//!
//! # Show secrets that no longer correspond to the RemoteSecret spec
//! rsctl stale my-remote-secret
//!
//! # Show which RemoteSecrets reference a secret
//! rsctl owners db-credentials-x7k2p --namespace team-a-dev
//!
//! # Remove a RemoteSecret from the owners of a secret
//! rsctl unlink db-credentials-x7k2p --owner team-a/my-remote-secret --namespace team-a-dev
//!
//! # Validate a RemoteSecret manifest
//! rsctl validate -f remote-secret.yaml
//! ```

mod secrets;
mod targets;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;
use remote_secret_controller::binding::ObjectKey;
use remote_secret_controller::config::SyncConfig;
use remote_secret_controller::observability::{self, metrics};
use std::path::PathBuf;

/// RemoteSecret Controller CLI
#[derive(Parser)]
#[command(name = "rsctl")]
#[command(
    about = "RemoteSecret Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  rsctl sync my-remote-secret --namespace team-a
  rsctl list my-remote-secret
  rsctl owners db-credentials-x7k2p --namespace team-a-dev
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,

    /// Print the collected Prometheus metrics when done
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the secrets of a RemoteSecret in its local targets
    Sync {
        /// Name of the RemoteSecret resource
        #[arg(value_name = "NAME")]
        name: String,

        /// Copy the data of an existing secret (<namespace>/<name>)
        #[arg(long, value_name = "SECRET", conflicts_with_all = ["from_literal", "from_base64"])]
        from_secret: Option<ObjectKey>,

        /// Literal data entry (KEY=VALUE), may be repeated
        #[arg(long, value_name = "KEY=VALUE", value_parser = parse_entry)]
        from_literal: Vec<(String, String)>,

        /// Base64 encoded data entry (KEY=BASE64), may be repeated
        #[arg(long, value_name = "KEY=BASE64", value_parser = parse_entry)]
        from_base64: Vec<(String, String)>,

        /// Write the secrets under the name from the secret spec, ignoring the names
        /// recorded in the status
        #[arg(long)]
        recreate: bool,
    },
    /// List the secrets managed by a RemoteSecret in its local targets
    List {
        /// Name of the RemoteSecret resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Show secrets that no longer correspond to the RemoteSecret spec
    Stale {
        /// Name of the RemoteSecret resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Show the RemoteSecrets referencing and managing a secret
    Owners {
        /// Name of the secret
        #[arg(value_name = "SECRET")]
        secret: String,
    },
    /// Remove a RemoteSecret from the owners of a secret
    Unlink {
        /// Name of the secret
        #[arg(value_name = "SECRET")]
        secret: String,

        /// Owner to remove (<namespace>/<name>)
        #[arg(long, value_name = "OWNER")]
        owner: ObjectKey,
    },
    /// Validate a RemoteSecret manifest
    Validate {
        /// RemoteSecret manifest (YAML)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Currently stored manifest, validates the change as an update
        #[arg(long, value_name = "FILE")]
        old: Option<PathBuf>,
    },
}

fn parse_entry(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, val)| (key.to_string(), val.to_string()))
        .ok_or_else(|| format!("'{value}' is not in the KEY=VALUE form"))
}

async fn kube_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any other operations
    // Required for rustls 0.23+ when no default provider is set via features
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_existing| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = SyncConfig::from_env();
    observability::init_tracing(&config)?;
    if config.enable_metrics {
        observability::register_metrics()?;
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            name,
            from_secret,
            from_literal,
            from_base64,
            recreate,
        } => {
            let source = targets::DataSource::from_args(from_secret, from_literal, from_base64);
            let client = kube_client().await?;
            targets::sync_command(client, &config, &cli.namespace, &name, source, recreate).await
        }
        Commands::List { name } => {
            let client = kube_client().await?;
            targets::list_command(client, &config, &cli.namespace, &name).await
        }
        Commands::Stale { name } => {
            let client = kube_client().await?;
            targets::stale_command(client, &config, &cli.namespace, &name).await
        }
        Commands::Owners { secret } => {
            let client = kube_client().await?;
            secrets::owners_command(client, &config, &cli.namespace, &secret).await
        }
        Commands::Unlink { secret, owner } => {
            let client = kube_client().await?;
            secrets::unlink_command(client, &config, &cli.namespace, &secret, &owner).await
        }
        Commands::Validate { file, old } => validate::validate_command(&file, old.as_deref()),
    };

    if cli.metrics && config.enable_metrics {
        print!("{}", metrics::gather_metrics()?);
    }

    result
}
