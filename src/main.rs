use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod diff;
mod error;
mod loader;
mod normalize;
mod reconcile;

use client::{ClientConfig, VaultApi, VaultClient};
use reconcile::{ReconcileSummary, Reconciler};

#[derive(Parser)]
#[command(name = "vaultsync")]
#[command(about = "Converge Vault auth mounts to a declarative configuration tree", long_about = None)]
#[command(after_help = "Connection settings come from the environment, using the same \
variables as the official client: VAULT_ADDR, VAULT_TOKEN and VAULT_SKIP_VERIFY.")]
struct Cli {
    /// The Vault role to authenticate as
    #[arg(long, default_value = "")]
    role: String,

    /// Root of the desired-state configuration tree
    #[arg(long, default_value = "./example")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let client = match VaultClient::new(ClientConfig::from_env()) {
        Ok(client) => client,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(1);
        }
    };

    match run(&client, &cli).await {
        Ok(_) => info!("Success"),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(client: &dyn VaultApi, cli: &Cli) -> Result<ReconcileSummary> {
    client
        .authenticate(&cli.role)
        .await
        .context("failed authenticating with vault")?;

    Reconciler::new(client, &cli.path)
        .run()
        .await
        .context("reconciliation failed")
}
