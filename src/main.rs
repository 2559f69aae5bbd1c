//! kubeedge-trust - provision and inspect cloudcore trust-material secrets

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kubeedge_common::config::load_secret_names;
use kubeedge_common::telemetry::{init_tracing, LogFormat, TelemetryConfig};
use kubeedge_secrets::{KubeResourceStore, TrustProvisioner};

/// Provision KubeEdge cloudcore trust material as Kubernetes secrets
#[derive(Parser, Debug)]
#[command(name = "kubeedge-trust", version, about, long_about = None)]
struct Cli {
    /// Kubeconfig to use (defaults to in-cluster config, then KUBECONFIG / ~/.kube/config)
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// YAML file with secret and data-key names (defaults to cloudcore's names)
    #[arg(long, global = true, env = "KUBEEDGE_SECRET_NAMES")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store token, CA and cloudcore TLS material in the kubeedge namespace
    Provision(commands::provision::ProvisionArgs),
    /// Read a secret back
    Get(commands::get::GetArgs),
}

impl Cli {
    async fn run(self) -> anyhow::Result<()> {
        let store = Arc::new(KubeResourceStore::connect(self.kubeconfig.as_deref()).await?);

        match self.command {
            Commands::Provision(args) => {
                let names = load_secret_names(self.config.as_deref())?;
                let provisioner = TrustProvisioner::new(store, names)?;
                commands::provision::run(&provisioner, args).await
            }
            Commands::Get(args) => commands::get::run(store.as_ref(), args).await,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(TelemetryConfig {
        format: if cli.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        default_filter: None,
    })?;

    cli.run().await
}
