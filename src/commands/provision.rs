//! Provision command - store already-generated trust material
//!
//! Each material is optional, so a bootstrap script can write the token on
//! every run while the CA is written once. Steps run token, then CA, then
//! cloudcore, and the first failure aborts the rest.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use kubeedge_secrets::{TrustProvisioner, UpsertOutcome};
use tracing::info;

/// Provision command arguments
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// File holding the join token (CA hash and token, as produced by cloudcore)
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// DER-encoded CA certificate
    #[arg(long, requires = "ca_key")]
    pub ca_cert: Option<PathBuf>,

    /// CA private key
    #[arg(long, requires = "ca_cert")]
    pub ca_key: Option<PathBuf>,

    /// DER-encoded cloudcore certificate
    #[arg(long, requires = "cloudcore_key")]
    pub cloudcore_cert: Option<PathBuf>,

    /// cloudcore private key
    #[arg(long, requires = "cloudcore_cert")]
    pub cloudcore_key: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Token(Vec<u8>),
    Ca { cert: Vec<u8>, key: Vec<u8> },
    CloudCore { cert: Vec<u8>, key: Vec<u8> },
}

impl Step {
    fn label(&self) -> &'static str {
        match self {
            Step::Token(_) => "token",
            Step::Ca { .. } => "ca",
            Step::CloudCore { .. } => "cloudcore",
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read every given file up front so a bad path fails before any write
fn plan(args: &ProvisionArgs) -> anyhow::Result<Vec<Step>> {
    let mut steps = Vec::new();

    if let Some(path) = &args.token_file {
        steps.push(Step::Token(read_file(path)?));
    }
    if let (Some(cert), Some(key)) = (&args.ca_cert, &args.ca_key) {
        steps.push(Step::Ca {
            cert: read_file(cert)?,
            key: read_file(key)?,
        });
    }
    if let (Some(cert), Some(key)) = (&args.cloudcore_cert, &args.cloudcore_key) {
        steps.push(Step::CloudCore {
            cert: read_file(cert)?,
            key: read_file(key)?,
        });
    }

    if steps.is_empty() {
        bail!(
            "nothing to provision: pass --token-file, --ca-cert/--ca-key \
             or --cloudcore-cert/--cloudcore-key"
        );
    }
    Ok(steps)
}

/// Run the provision command
pub async fn run(provisioner: &TrustProvisioner, args: ProvisionArgs) -> anyhow::Result<()> {
    for step in plan(&args)? {
        let label = step.label();
        let outcome = match &step {
            Step::Token(token) => provisioner.provision_token_secret(token).await,
            Step::Ca { cert, key } => provisioner.provision_ca_secret(cert, key).await,
            Step::CloudCore { cert, key } => {
                provisioner.provision_cloudcore_secret(cert, key).await
            }
        }
        .with_context(|| format!("failed to provision {} secret", label))?;

        let action = match outcome {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        };
        info!(material = label, action, "provisioned trust material");
    }
    Ok(())
}
