//! Get command - read a provisioned secret back
//!
//! Without `--key` prints each data key with its size; with `--key` prints
//! that value base64-encoded so binary DER survives the terminal.

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::Args;
use k8s_openapi::api::core::v1::Secret;
use kubeedge_common::KUBEEDGE_SYSTEM_NAMESPACE;
use kubeedge_secrets::{read_secret, secret_data, ResourceStore};

/// Get command arguments
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Secret name
    pub name: String,

    /// Namespace of the secret
    #[arg(long, short = 'n', default_value = KUBEEDGE_SYSTEM_NAMESPACE)]
    pub namespace: String,

    /// Print only this data key, base64-encoded
    #[arg(long, short = 'k')]
    pub key: Option<String>,
}

fn render(secret: &Secret, key: Option<&str>) -> anyhow::Result<String> {
    if let Some(key) = key {
        return Ok(STANDARD.encode(secret_data(secret, key)?));
    }

    let lines: Vec<String> = secret
        .data
        .iter()
        .flatten()
        .map(|(k, v)| format!("{}\t{} bytes", k, v.0.len()))
        .collect();
    Ok(lines.join("\n"))
}

/// Run the get command
pub async fn run(store: &dyn ResourceStore, args: GetArgs) -> anyhow::Result<()> {
    let secret = read_secret(store, &args.name, &args.namespace)
        .await
        .with_context(|| format!("failed to get secret {}/{}", args.namespace, args.name))?;
    println!("{}", render(&secret, args.key.as_deref())?);
    Ok(())
}
