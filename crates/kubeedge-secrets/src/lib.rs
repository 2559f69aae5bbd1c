//! Idempotent provisioning of cloudcore trust material as Kubernetes secrets
//!
//! # Modules
//!
//! - [`store`] - Store trait over namespaces and secrets, plus the kube-rs implementation
//! - [`namespace`] - Ensure a namespace exists, tolerating concurrent creators
//! - [`upsert`] - Create-or-replace for secrets
//! - [`provisioner`] - Token, CA and cloudcore TLS secrets in the `kubeedge` namespace
//! - [`reader`] - Read secrets back

#![deny(missing_docs)]

pub mod namespace;
pub mod provisioner;
pub mod reader;
pub mod store;
pub mod upsert;

#[cfg(test)]
mod testing;

pub use namespace::ensure_namespace;
pub use provisioner::{KeyPair, TrustProvisioner};
pub use reader::{read_secret, secret_data};
pub use store::{CreateOutcome, KubeResourceStore, ResourceStore};
pub use upsert::{upsert_secret, UpsertOutcome};
