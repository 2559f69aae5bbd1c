//! Resource store abstraction over the Kubernetes API
//!
//! The provisioning protocol only needs get/create/update on namespaces and
//! secrets. Keeping that surface behind a trait lets tests drive the
//! conflict paths without an API server.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use kubeedge_common::{Error, Result};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a create call
///
/// A name collision is an expected outcome of the create-then-update
/// protocol, so it is a value here rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The resource did not exist and was created
    Created,
    /// A resource with the same name already exists
    AlreadyExists,
}

/// Trait abstracting the namespace and secret operations used for provisioning
///
/// Lookups return `Ok(None)` for not-found. Creates report a name collision
/// as [`CreateOutcome::AlreadyExists`]; every other failure is an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Get a namespace by name
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;

    /// Create a namespace
    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome>;

    /// Get a secret by name and namespace
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>>;

    /// Create a secret in `namespace`
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<CreateOutcome>;

    /// Replace the secret `name` in `namespace` with `secret`
    ///
    /// Unconditional full-object replace: the stored data map becomes
    /// exactly `secret.data`.
    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<()>;
}

/// Real Kubernetes implementation of [`ResourceStore`]
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
}

impl KubeResourceStore {
    /// Create a store wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from an explicit kubeconfig, or infer one
    /// (in-cluster service account, then `KUBECONFIG` / `~/.kube/config`)
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        Self::connect_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
    }

    /// Same as [`KubeResourceStore::connect`] with custom timeouts
    pub async fn connect_with_timeout(
        kubeconfig: Option<&Path>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let mut config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::client_connection(
                        "read_kubeconfig",
                        format!("failed to read {}: {}", path.display(), e),
                    )
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| {
                        Error::client_connection(
                            "load_kubeconfig",
                            format!("failed to load kubeconfig: {}", e),
                        )
                    })?
            }
            None => Config::infer().await.map_err(|e| {
                Error::client_connection("infer_config", format!("failed to infer config: {}", e))
            })?,
        };
        config.connect_timeout = Some(connect_timeout);
        config.read_timeout = Some(read_timeout);

        let client = Client::try_from(config).map_err(|e| {
            Error::client_connection("create_client", format!("failed to create client: {}", e))
        })?;
        Ok(Self::new(client))
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Whether a kube error is the apiserver's "already exists" response
///
/// 409 is also returned for resourceVersion conflicts on update, so the
/// reason has to be checked as well.
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists")
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match api.get(name).await {
            Ok(ns) => Ok(Some(ns)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match api.create(&PostParams::default(), namespace).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_already_exists(&e) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>> {
        match self.secrets(namespace).get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<CreateOutcome> {
        match self
            .secrets(namespace)
            .create(&PostParams::default(), secret)
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_already_exists(&e) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<()> {
        self.secrets(namespace)
            .replace(name, &PostParams::default(), secret)
            .await?;
        debug!(namespace = %namespace, secret = %name, "replaced secret");
        Ok(())
    }
}
