//! Create-or-replace for secrets
//!
//! There is no native upsert on the secrets API, so this is two calls:
//! create, and on an already-exists answer a full replace. The pair is not
//! atomic. Two callers racing on the same secret may both see the conflict
//! and both replace; the apiserver orders the writes and the last one wins.

use k8s_openapi::api::core::v1::Secret;
use kubeedge_common::{Error, Result, SecretOperation};
use tracing::{debug, info};

use crate::namespace::ensure_namespace;
use crate::store::{CreateOutcome, ResourceStore};

/// Which path [`upsert_secret`] took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The secret was new
    Created,
    /// The secret existed and its data was replaced
    Updated,
}

/// Write `secret` into `namespace`, creating the namespace if needed.
///
/// The secret must carry a non-empty `metadata.name`; one without fails
/// with [`Error::UnnamedSecret`] before any store call. Its
/// `metadata.namespace` is forced to `namespace`. On a name
/// collision the stored secret is replaced wholesale, so keys absent from
/// `secret.data` are dropped. Failures are wrapped with the step and
/// resource they concern and never retried here.
pub async fn upsert_secret(
    store: &dyn ResourceStore,
    mut secret: Secret,
    namespace: &str,
) -> Result<UpsertOutcome> {
    let name = match secret.metadata.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::unnamed_secret(namespace)),
    };
    secret.metadata.namespace = Some(namespace.to_string());

    ensure_namespace(store, namespace)
        .await
        .map_err(|e| Error::namespace_creation(namespace, e))?;

    let created = store
        .create_secret(namespace, &secret)
        .await
        .map_err(|e| Error::secret_write(namespace, &name, SecretOperation::Create, e))?;

    match created {
        CreateOutcome::Created => {
            info!(namespace = %namespace, secret = %name, "secret created");
            Ok(UpsertOutcome::Created)
        }
        CreateOutcome::AlreadyExists => {
            debug!(namespace = %namespace, secret = %name, "secret exists, replacing");
            store
                .replace_secret(namespace, &name, &secret)
                .await
                .map_err(|e| Error::secret_write(namespace, &name, SecretOperation::Update, e))?;
            info!(namespace = %namespace, secret = %name, "secret updated");
            Ok(UpsertOutcome::Updated)
        }
    }
}
