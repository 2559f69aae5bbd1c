//! Reading provisioned secrets back

use k8s_openapi::api::core::v1::Secret;
use kubeedge_common::{Error, Result};

use crate::store::ResourceStore;

const UNKNOWN: &str = "<unknown>";

/// Fetch `namespace/name`, failing with [`Error::SecretNotFound`] if absent.
///
/// A direct store lookup on every call; nothing is cached.
pub async fn read_secret(
    store: &dyn ResourceStore,
    name: &str,
    namespace: &str,
) -> Result<Secret> {
    store
        .get_secret(name, namespace)
        .await?
        .ok_or_else(|| Error::secret_not_found(namespace, name))
}

/// Borrow one data field of `secret`
///
/// The error names the secret from its metadata, or `<unknown>` for a part
/// the metadata lacks.
pub fn secret_data<'a>(secret: &'a Secret, key: &str) -> Result<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| v.0.as_slice())
        .ok_or_else(|| {
            Error::missing_secret_key(
                secret.metadata.namespace.as_deref().unwrap_or(UNKNOWN),
                secret.metadata.name.as_deref().unwrap_or(UNKNOWN),
                key,
            )
        })
}
