//! Trust material provisioning for cloudcore
//!
//! Builds the three Opaque secrets edge nodes bootstrap from (join token, CA
//! keypair, cloudcore TLS keypair) in the `kubeedge` namespace, and reads
//! them back. Payloads are stored as given; certificate and token formats
//! are the caller's concern.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kubeedge_common::{
    Result, SecretNames, KUBEEDGE_SYSTEM_NAMESPACE, LABEL_MANAGED_BY, LABEL_MANAGED_BY_CLOUDCORE,
    SECRET_TYPE_OPAQUE,
};
use tracing::instrument;

use crate::reader::{read_secret, secret_data};
use crate::store::ResourceStore;
use crate::upsert::{upsert_secret, UpsertOutcome};

/// A certificate and its private key as stored in a secret
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// DER-encoded certificate
    pub cert_der: Vec<u8>,
    /// Private key bytes
    pub key: Vec<u8>,
}

// Keys stay out of logs.
impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("cert_der", &format_args!("{} bytes", self.cert_der.len()))
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Build the join token secret
pub fn token_secret(names: &SecretNames, token: &[u8]) -> Secret {
    opaque_secret(&names.token_secret, [(&names.token_data, token)])
}

/// Build the CA keypair secret
pub fn ca_secret(names: &SecretNames, cert_der: &[u8], key: &[u8]) -> Secret {
    opaque_secret(
        &names.ca_secret,
        [(&names.ca_data, cert_der), (&names.ca_key_data, key)],
    )
}

/// Build the cloudcore TLS keypair secret
pub fn cloudcore_secret(names: &SecretNames, cert_der: &[u8], key: &[u8]) -> Secret {
    opaque_secret(
        &names.cloudcore_secret,
        [
            (&names.cloudcore_cert, cert_der),
            (&names.cloudcore_key_data, key),
        ],
    )
}

fn opaque_secret<const N: usize>(name: &str, fields: [(&String, &[u8]); N]) -> Secret {
    let data = fields
        .into_iter()
        .map(|(key, value)| (key.clone(), ByteString(value.to_vec())))
        .collect::<BTreeMap<_, _>>();

    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(KUBEEDGE_SYSTEM_NAMESPACE.to_string()),
            labels: Some(BTreeMap::from([(
                LABEL_MANAGED_BY.to_string(),
                LABEL_MANAGED_BY_CLOUDCORE.to_string(),
            )])),
            ..Default::default()
        },
        data: Some(data),
        type_: Some(SECRET_TYPE_OPAQUE.to_string()),
        ..Default::default()
    }
}

/// Provisions and reads back cloudcore trust material
///
/// Constructing one is the single initialization step for secret naming:
/// the names are validated here and never change afterwards. Safe to share
/// behind an `Arc` across concurrent bootstrap requests.
#[derive(Clone)]
pub struct TrustProvisioner {
    store: Arc<dyn ResourceStore>,
    names: SecretNames,
}

impl TrustProvisioner {
    /// Create a provisioner, rejecting invalid names
    pub fn new(store: Arc<dyn ResourceStore>, names: SecretNames) -> Result<Self> {
        names.validate()?;
        Ok(Self { store, names })
    }

    /// Names this provisioner writes under
    pub fn names(&self) -> &SecretNames {
        &self.names
    }

    /// Store the join token
    #[instrument(skip_all, fields(secret = %self.names.token_secret))]
    pub async fn provision_token_secret(&self, token: &[u8]) -> Result<UpsertOutcome> {
        self.upsert(token_secret(&self.names, token)).await
    }

    /// Store the CA certificate and key
    #[instrument(skip_all, fields(secret = %self.names.ca_secret))]
    pub async fn provision_ca_secret(
        &self,
        cert_der: &[u8],
        key: &[u8],
    ) -> Result<UpsertOutcome> {
        self.upsert(ca_secret(&self.names, cert_der, key)).await
    }

    /// Store cloudcore's TLS certificate and key
    #[instrument(skip_all, fields(secret = %self.names.cloudcore_secret))]
    pub async fn provision_cloudcore_secret(
        &self,
        cert_der: &[u8],
        key: &[u8],
    ) -> Result<UpsertOutcome> {
        self.upsert(cloudcore_secret(&self.names, cert_der, key)).await
    }

    /// Read the stored join token
    pub async fn read_token(&self) -> Result<Vec<u8>> {
        let secret = self.read(&self.names.token_secret).await?;
        Ok(secret_data(&secret, &self.names.token_data)?.to_vec())
    }

    /// Read the stored CA keypair
    pub async fn read_ca(&self) -> Result<KeyPair> {
        let secret = self.read(&self.names.ca_secret).await?;
        Ok(KeyPair {
            cert_der: secret_data(&secret, &self.names.ca_data)?.to_vec(),
            key: secret_data(&secret, &self.names.ca_key_data)?.to_vec(),
        })
    }

    /// Read the stored cloudcore keypair
    pub async fn read_cloudcore(&self) -> Result<KeyPair> {
        let secret = self.read(&self.names.cloudcore_secret).await?;
        Ok(KeyPair {
            cert_der: secret_data(&secret, &self.names.cloudcore_cert)?.to_vec(),
            key: secret_data(&secret, &self.names.cloudcore_key_data)?.to_vec(),
        })
    }

    async fn upsert(&self, secret: Secret) -> Result<UpsertOutcome> {
        upsert_secret(self.store.as_ref(), secret, KUBEEDGE_SYSTEM_NAMESPACE).await
    }

    async fn read(&self, name: &str) -> Result<Secret> {
        read_secret(self.store.as_ref(), name, KUBEEDGE_SYSTEM_NAMESPACE).await
    }
}

#[cfg(test)]
mod tests {
    use kubeedge_common::Error;

    use super::*;
    use crate::store::{CreateOutcome, MockResourceStore};
    use crate::testing::{api_error, MemoryStore};

    fn scenario_names() -> SecretNames {
        SecretNames {
            token_secret: "tokenSecret".to_string(),
            token_data: "token".to_string(),
            ..Default::default()
        }
    }

    fn data(secret: &Secret) -> BTreeMap<String, Vec<u8>> {
        secret
            .data
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect()
    }

    mod builders {
        use super::*;

        #[test]
        fn token_secret_layout() {
            let secret = token_secret(&scenario_names(), b"abc123");
            assert_eq!(secret.metadata.name.as_deref(), Some("tokenSecret"));
            assert_eq!(secret.metadata.namespace.as_deref(), Some("kubeedge"));
            assert_eq!(secret.type_.as_deref(), Some("Opaque"));
            assert_eq!(
                data(&secret),
                BTreeMap::from([("token".to_string(), b"abc123".to_vec())])
            );
        }

        #[test]
        fn ca_secret_layout() {
            let secret = ca_secret(&SecretNames::default(), b"cert", b"key");
            assert_eq!(secret.metadata.name.as_deref(), Some("casecret"));
            assert_eq!(
                data(&secret),
                BTreeMap::from([
                    ("cadata".to_string(), b"cert".to_vec()),
                    ("cakeydata".to_string(), b"key".to_vec()),
                ])
            );
        }

        #[test]
        fn cloudcore_secret_layout() {
            let secret = cloudcore_secret(&SecretNames::default(), b"cert", b"key");
            assert_eq!(secret.metadata.name.as_deref(), Some("cloudcoresecret"));
            assert_eq!(
                data(&secret),
                BTreeMap::from([
                    ("cloudcoredata".to_string(), b"cert".to_vec()),
                    ("cloudcorekeydata".to_string(), b"key".to_vec()),
                ])
            );
            let labels = secret.metadata.labels.expect("labels");
            assert_eq!(labels[LABEL_MANAGED_BY], LABEL_MANAGED_BY_CLOUDCORE);
        }

        #[test]
        fn payload_is_not_validated() {
            let secret = ca_secret(&SecretNames::default(), b"", b"not a key");
            assert_eq!(data(&secret)["cadata"], Vec::<u8>::new());
        }

        #[test]
        fn key_pair_debug_redacts_key() {
            let pair = KeyPair {
                cert_der: vec![1, 2, 3],
                key: b"secret-key".to_vec(),
            };
            let out = format!("{pair:?}");
            assert!(out.contains("3 bytes"));
            assert!(!out.contains("secret-key"));
        }
    }

    /// Provisioning against a store that behaves like the apiserver
    mod provisioning_flow {
        use super::*;

        fn provisioner(store: Arc<MemoryStore>, names: SecretNames) -> TrustProvisioner {
            TrustProvisioner::new(store, names).expect("valid names")
        }

        #[tokio::test]
        async fn token_scenario_creates_then_updates() {
            let store = Arc::new(MemoryStore::default());
            let p = provisioner(store.clone(), scenario_names());

            let first = p.provision_token_secret(b"abc123").await.expect("first");
            assert_eq!(first, UpsertOutcome::Created);
            assert_eq!(p.read_token().await.unwrap(), b"abc123");

            let second = p.provision_token_secret(b"def456").await.expect("second");
            assert_eq!(second, UpsertOutcome::Updated);

            let stored = read_secret(store.as_ref(), "tokenSecret", "kubeedge")
                .await
                .unwrap();
            assert_eq!(
                data(&stored),
                BTreeMap::from([("token".to_string(), b"def456".to_vec())])
            );

            let calls = store.calls();
            assert_eq!(calls.namespace_creates, 1);
            assert_eq!(calls.secret_creates, 2);
            assert_eq!(calls.secret_replaces, 1);
        }

        #[tokio::test]
        async fn same_payload_twice_is_idempotent() {
            let store = Arc::new(MemoryStore::default());
            let p = provisioner(store.clone(), SecretNames::default());

            p.provision_ca_secret(b"cert", b"key").await.unwrap();
            p.provision_ca_secret(b"cert", b"key").await.unwrap();

            assert_eq!(store.secret_count("kubeedge"), 1);
            let ca = p.read_ca().await.unwrap();
            assert_eq!(ca.cert_der, b"cert");
            assert_eq!(ca.key, b"key");
        }

        #[tokio::test]
        async fn different_payload_overwrites() {
            let store = Arc::new(MemoryStore::default());
            let p = provisioner(store.clone(), SecretNames::default());

            p.provision_cloudcore_secret(b"old-cert", b"old-key")
                .await
                .unwrap();
            p.provision_cloudcore_secret(b"new-cert", b"new-key")
                .await
                .unwrap();

            let pair = p.read_cloudcore().await.unwrap();
            assert_eq!(pair.cert_der, b"new-cert");
            assert_eq!(pair.key, b"new-key");
        }

        #[tokio::test]
        async fn all_three_secrets_share_one_namespace() {
            let store = Arc::new(MemoryStore::with_namespace("kubeedge"));
            let p = provisioner(store.clone(), SecretNames::default());

            p.provision_token_secret(b"t").await.unwrap();
            p.provision_ca_secret(b"c", b"k").await.unwrap();
            p.provision_cloudcore_secret(b"c", b"k").await.unwrap();

            assert_eq!(store.secret_count("kubeedge"), 3);
            assert_eq!(store.calls().namespace_creates, 0);
        }

        #[tokio::test]
        async fn read_before_provisioning_is_not_found() {
            let store = Arc::new(MemoryStore::default());
            let p = provisioner(store, SecretNames::default());

            let err = p.read_ca().await.unwrap_err();
            assert!(matches!(err, Error::SecretNotFound { .. }));
        }
    }

    #[test]
    fn empty_names_are_rejected_at_construction() {
        let names = SecretNames {
            token_secret: String::new(),
            ..Default::default()
        };
        let result = TrustProvisioner::new(Arc::new(MockResourceStore::new()), names);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn shared_secret_name_is_rejected_at_construction() {
        let names = SecretNames {
            cloudcore_secret: "casecret".to_string(),
            ..Default::default()
        };
        let store = MockResourceStore::new();
        let result = TrustProvisioner::new(Arc::new(store), names);
        assert!(matches!(
            result,
            Err(Error::Config { field: Some(ref f), .. }) if f == "cloudCoreSecretName"
        ));
    }

    #[tokio::test]
    async fn upsert_failure_is_surfaced_unchanged() {
        let mut store = MockResourceStore::new();
        store.expect_get_namespace().returning(|_| Ok(None));
        store
            .expect_create_namespace()
            .returning(|_| Ok(CreateOutcome::Created));
        store
            .expect_create_secret()
            .returning(|_, _| Err(api_error(413, "RequestEntityTooLarge")));
        store.expect_replace_secret().never();

        let p = TrustProvisioner::new(Arc::new(store), SecretNames::default()).unwrap();
        let err = p.provision_ca_secret(b"cert", b"key").await.unwrap_err();
        assert_eq!(err.namespace(), Some("kubeedge"));
        assert_eq!(err.secret(), Some("casecret"));
        assert!(!err.is_retryable());
    }
}
