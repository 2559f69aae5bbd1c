//! Secret naming configuration for cloudcore trust material
//!
//! `SecretNames` binds the three secret names and five data keys once at
//! startup. It is an immutable value handed to the provisioner, so there is
//! no window where provisioning can run against unset names.
//!
//! The YAML layout mirrors cloudcore's `CloudSecret` config:
//!
//! ```yaml
//! tokenSecretName: tokensecret
//! tokenDataName: tokendata
//! caSecretName: casecret
//! caDataName: cadata
//! caKeyDataName: cakeydata
//! cloudCoreSecretName: cloudcoresecret
//! cloudCoreCertName: cloudcoredata
//! cloudCoreKeyDataName: cloudcorekeydata
//! ```
//!
//! Omitted keys fall back to the defaults above.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Names of the trust-material secrets and the data keys inside them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecretNames {
    /// Secret holding the join token
    #[serde(rename = "tokenSecretName")]
    pub token_secret: String,
    /// Data key of the join token
    #[serde(rename = "tokenDataName")]
    pub token_data: String,
    /// Secret holding the CA keypair
    #[serde(rename = "caSecretName")]
    pub ca_secret: String,
    /// Data key of the DER-encoded CA certificate
    #[serde(rename = "caDataName")]
    pub ca_data: String,
    /// Data key of the CA private key
    #[serde(rename = "caKeyDataName")]
    pub ca_key_data: String,
    /// Secret holding cloudcore's own TLS keypair
    #[serde(rename = "cloudCoreSecretName")]
    pub cloudcore_secret: String,
    /// Data key of the DER-encoded cloudcore certificate
    #[serde(rename = "cloudCoreCertName")]
    pub cloudcore_cert: String,
    /// Data key of the cloudcore private key
    #[serde(rename = "cloudCoreKeyDataName")]
    pub cloudcore_key_data: String,
}

impl Default for SecretNames {
    fn default() -> Self {
        Self {
            token_secret: "tokensecret".to_string(),
            token_data: "tokendata".to_string(),
            ca_secret: "casecret".to_string(),
            ca_data: "cadata".to_string(),
            ca_key_data: "cakeydata".to_string(),
            cloudcore_secret: "cloudcoresecret".to_string(),
            cloudcore_cert: "cloudcoredata".to_string(),
            cloudcore_key_data: "cloudcorekeydata".to_string(),
        }
    }
}

impl SecretNames {
    /// Parse names from a YAML document and validate them
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let names: SecretNames = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("failed to parse secret names: {}", e)))?;
        names.validate()?;
        Ok(names)
    }

    /// Reject empty names, shared secret names, and data keys that collide
    /// within one secret
    ///
    /// Every provision replaces its secret wholesale, so two materials under
    /// one secret name would overwrite each other.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(Error::config_field(field, "must not be empty"));
            }
        }

        let secrets = [
            ("tokenSecretName", &self.token_secret),
            ("caSecretName", &self.ca_secret),
            ("cloudCoreSecretName", &self.cloudcore_secret),
        ];
        for (i, (field, name)) in secrets.iter().enumerate() {
            if let Some((other, _)) = secrets[..i].iter().find(|(_, n)| n == name) {
                return Err(Error::config_field(
                    *field,
                    format!("must differ from {} ({})", other, name),
                ));
            }
        }

        if self.ca_data == self.ca_key_data {
            return Err(Error::config_field(
                "caKeyDataName",
                format!("must differ from caDataName ({})", self.ca_data),
            ));
        }
        if self.cloudcore_cert == self.cloudcore_key_data {
            return Err(Error::config_field(
                "cloudCoreKeyDataName",
                format!("must differ from cloudCoreCertName ({})", self.cloudcore_cert),
            ));
        }

        Ok(())
    }

    fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("tokenSecretName", self.token_secret.as_str()),
            ("tokenDataName", self.token_data.as_str()),
            ("caSecretName", self.ca_secret.as_str()),
            ("caDataName", self.ca_data.as_str()),
            ("caKeyDataName", self.ca_key_data.as_str()),
            ("cloudCoreSecretName", self.cloudcore_secret.as_str()),
            ("cloudCoreCertName", self.cloudcore_cert.as_str()),
            ("cloudCoreKeyDataName", self.cloudcore_key_data.as_str()),
        ]
    }
}

/// Load secret names from `path`, or the defaults when no path is given
pub fn load_secret_names(path: Option<&Path>) -> Result<SecretNames> {
    let Some(path) = path else {
        debug!("no secret names config given, using defaults");
        return Ok(SecretNames::default());
    };

    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "loaded secret names config");
    SecretNames::from_yaml(&data)
}
