//! Common types for KubeEdge trust provisioning: errors, constants, config,
//! and tracing setup

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::SecretNames;
pub use error::{Error, SecretOperation};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace holding all cloudcore trust-material secrets (token, CA, TLS)
pub const KUBEEDGE_SYSTEM_NAMESPACE: &str = "kubeedge";

/// Secret type for uninterpreted binary payloads
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Standard Kubernetes label for the managing component
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on resources this workspace creates
pub const LABEL_MANAGED_BY_CLOUDCORE: &str = "cloudcore";
