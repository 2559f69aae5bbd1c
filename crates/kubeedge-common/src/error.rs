//! Error types for trust-material provisioning
//!
//! Errors carry the namespace and secret they concern so a failed bootstrap
//! step can be traced back to the exact resource. A secret that already
//! exists is not an error: the upserter absorbs it into an update.

use std::fmt;

use thiserror::Error;

/// Write operation that failed against the secret store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOperation {
    /// Initial create call
    Create,
    /// Fallback full replace after a create conflict
    Update,
}

impl fmt::Display for SecretOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretOperation::Create => f.write_str("create"),
            SecretOperation::Update => f.write_str("update"),
        }
    }
}

/// Main error type for trust provisioning operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Could not obtain a usable store client
    #[error("failed to create kubernetes client [{context}]: {message}")]
    ClientConnection {
        /// Description of what failed
        message: String,
        /// Step that failed (e.g., "read_kubeconfig", "infer_config")
        context: String,
    },

    /// Namespace creation failed for a reason other than already-exists
    #[error("failed to create namespace {namespace}: {source}")]
    NamespaceCreation {
        /// Namespace that could not be ensured
        namespace: String,
        /// Underlying store failure
        #[source]
        source: Box<Error>,
    },

    /// Secret create (non-conflict) or fallback update failed
    #[error("failed to {operation} secret {namespace}/{name}: {source}")]
    SecretWrite {
        /// Namespace of the secret
        namespace: String,
        /// Name of the secret
        name: String,
        /// Which write failed
        operation: SecretOperation,
        /// Underlying store failure
        #[source]
        source: Box<Error>,
    },

    /// Secret handed to the upserter has no `metadata.name`
    #[error("secret written to namespace {namespace} has no name")]
    UnnamedSecret {
        /// Namespace the secret was meant for
        namespace: String,
    },

    /// Secret lookup found nothing
    #[error("secret {namespace}/{name} not found")]
    SecretNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Name of the missing secret
        name: String,
    },

    /// Secret exists but lacks the requested data key
    #[error("secret {namespace}/{name} missing key {key}")]
    MissingSecretKey {
        /// Namespace of the secret
        namespace: String,
        /// Name of the secret
        name: String,
        /// Data key that was absent
        key: String,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
        /// Offending config field (e.g., "tokenSecretName")
        field: Option<String>,
    },
}

impl Error {
    /// Create a client connection error with context
    pub fn client_connection(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ClientConnection {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Wrap a store failure raised while ensuring `namespace`
    pub fn namespace_creation(namespace: impl Into<String>, source: Error) -> Self {
        Self::NamespaceCreation {
            namespace: namespace.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a store failure raised while writing `namespace/name`
    pub fn secret_write(
        namespace: impl Into<String>,
        name: impl Into<String>,
        operation: SecretOperation,
        source: Error,
    ) -> Self {
        Self::SecretWrite {
            namespace: namespace.into(),
            name: name.into(),
            operation,
            source: Box::new(source),
        }
    }

    /// Create an error for a nameless secret bound for `namespace`
    pub fn unnamed_secret(namespace: impl Into<String>) -> Self {
        Self::UnnamedSecret {
            namespace: namespace.into(),
        }
    }

    /// Create a not-found error for `namespace/name`
    pub fn secret_not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::SecretNotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a missing-key error for `namespace/name`
    pub fn missing_secret_key(
        namespace: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::MissingSecretKey {
            namespace: namespace.into(),
            name: name.into(),
            key: key.into(),
        }
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a configuration error for a specific field
    pub fn config_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Check if this error is likely transient
    ///
    /// Nothing here retries internally; this lets the bootstrap caller decide
    /// whether re-running the whole step is worthwhile.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::ClientConnection { .. } => true,
            Error::NamespaceCreation { source, .. } => source.is_retryable(),
            Error::SecretWrite { source, .. } => source.is_retryable(),
            Error::UnnamedSecret { .. } => false,
            Error::SecretNotFound { .. } => false,
            Error::MissingSecretKey { .. } => false,
            Error::Config { .. } => false,
        }
    }

    /// Namespace this error concerns, if any
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Error::NamespaceCreation { namespace, .. }
            | Error::SecretWrite { namespace, .. }
            | Error::UnnamedSecret { namespace }
            | Error::SecretNotFound { namespace, .. }
            | Error::MissingSecretKey { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    /// Secret name this error concerns, if any
    pub fn secret(&self) -> Option<&str> {
        match self {
            Error::SecretWrite { name, .. }
            | Error::SecretNotFound { name, .. }
            | Error::MissingSecretKey { name, .. } => Some(name),
            _ => None,
        }
    }
}
