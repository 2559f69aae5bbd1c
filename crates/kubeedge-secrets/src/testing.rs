//! In-memory [`ResourceStore`] for exercising the full provisioning flow

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kubeedge_common::{Error, Result};

use crate::store::{CreateOutcome, ResourceStore};

/// Build the error the apiserver would return for `code`/`reason`
pub(crate) fn api_error(code: u16, reason: &str) -> Error {
    Error::from(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} (test)", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// Number of store calls by kind
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub namespace_creates: usize,
    pub secret_creates: usize,
    pub secret_replaces: usize,
}

#[derive(Default)]
struct State {
    namespaces: BTreeSet<String>,
    secrets: BTreeMap<(String, String), Secret>,
    calls: CallCounts,
}

/// Store keeping namespaces and secrets in memory with apiserver semantics
/// for create conflicts and full-object replace
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_namespace(name: &str) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().namespaces.insert(name.to_string());
        store
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.state.lock().unwrap().namespaces.contains(name)
    }

    pub fn secret_count(&self, namespace: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .secrets
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .count()
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let state = self.state.lock().unwrap();
        Ok(state.namespaces.get(name).map(|n| {
            let mut ns = Namespace::default();
            ns.metadata.name = Some(n.clone());
            ns
        }))
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<CreateOutcome> {
        let mut state = self.state.lock().unwrap();
        state.calls.namespace_creates += 1;
        let name = namespace.metadata.name.clone().unwrap_or_default();
        if state.namespaces.insert(name) {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::AlreadyExists)
        }
    }

    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<CreateOutcome> {
        let mut state = self.state.lock().unwrap();
        state.calls.secret_creates += 1;
        if !state.namespaces.contains(namespace) {
            return Err(api_error(404, "NotFound"));
        }
        let key = (
            namespace.to_string(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        if state.secrets.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        state.secrets.insert(key, secret.clone());
        Ok(CreateOutcome::Created)
    }

    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.secret_replaces += 1;
        let key = (namespace.to_string(), name.to_string());
        match state.secrets.get_mut(&key) {
            Some(stored) => {
                *stored = secret.clone();
                Ok(())
            }
            None => Err(api_error(404, "NotFound")),
        }
    }
}
