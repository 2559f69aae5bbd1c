//! Idempotent namespace creation

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kubeedge_common::{Result, LABEL_MANAGED_BY, LABEL_MANAGED_BY_CLOUDCORE};
use tracing::{debug, info};

use crate::store::{CreateOutcome, ResourceStore};

/// Ensure `name` exists in the store.
///
/// Any lookup failure, not just not-found, falls through to a create. A
/// create that loses the race against another creator counts as success;
/// every other create failure is returned.
pub async fn ensure_namespace(store: &dyn ResourceStore, name: &str) -> Result<()> {
    match store.get_namespace(name).await {
        Ok(Some(_)) => {
            debug!(namespace = %name, "namespace already exists");
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => {
            debug!(namespace = %name, error = %e, "namespace lookup failed, trying create");
        }
    }

    match store.create_namespace(&namespace_object(name)).await? {
        CreateOutcome::Created => info!(namespace = %name, "namespace created"),
        CreateOutcome::AlreadyExists => {
            debug!(namespace = %name, "namespace created concurrently")
        }
    }
    Ok(())
}

fn namespace_object(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([(
                LABEL_MANAGED_BY.to_string(),
                LABEL_MANAGED_BY_CLOUDCORE.to_string(),
            )])),
            ..Default::default()
        },
        ..Default::default()
    }
}
