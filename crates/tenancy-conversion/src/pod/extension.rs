//! Deployment attribution for ReplicaSet-owned Pods

use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use super::PodContext;
use tenancy_common::labels::{LABEL_EXTEND_DEPLOYMENT_NAME, LABEL_EXTEND_DEPLOYMENT_UID};
use tenancy_common::{Error, Result};

const REPLICA_SET_KIND: &str = "ReplicaSet";

/// Label the host Pod with the Deployment owning its tenant ReplicaSet
///
/// Only Pods whose first owner is a ReplicaSet are considered. A standalone
/// ReplicaSet leaves the Pod unchanged.
pub(crate) async fn add_extension_meta(
    ctx: &PodContext<'_>,
    tenant: &Pod,
    mut pod: Pod,
) -> Result<Pod> {
    let Some(owner) = tenant
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
        .filter(|owner| owner.kind == REPLICA_SET_KIND)
    else {
        return Ok(pod);
    };

    let namespace = tenant.metadata.namespace.as_deref().unwrap_or_default();
    let client = ctx.handle.tenant_client(ctx.cluster)?;
    let replica_set = client
        .get_replica_set(namespace, &owner.name)
        .await
        .map_err(|e| match e {
            e @ Error::DependencyFetch { .. } => e,
            other => Error::dependency_fetch(
                ctx.cluster,
                REPLICA_SET_KIND,
                namespace,
                &owner.name,
                other.to_string(),
            ),
        })?;

    let Some(deployment) = replica_set
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
    else {
        debug!(
            cluster = %ctx.cluster,
            replica_set = %owner.name,
            "Standalone ReplicaSet, no extension metadata"
        );
        return Ok(pod);
    };

    let labels = pod.metadata.labels.get_or_insert_with(Default::default);
    labels.insert(
        LABEL_EXTEND_DEPLOYMENT_NAME.to_string(),
        deployment.name.clone(),
    );
    labels.insert(
        LABEL_EXTEND_DEPLOYMENT_UID.to_string(),
        deployment.uid.clone(),
    );
    Ok(pod)
}
