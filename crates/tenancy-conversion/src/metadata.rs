//! Host-side object metadata
//!
//! The mutators rewrite an object that already lives in the host namespace.
//! These helpers produce that starting copy from a tenant object.

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use tenancy_common::host_namespace;
use tenancy_common::labels::{LABEL_CLUSTER, LABEL_NAMESPACE, LABEL_UID};

/// Build the metadata of a host object from its tenant counterpart
///
/// Name, labels, annotations and generate-name carry over. Everything the
/// host API server assigns on its own is dropped.
pub fn build_host_metadata(cluster: &str, tenant: &ObjectMeta) -> ObjectMeta {
    let tenant_namespace = tenant.namespace.clone().unwrap_or_default();

    let mut annotations = tenant.annotations.clone().unwrap_or_default();
    annotations.insert(LABEL_CLUSTER.to_string(), cluster.to_string());
    annotations.insert(LABEL_NAMESPACE.to_string(), tenant_namespace.clone());
    annotations.insert(
        LABEL_UID.to_string(),
        tenant.uid.clone().unwrap_or_default(),
    );

    ObjectMeta {
        name: tenant.name.clone(),
        generate_name: tenant.generate_name.clone(),
        namespace: Some(host_namespace(cluster, &tenant_namespace)),
        labels: tenant.labels.clone(),
        annotations: Some(annotations),
        ..Default::default()
    }
}

/// Copy a tenant object with host-side metadata
pub fn build_host_object<K>(cluster: &str, tenant: &K) -> K
where
    K: Resource + Clone,
{
    let mut host = tenant.clone();
    *host.meta_mut() = build_host_metadata(cluster, tenant.meta());
    host
}

/// Copy a tenant Pod with host-side metadata and no status
pub fn build_host_pod(cluster: &str, tenant: &Pod) -> Pod {
    let mut host = build_host_object(cluster, tenant);
    host.status = None;
    host
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodStatus, Service};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use std::collections::BTreeMap;

    fn tenant_meta() -> ObjectMeta {
        ObjectMeta {
            name: Some("web-0".to_string()),
            namespace: Some("web".to_string()),
            uid: Some("tenant-uid-1".to_string()),
            resource_version: Some("42".to_string()),
            labels: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
            annotations: Some(BTreeMap::from([("team".to_string(), "a".to_string())])),
            owner_references: Some(vec![OwnerReference {
                kind: "ReplicaSet".to_string(),
                name: "web-5d4f".to_string(),
                ..Default::default()
            }]),
            finalizers: Some(vec!["example.com/cleanup".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_host_metadata_is_prefixed_and_attributed() {
        let meta = build_host_metadata("tenant-a", &tenant_meta());

        assert_eq!(meta.name.as_deref(), Some("web-0"));
        assert_eq!(meta.namespace.as_deref(), Some("tenant-a-web"));
        assert_eq!(meta.labels, tenant_meta().labels);

        let annotations = meta.annotations.as_ref().expect("annotations");
        assert_eq!(annotations.get("team").map(String::as_str), Some("a"));
        assert_eq!(annotations.get(LABEL_CLUSTER).map(String::as_str), Some("tenant-a"));
        assert_eq!(annotations.get(LABEL_NAMESPACE).map(String::as_str), Some("web"));
        assert_eq!(
            annotations.get(LABEL_UID).map(String::as_str),
            Some("tenant-uid-1")
        );
    }

    #[test]
    fn test_server_assigned_fields_dropped() {
        let meta = build_host_metadata("tenant-a", &tenant_meta());
        assert!(meta.uid.is_none());
        assert!(meta.resource_version.is_none());
        assert!(meta.owner_references.is_none());
        assert!(meta.finalizers.is_none());
    }

    #[test]
    fn test_host_pod_has_no_status() {
        let tenant = Pod {
            metadata: tenant_meta(),
            spec: Some(Default::default()),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                ..Default::default()
            }),
        };
        let host = build_host_pod("tenant-a", &tenant);
        assert!(host.status.is_none());
        assert_eq!(host.spec, tenant.spec);
        assert_eq!(host.metadata.namespace.as_deref(), Some("tenant-a-web"));
    }

    #[test]
    fn test_generic_copy_keeps_spec() {
        let tenant = Service {
            metadata: tenant_meta(),
            ..Default::default()
        };
        let host = build_host_object("tenant-b", &tenant);
        assert_eq!(host.spec, tenant.spec);
        assert_eq!(host.metadata.namespace.as_deref(), Some("tenant-b-web"));
    }
}
