//! Environment and control-plane alias rewriting
//!
//! Host Pods must see the same service discovery environment a tenant Pod
//! would see inside its own control plane, and must reach the tenant API
//! server under the usual `kubernetes` names.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::{Container, EnvVar, HostAlias, Pod, Service};
use tenancy_common::{host_namespace, CONTROL_PLANE_NAMESPACE, CONTROL_PLANE_SERVICE};

use crate::envvars;

/// Hostnames a workload expects for its control plane
pub const CONTROL_PLANE_HOSTNAMES: [&str; 3] =
    ["kubernetes", "kubernetes.default", "kubernetes.default.svc"];

/// Variable pointing tenant Pods at the aliased control plane
pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// Whether the service is the tenant's control-plane `kubernetes` service
///
/// Services are host-side, so the tenant's `default` namespace appears under
/// its prefixed host namespace.
pub fn is_control_plane_service(service: &Service, cluster: &str) -> bool {
    service.metadata.name.as_deref() == Some(CONTROL_PLANE_SERVICE)
        && service.metadata.namespace.as_deref()
            == Some(host_namespace(cluster, CONTROL_PLANE_NAMESPACE).as_str())
}

/// Cluster IP of the tenant control-plane service, if any
pub fn control_plane_ip<'a>(cluster: &str, services: &'a [Service]) -> Option<&'a str> {
    services
        .iter()
        .filter(|s| is_control_plane_service(s, cluster))
        .filter_map(envvars::cluster_ip)
        .last()
}

/// Project services into the Service Environment Map
///
/// The control-plane service is always projected. Other services in the
/// Pod's host namespace are projected only when service links are enabled.
pub fn service_env_map(
    namespace: &str,
    cluster: &str,
    enable_service_links: Option<bool>,
    services: &[Service],
) -> BTreeMap<String, String> {
    let links = enable_service_links.unwrap_or(false);
    let mut by_name: BTreeMap<&str, &Service> = BTreeMap::new();

    for service in services.iter().filter(|s| envvars::is_service_ip_set(s)) {
        let name = service.metadata.name.as_deref().unwrap_or_default();
        if is_control_plane_service(service, cluster) {
            by_name.entry(name).or_insert(service);
        } else if links && service.metadata.namespace.as_deref() == Some(namespace) {
            by_name.insert(name, service);
        }
    }

    let mut env: BTreeMap<String, String> = envvars::from_services(by_name.into_values())
        .into_iter()
        .map(|e| (e.name, e.value.unwrap_or_default()))
        .collect();
    // Tenant Pods resolve the API server through the host alias
    env.insert(KUBERNETES_SERVICE_HOST.to_string(), CONTROL_PLANE_SERVICE.to_string());
    env
}

/// Append the control-plane host alias
///
/// An unknown control-plane IP still produces an alias with an empty IP; the
/// Pod is then rejected by the host cluster instead of blocking translation.
pub(crate) fn inject_host_aliases(cluster: &str, services: &[Service], mut pod: Pod) -> Pod {
    let alias = HostAlias {
        ip: control_plane_ip(cluster, services).unwrap_or_default().to_string(),
        hostnames: Some(CONTROL_PLANE_HOSTNAMES.iter().map(|h| h.to_string()).collect()),
    };

    let aliases = super::spec_mut(&mut pod).host_aliases.get_or_insert_with(Vec::new);
    if !aliases.contains(&alias) {
        aliases.push(alias);
    }
    pod
}

/// Fold downward-API fields and merge service variables into every container
pub(crate) fn inject_service_env(
    cluster: &str,
    tenant: &Pod,
    services: &[Service],
    mut pod: Pod,
) -> Pod {
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();
    let spec = super::spec_mut(&mut pod);
    let service_env = service_env_map(&namespace, cluster, spec.enable_service_links, services);

    for container in spec.containers.iter_mut() {
        mutate_container_env(container, tenant, &service_env);
    }
    for container in spec.init_containers.iter_mut().flatten() {
        mutate_container_env(container, tenant, &service_env);
    }
    pod
}

/// Merge service variables without overwriting user-defined names
fn mutate_container_env(
    container: &mut Container,
    tenant: &Pod,
    service_env: &BTreeMap<String, String>,
) {
    let mut defined = BTreeSet::new();
    for var in container.env.iter_mut().flatten() {
        fold_downward_api_field(var, tenant);
        defined.insert(var.name.clone());
    }

    let injected: Vec<EnvVar> = service_env
        .iter()
        .filter(|(name, _)| !defined.contains(name.as_str()))
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            value_from: None,
        })
        .collect();

    if !injected.is_empty() {
        container.env.get_or_insert_with(Vec::new).extend(injected);
    }
}

/// Resolve `metadata.*` field references against the tenant Pod
///
/// Left unresolved, these would read the host Pod's metadata after
/// translation.
fn fold_downward_api_field(var: &mut EnvVar, tenant: &Pod) {
    let Some(field_path) = var
        .value_from
        .as_ref()
        .and_then(|from| from.field_ref.as_ref())
        .map(|field| field.field_path.as_str())
    else {
        return;
    };
    if !field_path.starts_with("metadata") {
        return;
    }

    match field_path {
        "metadata.name" => var.value = Some(tenant.metadata.name.clone().unwrap_or_default()),
        "metadata.namespace" => {
            var.value = Some(tenant.metadata.namespace.clone().unwrap_or_default())
        }
        "metadata.uid" => var.value = Some(tenant.metadata.uid.clone().unwrap_or_default()),
        _ => {}
    }
    var.value_from = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::tests::{container, host_service, tenant_pod};
    use k8s_openapi::api::core::v1::{EnvVarSource, ObjectFieldSelector, PodSpec};

    fn field_ref(name: &str, path: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    api_version: None,
                    field_path: path.to_string(),
                }),
                ..Default::default()
            }),
        }
    }

    fn env_value<'a>(c: &'a Container, name: &str) -> Option<&'a str> {
        c.env
            .as_ref()?
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.value.as_deref())
    }

    #[test]
    fn test_control_plane_service_detection() {
        let cp = host_service("tenant-a-default", "kubernetes", "10.96.0.1");
        let other_tenant = host_service("tenant-b-default", "kubernetes", "10.96.0.2");
        let plain = host_service("tenant-a-default", "web", "10.96.0.3");

        assert!(is_control_plane_service(&cp, "tenant-a"));
        assert!(!is_control_plane_service(&other_tenant, "tenant-a"));
        assert!(!is_control_plane_service(&plain, "tenant-a"));
        assert_eq!(
            control_plane_ip("tenant-a", &[plain, other_tenant, cp]),
            Some("10.96.0.1")
        );
    }

    #[test]
    fn test_service_env_map_respects_service_links() {
        let services = vec![
            host_service("tenant-a-default", "kubernetes", "10.96.0.1"),
            host_service("tenant-a-web", "api", "10.96.0.20"),
            host_service("tenant-a-other", "db", "10.96.0.30"),
        ];

        let without = service_env_map("tenant-a-web", "tenant-a", Some(false), &services);
        assert_eq!(without.get("KUBERNETES_SERVICE_PORT").map(String::as_str), Some("443"));
        assert!(!without.contains_key("API_SERVICE_HOST"));

        let with = service_env_map("tenant-a-web", "tenant-a", Some(true), &services);
        assert_eq!(with.get("API_SERVICE_HOST").map(String::as_str), Some("10.96.0.20"));
        assert!(!with.contains_key("DB_SERVICE_HOST"));

        // The alias name wins over the control-plane cluster IP
        assert_eq!(
            with.get(KUBERNETES_SERVICE_HOST).map(String::as_str),
            Some("kubernetes")
        );
    }

    #[test]
    fn test_user_env_is_never_overwritten() {
        let mut host = tenant_pod();
        host.spec = Some(PodSpec {
            containers: vec![container("main", vec![EnvVar {
                name: "KUBERNETES_SERVICE_HOST".to_string(),
                value: Some("custom".to_string()),
                value_from: None,
            }])],
            ..Default::default()
        });
        let tenant = host.clone();

        let services = vec![host_service("tenant-a-default", "kubernetes", "10.96.0.1")];
        let pod = inject_service_env("tenant-a", &tenant, &services, host);
        let main = &pod.spec.as_ref().expect("spec").containers[0];

        assert_eq!(env_value(main, "KUBERNETES_SERVICE_HOST"), Some("custom"));
        assert_eq!(env_value(main, "KUBERNETES_SERVICE_PORT"), Some("443"));
    }

    #[test]
    fn test_downward_api_fields_folded_to_tenant_values() {
        let tenant = tenant_pod();
        let mut host = tenant.clone();
        host.metadata.name = Some("host-name".to_string());
        host.metadata.namespace = Some("tenant-a-web".to_string());
        host.spec = Some(PodSpec {
            containers: vec![container(
                "main",
                vec![
                    field_ref("POD_NAME", "metadata.name"),
                    field_ref("POD_NAMESPACE", "metadata.namespace"),
                    field_ref("POD_UID", "metadata.uid"),
                    field_ref("NODE", "spec.nodeName"),
                ],
            )],
            init_containers: Some(vec![container(
                "init",
                vec![field_ref("POD_NAME", "metadata.name")],
            )]),
            ..Default::default()
        });

        let pod = inject_service_env("tenant-a", &tenant, &[], host);
        let spec = pod.spec.as_ref().expect("spec");
        let main = &spec.containers[0];

        assert_eq!(env_value(main, "POD_NAME"), Some("web-0"));
        assert_eq!(env_value(main, "POD_NAMESPACE"), Some("web"));
        assert_eq!(env_value(main, "POD_UID"), Some("tenant-uid-1"));
        let node = main
            .env
            .as_ref()
            .and_then(|e| e.iter().find(|v| v.name == "NODE"))
            .expect("NODE var");
        assert!(node.value_from.is_some(), "non-metadata refs stay dynamic");

        let init = &spec.init_containers.as_ref().expect("init")[0];
        assert_eq!(env_value(init, "POD_NAME"), Some("web-0"));
        assert!(init
            .env
            .as_ref()
            .expect("env")
            .iter()
            .all(|e| e.value_from.is_none()));
    }

    #[test]
    fn test_other_metadata_paths_lose_their_reference() {
        let tenant = tenant_pod();
        let mut var = field_ref("LABELS", "metadata.labels");
        fold_downward_api_field(&mut var, &tenant);
        assert!(var.value_from.is_none());
        assert!(var.value.is_none());
    }

    #[test]
    fn test_host_alias_is_not_duplicated() {
        let services = vec![host_service("tenant-a-default", "kubernetes", "10.96.0.1")];
        let pod = inject_host_aliases("tenant-a", &services, tenant_pod());
        let pod = inject_host_aliases("tenant-a", &services, pod);

        let aliases = pod
            .spec
            .as_ref()
            .and_then(|s| s.host_aliases.as_ref())
            .expect("aliases");
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].ip, "10.96.0.1");
        assert_eq!(
            aliases[0].hostnames.as_deref(),
            Some(
                &[
                    "kubernetes".to_string(),
                    "kubernetes.default".to_string(),
                    "kubernetes.default.svc".to_string()
                ][..]
            )
        );
    }

    #[test]
    fn test_host_alias_fails_open_without_control_plane() {
        let pod = inject_host_aliases("tenant-a", &[], tenant_pod());
        let aliases = pod
            .spec
            .as_ref()
            .and_then(|s| s.host_aliases.as_ref())
            .expect("aliases");
        assert_eq!(aliases[0].ip, "");
    }
}
