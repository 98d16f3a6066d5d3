//! Service discovery environment variables
//!
//! Reproduces the variables the kubelet injects for every service visible to a
//! Pod: `{SVC}_SERVICE_HOST`, `{SVC}_SERVICE_PORT`, one
//! `{SVC}_SERVICE_PORT_{PORT}` per named port, and the Docker-link style
//! `{SVC}_PORT*` family.

use std::net::IpAddr;

use k8s_openapi::api::core::v1::{EnvVar, Service};

/// Cluster IP value marking a headless service
pub const CLUSTER_IP_NONE: &str = "None";

const DEFAULT_PROTOCOL: &str = "TCP";

/// Whether the service has a routable cluster IP
///
/// Headless services (`None`) and services without an allocated IP produce
/// no discovery variables.
pub fn is_service_ip_set(service: &Service) -> bool {
    cluster_ip(service).is_some()
}

/// The service cluster IP, if one is set
pub fn cluster_ip(service: &Service) -> Option<&str> {
    service
        .spec
        .as_ref()
        .and_then(|s| s.cluster_ip.as_deref())
        .filter(|ip| !ip.is_empty() && *ip != CLUSTER_IP_NONE)
}

/// Build discovery variables for the given services, in order
pub fn from_services<'a>(services: impl IntoIterator<Item = &'a Service>) -> Vec<EnvVar> {
    let mut result = Vec::new();

    for service in services {
        let Some(ip) = cluster_ip(service) else {
            continue;
        };
        let Some(ports) = service.spec.as_ref().and_then(|s| s.ports.as_ref()) else {
            continue;
        };
        let Some(first) = ports.first() else {
            continue;
        };
        let prefix = env_name(service.metadata.name.as_deref().unwrap_or_default());

        result.push(env(format!("{}_SERVICE_HOST", prefix), ip));

        // First port keeps the backwards-compatible unsuffixed name
        let port_name = format!("{}_SERVICE_PORT", prefix);
        result.push(env(port_name.clone(), first.port.to_string()));
        for port in ports {
            if let Some(name) = port.name.as_deref().filter(|n| !n.is_empty()) {
                result.push(env(
                    format!("{}_{}", port_name, env_name(name)),
                    port.port.to_string(),
                ));
            }
        }

        result.extend(link_variables(&prefix, ip, ports));
    }

    result
}

/// Docker-compatible link variables
fn link_variables(
    prefix: &str,
    ip: &str,
    ports: &[k8s_openapi::api::core::v1::ServicePort],
) -> Vec<EnvVar> {
    let mut all = Vec::new();

    for (i, port) in ports.iter().enumerate() {
        let protocol = port
            .protocol
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROTOCOL);
        let proto_lower = protocol.to_lowercase();
        let url = format!("{}://{}", proto_lower, join_host_port(ip, port.port));

        if i == 0 {
            all.push(env(format!("{}_PORT", prefix), url.clone()));
        }

        let port_prefix = format!("{}_PORT_{}_{}", prefix, port.port, protocol.to_uppercase());
        all.push(env(port_prefix.clone(), url));
        all.push(env(format!("{}_PROTO", port_prefix), proto_lower));
        all.push(env(format!("{}_PORT", port_prefix), port.port.to_string()));
        all.push(env(format!("{}_ADDR", port_prefix), ip));
    }

    all
}

/// Convert a service or port name into an environment variable name
fn env_name(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}

/// `host:port`, bracketing IPv6 literals
fn join_host_port(host: &str, port: i32) -> String {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{}]:{}", host, port),
        _ => format!("{}:{}", host, port),
    }
}

fn env(name: String, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name,
        value: Some(value.into()),
        value_from: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(name: &str, ip: &str, ports: Vec<ServicePort>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                cluster_ip: Some(ip.to_string()),
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn port(name: Option<&str>, number: i32, protocol: Option<&str>) -> ServicePort {
        ServicePort {
            name: name.map(str::to_string),
            port: number,
            protocol: protocol.map(str::to_string),
            ..Default::default()
        }
    }

    fn lookup<'a>(vars: &'a [EnvVar], name: &str) -> Option<&'a str> {
        vars.iter()
            .find(|v| v.name == name)
            .and_then(|v| v.value.as_deref())
    }

    #[test]
    fn test_single_unnamed_port() {
        let vars = from_services([&service("redis-master", "10.0.0.11", vec![port(None, 6379, None)])]);

        assert_eq!(lookup(&vars, "REDIS_MASTER_SERVICE_HOST"), Some("10.0.0.11"));
        assert_eq!(lookup(&vars, "REDIS_MASTER_SERVICE_PORT"), Some("6379"));
        assert_eq!(lookup(&vars, "REDIS_MASTER_PORT"), Some("tcp://10.0.0.11:6379"));
        assert_eq!(
            lookup(&vars, "REDIS_MASTER_PORT_6379_TCP"),
            Some("tcp://10.0.0.11:6379")
        );
        assert_eq!(lookup(&vars, "REDIS_MASTER_PORT_6379_TCP_PROTO"), Some("tcp"));
        assert_eq!(lookup(&vars, "REDIS_MASTER_PORT_6379_TCP_PORT"), Some("6379"));
        assert_eq!(lookup(&vars, "REDIS_MASTER_PORT_6379_TCP_ADDR"), Some("10.0.0.11"));
        assert_eq!(vars.len(), 7);
    }

    #[test]
    fn test_named_ports_and_udp() {
        let svc = service(
            "dns",
            "10.0.0.10",
            vec![port(Some("dns-tcp"), 53, Some("TCP")), port(Some("dns"), 53, Some("UDP"))],
        );
        let vars = from_services([&svc]);

        assert_eq!(lookup(&vars, "DNS_SERVICE_PORT"), Some("53"));
        assert_eq!(lookup(&vars, "DNS_SERVICE_PORT_DNS_TCP"), Some("53"));
        assert_eq!(lookup(&vars, "DNS_SERVICE_PORT_DNS"), Some("53"));
        assert_eq!(lookup(&vars, "DNS_PORT"), Some("tcp://10.0.0.10:53"));
        assert_eq!(lookup(&vars, "DNS_PORT_53_UDP"), Some("udp://10.0.0.10:53"));
        assert_eq!(lookup(&vars, "DNS_PORT_53_UDP_PROTO"), Some("udp"));
    }

    #[test]
    fn test_headless_and_unallocated_services_skipped() {
        let headless = service("headless", CLUSTER_IP_NONE, vec![port(None, 80, None)]);
        let pending = service("pending", "", vec![port(None, 80, None)]);
        assert!(from_services([&headless, &pending]).is_empty());
        assert!(!is_service_ip_set(&headless));
        assert!(!is_service_ip_set(&pending));
    }

    #[test]
    fn test_service_without_ports_skipped() {
        let svc = service("empty", "10.0.0.5", vec![]);
        assert!(from_services([&svc]).is_empty());
    }

    #[test]
    fn test_ipv6_address_bracketed() {
        let svc = service("v6", "fd00::1", vec![port(None, 443, None)]);
        let vars = from_services([&svc]);
        assert_eq!(lookup(&vars, "V6_PORT"), Some("tcp://[fd00::1]:443"));
        assert_eq!(lookup(&vars, "V6_SERVICE_HOST"), Some("fd00::1"));
    }
}
