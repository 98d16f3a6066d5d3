//! DNS policy rewriting
//!
//! Host Pods must resolve names through the tenant's cluster DNS, not the
//! host cluster's. Cluster-first policies are therefore replaced by an
//! explicit `None` policy pointing at the tenant DNS service.
//!
//! | policy                    | hostNetwork | result                     |
//! |---------------------------|-------------|----------------------------|
//! | `None`                    | any         | unchanged                  |
//! | `ClusterFirstWithHostNet` | any         | cluster-first rewrite      |
//! | `ClusterFirst`            | false       | cluster-first rewrite      |
//! | `ClusterFirst`            | true        | unchanged (acts `Default`) |
//! | `Default`                 | any         | unchanged                  |
//! | unset or unknown          | any         | unchanged                  |
//!
//! The VirtualCluster configuration is resolved for every Pod, whatever its
//! policy. A tenant without one cannot have Pods translated.

use std::collections::HashSet;

use k8s_openapi::api::core::v1::{Pod, PodDNSConfig, PodDNSConfigOption};
use tracing::warn;

use super::PodContext;
use tenancy_common::Result;

/// Explicit DNS configuration
pub const DNS_NONE: &str = "None";
/// Cluster DNS, also for host-network Pods
pub const DNS_CLUSTER_FIRST_WITH_HOST_NET: &str = "ClusterFirstWithHostNet";
/// Cluster DNS unless on the host network
pub const DNS_CLUSTER_FIRST: &str = "ClusterFirst";
/// Inherit the node's resolver
pub const DNS_DEFAULT: &str = "Default";

/// `ndots` pinned on rewritten Pods
pub const NDOTS: &str = "5";

/// Outcome of evaluating the DNS state machine for a Pod
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DnsAction {
    /// Leave the Pod's DNS settings alone
    Keep,
    /// Point the Pod at the tenant cluster DNS
    ClusterFirst,
}

/// Decide what to do with a Pod's DNS policy
pub fn dns_action(policy: Option<&str>, host_network: bool) -> DnsAction {
    let Some(policy) = policy else {
        return DnsAction::Keep;
    };
    match policy {
        DNS_NONE => DnsAction::Keep,
        DNS_CLUSTER_FIRST_WITH_HOST_NET => DnsAction::ClusterFirst,
        DNS_CLUSTER_FIRST if !host_network => DnsAction::ClusterFirst,
        // Host-network pods fall back to the node resolver
        DNS_CLUSTER_FIRST => DnsAction::Keep,
        DNS_DEFAULT => DnsAction::Keep,
        _ => DnsAction::Keep,
    }
}

/// Rewrite the host Pod's DNS policy against the tenant configuration
pub(crate) async fn rewrite_dns(ctx: &PodContext<'_>, tenant: &Pod, mut pod: Pod) -> Result<Pod> {
    let vc = ctx.handle.virtual_cluster(ctx.cluster).await?;

    let spec = super::spec_mut(&mut pod);
    let action = dns_action(spec.dns_policy.as_deref(), spec.host_network.unwrap_or(false));
    if action == DnsAction::Keep {
        return Ok(pod);
    }

    let namespace = tenant.metadata.namespace.as_deref().unwrap_or_default();
    Ok(cluster_first_dns(
        ctx.cluster,
        namespace,
        vc.cluster_domain(),
        vc.cluster_dns(),
        pod,
    ))
}

/// Apply the cluster-first rewrite
///
/// Without a nameserver the Pod degrades to `Default` instead of failing.
pub(crate) fn cluster_first_dns(
    cluster: &str,
    namespace: &str,
    cluster_domain: Option<&str>,
    nameserver: Option<&str>,
    mut pod: Pod,
) -> Pod {
    let pod_name = pod.metadata.name.clone();
    let spec = super::spec_mut(&mut pod);

    let Some(nameserver) = nameserver else {
        warn!(
            cluster = %cluster,
            pod = ?pod_name,
            "vc has no ClusterDNS IP configured and cannot use {} policy, falling back to {}",
            DNS_CLUSTER_FIRST,
            DNS_DEFAULT
        );
        spec.dns_policy = Some(DNS_DEFAULT.to_string());
        return pod;
    };

    let mut nameservers = vec![nameserver.to_string()];
    let mut searches = match cluster_domain {
        Some(domain) => vec![
            format!("{}.svc.{}", namespace, domain),
            format!("svc.{}", domain),
            domain.to_string(),
        ],
        None => Vec::new(),
    };

    if let Some(existing) = spec.dns_config.as_ref() {
        nameservers.extend(existing.nameservers.iter().flatten().cloned());
        searches.extend(existing.searches.iter().flatten().cloned());
    }

    spec.dns_policy = Some(DNS_NONE.to_string());
    spec.dns_config = Some(PodDNSConfig {
        nameservers: non_empty(omit_duplicates(nameservers)),
        searches: non_empty(omit_duplicates(searches)),
        options: Some(vec![PodDNSConfigOption {
            name: Some("ndots".to_string()),
            value: Some(NDOTS.to_string()),
        }]),
    });
    pod
}

/// Remove repeated entries, keeping the first occurrence of each
pub fn omit_duplicates(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}
