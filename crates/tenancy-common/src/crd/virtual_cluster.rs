//! VirtualCluster CRD
//!
//! A VirtualCluster describes one tenant control plane. The translation engine
//! only reads the DNS-related fields; provisioning is handled elsewhere.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// VirtualCluster describes a tenant control plane backed by the host cluster.
///
/// Example:
/// ```yaml
/// apiVersion: tenancy.x-k8s.io/v1alpha1
/// kind: VirtualCluster
/// metadata:
///   name: tenant-a
///   namespace: tenants
/// spec:
///   clusterDomain: cluster.local
///   clusterDNS: 10.32.0.10
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "tenancy.x-k8s.io",
    version = "v1alpha1",
    kind = "VirtualCluster",
    namespaced,
    status = "VirtualClusterStatus",
    shortname = "vc",
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.clusterDomain"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualClusterSpec {
    /// DNS domain of the tenant cluster (e.g., "cluster.local")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_domain: Option<String>,

    /// Address of the tenant's cluster DNS service
    #[serde(
        default,
        rename = "clusterDNS",
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_dns: Option<String>,

    /// Name of the ClusterVersion the tenant control plane was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_version_name: Option<String>,
}

impl VirtualClusterSpec {
    /// Cluster domain, treating an empty string as unset
    pub fn cluster_domain(&self) -> Option<&str> {
        self.cluster_domain.as_deref().filter(|d| !d.is_empty())
    }

    /// Cluster DNS address, treating an empty string as unset
    pub fn cluster_dns(&self) -> Option<&str> {
        self.cluster_dns.as_deref().filter(|d| !d.is_empty())
    }
}

/// VirtualCluster status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualClusterStatus {
    /// Current phase
    #[serde(default)]
    pub phase: VirtualClusterPhase,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// VirtualCluster phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum VirtualClusterPhase {
    /// Control plane is being created
    #[default]
    Pending,
    /// Control plane is serving
    Running,
    /// Control plane failed to come up
    Error,
}
