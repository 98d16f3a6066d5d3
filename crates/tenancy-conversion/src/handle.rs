//! Access to tenant clusters and their configuration
//!
//! The translation engine never talks to the API server directly. It goes
//! through a [`ClusterHandle`] provided by the multi-cluster controller, which
//! hands out per-tenant clients and resolves VirtualCluster configuration.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use kube::api::Api;
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use tenancy_common::crd::{VirtualCluster, VirtualClusterSpec};
use tenancy_common::{Error, Result};

// =============================================================================
// Traits for dependency injection and testability
// =============================================================================

/// Client for a single tenant control plane
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TenantClient: Send + Sync {
    /// Get a ReplicaSet from the tenant control plane
    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet>;
}

/// Handle onto the multi-cluster controller
///
/// This trait allows mocking cluster access in tests while using
/// the real clients in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    /// Get the client for a tenant cluster
    fn tenant_client(&self, cluster: &str) -> Result<Arc<dyn TenantClient>>;

    /// Fetch the VirtualCluster configuration for a tenant cluster
    async fn virtual_cluster(&self, cluster: &str) -> Result<VirtualClusterSpec>;
}

// =============================================================================
// kube-rs implementations
// =============================================================================

/// Tenant client backed by a kube-rs `Client`
pub struct KubeTenantClient {
    client: Client,
}

impl KubeTenantClient {
    /// Create a new KubeTenantClient wrapping the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TenantClient for KubeTenantClient {
    async fn get_replica_set(&self, namespace: &str, name: &str) -> Result<ReplicaSet> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }
}

/// Where a tenant's control plane and VirtualCluster object live
#[derive(Clone)]
pub struct TenantRegistration {
    /// Client for the tenant control plane
    pub client: Client,
    /// Host-cluster namespace of the VirtualCluster object
    pub namespace: String,
    /// Name of the VirtualCluster object
    pub name: String,
}

/// Cluster handle backed by kube-rs clients
///
/// The tenant set is fixed at construction; the controller builds a new
/// handle when tenants come and go.
pub struct KubeClusterHandle {
    host: Client,
    tenants: BTreeMap<String, TenantRegistration>,
}

impl KubeClusterHandle {
    /// Create a handle reading VirtualCluster objects through `host`
    pub fn new(host: Client) -> Self {
        Self {
            host,
            tenants: BTreeMap::new(),
        }
    }

    /// Register a tenant cluster
    pub fn with_tenant(
        mut self,
        cluster: impl Into<String>,
        registration: TenantRegistration,
    ) -> Self {
        self.tenants.insert(cluster.into(), registration);
        self
    }

    fn registration(&self, cluster: &str) -> Option<&TenantRegistration> {
        self.tenants.get(cluster)
    }
}

#[async_trait]
impl ClusterHandle for KubeClusterHandle {
    fn tenant_client(&self, cluster: &str) -> Result<Arc<dyn TenantClient>> {
        let registration = self
            .registration(cluster)
            .ok_or_else(|| Error::client_unavailable(cluster, "cluster not registered"))?;
        Ok(Arc::new(KubeTenantClient::new(registration.client.clone())))
    }

    async fn virtual_cluster(&self, cluster: &str) -> Result<VirtualClusterSpec> {
        let registration = self
            .registration(cluster)
            .ok_or_else(|| Error::config_missing(cluster, "cluster not registered"))?;

        let api: Api<VirtualCluster> =
            Api::namespaced(self.host.clone(), &registration.namespace);
        let vc = api.get(&registration.name).await.map_err(|e| {
            Error::config_missing(
                cluster,
                format!(
                    "failed to get VirtualCluster {}/{}: {}",
                    registration.namespace, registration.name, e
                ),
            )
        })?;

        debug!(
            cluster = %cluster,
            domain = ?vc.spec.cluster_domain(),
            dns = ?vc.spec.cluster_dns(),
            "Resolved VirtualCluster configuration"
        );
        Ok(vc.spec)
    }
}
