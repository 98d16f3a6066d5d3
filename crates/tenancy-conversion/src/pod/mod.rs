//! Pod translation pipeline
//!
//! A host Pod is produced by folding an ordered list of [`PodRewriter`]s over
//! a copy of the tenant Pod. Each rewriter owns one concern; the first error
//! aborts the whole translation and the partially rewritten Pod is dropped.

mod affinity;
mod dns;
mod env;
mod extension;
mod secrets;

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{Pod, PodSpec, Service};
use tracing::{debug, instrument};

use crate::handle::ClusterHandle;
use tenancy_common::{MutationConfig, Result};

pub use dns::{
    dns_action, omit_duplicates, DnsAction, DNS_CLUSTER_FIRST, DNS_CLUSTER_FIRST_WITH_HOST_NET,
    DNS_DEFAULT, DNS_NONE, NDOTS,
};
pub use env::{
    control_plane_ip, is_control_plane_service, service_env_map, CONTROL_PLANE_HOSTNAMES,
    KUBERNETES_SERVICE_HOST,
};

/// What a rewriter may consult besides the Pod itself
pub struct PodContext<'a> {
    /// Tenant identity the Pod is translated for
    pub cluster: &'a str,
    /// Access to tenant clients and VirtualCluster configuration
    pub handle: &'a dyn ClusterHandle,
}

pub(crate) fn spec_mut(pod: &mut Pod) -> &mut PodSpec {
    pod.spec.get_or_insert_with(PodSpec::default)
}

/// One step of the Pod translation pipeline
#[derive(Clone, Copy, Debug)]
pub enum PodRewriter<'a> {
    /// Clear status and node binding
    ResetRuntimeState,
    /// Alias the tenant control plane as `kubernetes`
    HostAliases {
        /// Host-side services, including the tenant control-plane service
        services: &'a [Service],
    },
    /// Fold downward-API fields and inject service discovery variables
    ServiceEnv {
        /// Tenant Pod the downward-API values are read from
        tenant: &'a Pod,
        /// Host-side services projected into the environment
        services: &'a [Service],
    },
    /// Point secret volumes at their host-side copies
    SecretRefs {
        /// Tenant Pod whose volumes decide which mounts are renamed
        tenant: &'a Pod,
        /// Tenant secret name to host secret name
        secret_map: &'a BTreeMap<String, String>,
    },
    /// Label the Pod and scope its affinity terms to the tenant
    TenantLabel,
    /// Resolve names through the tenant cluster DNS
    Dns {
        /// Tenant Pod, for its namespace
        tenant: &'a Pod,
    },
    /// Drop `subdomain`
    ClearSubdomain,
    /// Attribute ReplicaSet-owned Pods to their Deployment
    ExtensionMeta {
        /// Tenant Pod carrying the owner references
        tenant: &'a Pod,
    },
    /// Force `automountServiceAccountToken: false` when `disable` is set
    AutomountServiceAccountToken {
        /// Whether to disable token automount
        disable: bool,
    },
    /// Force `enableServiceLinks: false` when `disable` is set
    ServiceLinks {
        /// Whether to disable service links
        disable: bool,
    },
}

impl<'a> PodRewriter<'a> {
    /// The standard translation, in the order it must run
    pub fn defaults(
        tenant: &'a Pod,
        secret_map: &'a BTreeMap<String, String>,
        services: &'a [Service],
    ) -> Vec<Self> {
        vec![
            Self::ResetRuntimeState,
            Self::HostAliases { services },
            Self::ServiceEnv { tenant, services },
            Self::SecretRefs { tenant, secret_map },
            Self::TenantLabel,
            Self::Dns { tenant },
            Self::ClearSubdomain,
        ]
    }

    /// Rewriters driven by operator configuration
    pub fn toggles(config: &MutationConfig) -> Vec<Self> {
        vec![
            Self::AutomountServiceAccountToken {
                disable: config.disable_service_account_token,
            },
            Self::ServiceLinks {
                disable: config.disable_pod_service_links,
            },
        ]
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResetRuntimeState => "reset-runtime-state",
            Self::HostAliases { .. } => "host-aliases",
            Self::ServiceEnv { .. } => "service-env",
            Self::SecretRefs { .. } => "secret-refs",
            Self::TenantLabel => "tenant-label",
            Self::Dns { .. } => "dns",
            Self::ClearSubdomain => "clear-subdomain",
            Self::ExtensionMeta { .. } => "extension-meta",
            Self::AutomountServiceAccountToken { .. } => "automount-service-account-token",
            Self::ServiceLinks { .. } => "service-links",
        }
    }

    /// Apply this rewriter to `pod`
    pub async fn apply(&self, ctx: &PodContext<'_>, pod: Pod) -> Result<Pod> {
        match *self {
            Self::ResetRuntimeState => Ok(reset_runtime_state(pod)),
            Self::HostAliases { services } => {
                Ok(env::inject_host_aliases(ctx.cluster, services, pod))
            }
            Self::ServiceEnv { tenant, services } => {
                Ok(env::inject_service_env(ctx.cluster, tenant, services, pod))
            }
            Self::SecretRefs { tenant, secret_map } => {
                Ok(secrets::rewrite_secret_refs(tenant, secret_map, pod))
            }
            Self::TenantLabel => Ok(affinity::inject_tenant_label(ctx.cluster, pod)),
            Self::Dns { tenant } => dns::rewrite_dns(ctx, tenant, pod).await,
            Self::ClearSubdomain => Ok(clear_subdomain(pod)),
            Self::ExtensionMeta { tenant } => extension::add_extension_meta(ctx, tenant, pod).await,
            Self::AutomountServiceAccountToken { disable } => {
                Ok(disable_automount_token(disable, pod))
            }
            Self::ServiceLinks { disable } => Ok(disable_service_links(disable, pod)),
        }
    }
}

fn reset_runtime_state(mut pod: Pod) -> Pod {
    pod.status = None;
    spec_mut(&mut pod).node_name = None;
    pod
}

fn clear_subdomain(mut pod: Pod) -> Pod {
    spec_mut(&mut pod).subdomain = None;
    pod
}

fn disable_automount_token(disable: bool, mut pod: Pod) -> Pod {
    if disable {
        spec_mut(&mut pod).automount_service_account_token = Some(false);
    }
    pod
}

fn disable_service_links(disable: bool, mut pod: Pod) -> Pod {
    if disable {
        spec_mut(&mut pod).enable_service_links = Some(false);
    }
    pod
}

/// Translates one host Pod for a tenant
pub struct PodMutator {
    cluster: String,
    handle: Arc<dyn ClusterHandle>,
    host: Pod,
}

impl PodMutator {
    /// Bind a host Pod copy to its tenant
    pub fn new(cluster: impl Into<String>, handle: Arc<dyn ClusterHandle>, host: Pod) -> Self {
        Self {
            cluster: cluster.into(),
            handle,
            host,
        }
    }

    /// Run `rewriters` in order over the host Pod
    ///
    /// Stops at the first failing rewriter.
    #[instrument(
        skip(self, rewriters),
        fields(cluster = %self.cluster, pod = ?self.host.metadata.name)
    )]
    pub async fn mutate(self, rewriters: &[PodRewriter<'_>]) -> Result<Pod> {
        let ctx = PodContext {
            cluster: &self.cluster,
            handle: self.handle.as_ref(),
        };

        let mut pod = self.host;
        for rewriter in rewriters {
            debug!(rewriter = rewriter.name(), "Applying pod rewriter");
            pod = rewriter.apply(&ctx, pod).await?;
        }
        Ok(pod)
    }
}
