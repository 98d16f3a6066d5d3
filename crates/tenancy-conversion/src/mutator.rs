//! Translation entry point

use std::sync::Arc;

use k8s_openapi::api::core::v1::{Pod, Secret, Service};

use crate::handle::ClusterHandle;
use crate::pod::PodMutator;
use crate::secret::SecretMutator;
use crate::service::ServiceMutator;

/// Bind a controller handle and tenant identity
///
/// ```ignore
/// let pod = vc(handle, "tenant-a")
///     .pod(host)
///     .mutate(&PodRewriter::defaults(&tenant, &secret_map, &services))
///     .await?;
/// ```
pub fn vc(handle: Arc<dyn ClusterHandle>, cluster: impl Into<String>) -> VcMutator {
    VcMutator {
        handle,
        cluster: cluster.into(),
    }
}

/// Per-tenant factory for object mutators
#[derive(Clone)]
pub struct VcMutator {
    handle: Arc<dyn ClusterHandle>,
    cluster: String,
}

impl VcMutator {
    /// Tenant identity this factory is bound to
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Mutator for a host Pod copy
    pub fn pod(&self, host: Pod) -> PodMutator {
        PodMutator::new(self.cluster.clone(), self.handle.clone(), host)
    }

    /// Mutator for a host Service copy
    pub fn service(&self, host: Service) -> ServiceMutator {
        ServiceMutator::new(host)
    }

    /// Mutator for a host service-account token Secret copy
    pub fn service_account_token_secret(&self, host: Secret) -> SecretMutator {
        SecretMutator::new(host)
    }
}
