//! Service translation

use k8s_openapi::api::core::v1::Service;
use tenancy_common::labels::LABEL_CLUSTER_IP;

use crate::envvars;

/// Translates one host Service
///
/// Cluster IPs and node ports are allocated by the host cluster, so the
/// tenant's values are dropped. The tenant cluster IP is kept as an
/// annotation for the reverse direction.
pub struct ServiceMutator {
    host: Service,
}

impl ServiceMutator {
    /// Wrap the host Service copy
    pub fn new(host: Service) -> Self {
        Self { host }
    }

    /// Produce the host Service
    pub fn mutate(self, tenant: &Service) -> Service {
        let mut service = self.host;

        if let Some(ip) = envvars::cluster_ip(tenant) {
            service
                .metadata
                .annotations
                .get_or_insert_with(Default::default)
                .insert(LABEL_CLUSTER_IP.to_string(), ip.to_string());
            if let Some(spec) = service.spec.as_mut() {
                spec.cluster_ip = None;
                spec.cluster_ips = None;
            }
        }

        let ports = service.spec.as_mut().and_then(|s| s.ports.as_mut());
        for port in ports.into_iter().flatten() {
            port.node_port = Some(0);
        }

        service
    }
}
