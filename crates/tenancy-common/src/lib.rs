//! Common types for tenancy: VirtualCluster CRD, labels, errors, and utilities

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod labels;
pub mod telemetry;

pub use config::MutationConfig;
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Tenant namespace holding the control-plane `kubernetes` service
pub const CONTROL_PLANE_NAMESPACE: &str = "default";

/// Name of the control-plane service inside [`CONTROL_PLANE_NAMESPACE`]
pub const CONTROL_PLANE_SERVICE: &str = "kubernetes";

/// Map a tenant namespace to the namespace that backs it in the host cluster.
///
/// Every tenant gets its own prefix so two tenants using the same namespace
/// name never collide.
pub fn host_namespace(cluster: &str, namespace: &str) -> String {
    format!("{}-{}", cluster, namespace)
}
