//! Label and annotation keys written onto host-side objects
//!
//! Host objects carry enough of their tenant-side identity to be attributed
//! back to the tenant that owns them.

/// Label (and annotation) holding the tenant identity
pub const LABEL_CLUSTER: &str = "tenancy.x-k8s.io/cluster";

/// Annotation holding the tenant-side namespace
pub const LABEL_NAMESPACE: &str = "tenancy.x-k8s.io/namespace";

/// Annotation holding the tenant-side object UID
pub const LABEL_UID: &str = "tenancy.x-k8s.io/uid";

/// Annotation holding the tenant-side Service cluster IP
pub const LABEL_CLUSTER_IP: &str = "tenancy.x-k8s.io/clusterIP";

/// Annotation holding the tenant-side Secret name
pub const LABEL_SECRET_NAME: &str = "tenancy.x-k8s.io/secret.name";

/// Label holding the tenant-side Secret UID
pub const LABEL_SECRET_UID: &str = "tenancy.x-k8s.io/secret.uid";

/// Label holding the name of the Deployment that owns a Pod's ReplicaSet
pub const LABEL_EXTEND_DEPLOYMENT_NAME: &str = "tenancy.x-k8s.io/extend.deployment.name";

/// Label holding the UID of the Deployment that owns a Pod's ReplicaSet
pub const LABEL_EXTEND_DEPLOYMENT_UID: &str = "tenancy.x-k8s.io/extend.deployment.uid";

/// Annotation the orchestrator sets on service-account token Secrets
pub const SERVICE_ACCOUNT_NAME_KEY: &str = "kubernetes.io/service-account.name";
