//! Tenant-to-host object translation
//!
//! Objects authored inside a tenant control plane are rewritten into objects
//! that can run in the shared host cluster:
//!
//! - **Pods** go through an ordered [`PodRewriter`] pipeline (environment,
//!   secret volumes, affinity scoping, DNS policy, ...)
//! - **Services** lose their cluster IP and node ports
//! - **Service-account token Secrets** become `Opaque` secrets under a
//!   generated name
//!
//! The entry point is [`vc`], which binds a [`ClusterHandle`] and a tenant
//! identity and hands out per-kind mutators.

#![deny(missing_docs)]

pub mod envvars;
pub mod handle;
pub mod metadata;
pub mod mutator;
pub mod pod;
pub mod secret;
pub mod service;

pub use handle::{
    ClusterHandle, KubeClusterHandle, KubeTenantClient, TenantClient, TenantRegistration,
};
pub use metadata::{build_host_metadata, build_host_object, build_host_pod};
pub use mutator::{vc, VcMutator};
pub use pod::{PodContext, PodMutator, PodRewriter};
pub use secret::SecretMutator;
pub use service::ServiceMutator;
