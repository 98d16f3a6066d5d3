//! Custom Resource Definitions for tenancy
//!
//! This module contains the CRDs the translation engine reads from the host cluster.

mod virtual_cluster;

pub use virtual_cluster::{
    VirtualCluster, VirtualClusterPhase, VirtualClusterSpec, VirtualClusterStatus,
};
