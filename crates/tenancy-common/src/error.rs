//! Error types for tenant-to-host translation
//!
//! Errors are structured with fields to aid debugging in production. Each
//! variant carries the tenant cluster it was raised for, so a failed
//! translation can be attributed without parsing the message.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for translation operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Virtual cluster configuration could not be resolved
    #[error("configuration missing for {cluster}: {message}")]
    ConfigMissing {
        /// Tenant cluster whose configuration was requested
        cluster: String,
        /// Description of what's missing
        message: String,
    },

    /// A supporting object could not be fetched from the tenant cluster
    #[error("vc {cluster} failed to get {kind} {name} in {namespace}: {message}")]
    DependencyFetch {
        /// Tenant cluster the object lives in
        cluster: String,
        /// Kind of the object (e.g. "ReplicaSet")
        kind: String,
        /// Tenant-side namespace
        namespace: String,
        /// Object name
        name: String,
        /// Underlying cause
        message: String,
    },

    /// No client is available for the tenant cluster
    #[error("vc {cluster} failed to get client: {message}")]
    ClientUnavailable {
        /// Tenant cluster without a client
        cluster: String,
        /// Description of what failed
        message: String,
    },

    /// Invalid process configuration
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a configuration-missing error for a tenant cluster
    pub fn config_missing(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ConfigMissing {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a dependency-fetch error with full object context
    pub fn dependency_fetch(
        cluster: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::DependencyFetch {
            cluster: cluster.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a client-unavailable error for a tenant cluster
    pub fn client_unavailable(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ClientUnavailable {
            cluster: cluster.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Check if this error is retryable by the calling controller
    ///
    /// The engine never retries on its own. Missing objects and bad
    /// configuration need a fix upstream; connection-level failures may clear.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::ConfigMissing { .. } => true,
            Error::DependencyFetch { .. } => true,
            Error::ClientUnavailable { .. } => true,
            Error::Config { .. } => false,
        }
    }

    /// Get the tenant cluster if this error is associated with one
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::ConfigMissing { cluster, .. } => Some(cluster),
            Error::DependencyFetch { cluster, .. } => Some(cluster),
            Error::ClientUnavailable { cluster, .. } => Some(cluster),
            Error::Kube { .. } | Error::Config { .. } => None,
        }
    }
}
