//! Tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! JSON structured logging (for in-cluster deployments) or human-readable
//! output (for local runs).

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{EnvConfig, OsEnvConfig};

/// Environment variable selecting `json` (default) or `text` output
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,tenancy=debug,kube=info,tower=warn,hyper=warn";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on startup (e.g., "tenancy-syncer")
    pub service_name: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl TelemetryConfig {
    /// Build the configuration from environment variables
    ///
    /// Anything but `LOG_FORMAT=text` selects JSON output.
    pub fn from_env(env: &dyn EnvConfig) -> Self {
        Self {
            service_name: "tenancy".to_string(),
            json: env
                .var(LOG_FORMAT_ENV)
                .map(|format| format.trim() != "text")
                .unwrap_or(true),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_env(&OsEnvConfig)
    }
}

/// Initialize tracing with the given configuration
///
/// # Example
///
/// ```ignore
/// use tenancy_common::telemetry::{init_tracing, TelemetryConfig};
///
/// init_tracing(TelemetryConfig {
///     service_name: "tenancy-syncer".to_string(),
///     ..Default::default()
/// })?;
/// ```
pub fn init_tracing(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Option<Layer> implements Layer, so exactly one of these is active
    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true);
        (Some(layer), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    tracing::info!(service = %config.service_name, "Tracing initialized");
    Ok(())
}
