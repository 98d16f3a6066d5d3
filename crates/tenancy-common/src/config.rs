//! Mutation configuration
//!
//! Provides trait-based access to environment configuration,
//! enabling dependency injection and mocking for tests.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

/// Environment variable toggling service-account token automount off
pub const DISABLE_SERVICE_ACCOUNT_TOKEN_ENV: &str = "DISABLE_SERVICE_ACCOUNT_TOKEN";

/// Environment variable toggling service links off
pub const DISABLE_POD_SERVICE_LINKS_ENV: &str = "DISABLE_POD_SERVICE_LINKS";

/// Trait for reading process environment configuration
///
/// This abstracts reading from environment variables, enabling
/// proper unit testing without manipulating global state.
#[cfg_attr(test, mockall::automock)]
pub trait EnvConfig: Send + Sync {
    /// Get a raw environment variable
    fn var(&self, key: &str) -> Option<String>;
}

/// Default implementation that reads from environment variables
#[derive(Clone, Default)]
pub struct OsEnvConfig;

impl EnvConfig for OsEnvConfig {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Flags controlling the optional Pod rewriters
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MutationConfig {
    /// Force `automountServiceAccountToken: false` on host Pods
    #[serde(default)]
    pub disable_service_account_token: bool,

    /// Force `enableServiceLinks: false` on host Pods
    #[serde(default)]
    pub disable_pod_service_links: bool,
}

impl MutationConfig {
    /// Build the configuration from environment variables
    ///
    /// Unset variables default to `false`.
    pub fn from_env(env: &dyn EnvConfig) -> Result<Self, Error> {
        let config = Self {
            disable_service_account_token: parse_flag(env, DISABLE_SERVICE_ACCOUNT_TOKEN_ENV)?,
            disable_pod_service_links: parse_flag(env, DISABLE_POD_SERVICE_LINKS_ENV)?,
        };
        debug!(?config, "Loaded mutation config");
        Ok(config)
    }
}

fn parse_flag(env: &dyn EnvConfig, key: &str) -> Result<bool, Error> {
    match env.var(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
