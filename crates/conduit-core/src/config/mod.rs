//! Configuration types for Conduit.
//!
//! A single `conduit.toml` file configures the whole service:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [dispatch]
//! timeout = "60s"
//! max_retries = 3
//! initial_backoff = "2s"
//!
//! [credentials]
//! master_key_env = "CONDUIT_MASTER_KEY"
//!
//! [storage]
//! backend = "postgres"
//! database_url_env = "DATABASE_URL"
//!
//! [providers.base_urls]
//! Stripe = "https://stripe-sandbox.internal/v1/"
//! ```
//!
//! Every section is optional; missing values fall back to defaults.

pub mod dispatch;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub use dispatch::DispatchConfig;
pub use storage::{StorageBackend, StorageConfig};

/// Complete Conduit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConduitConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Retry and deadline settings for dispatches.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Instance store and audit store backends.
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Outbound HTTP client settings shared by every provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for a single upstream attempt.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where the credential master key comes from.
///
/// The key itself never lives in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variable holding the base64-encoded 32-byte master key.
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            master_key_env: default_master_key_env(),
        }
    }
}

impl CredentialsConfig {
    /// Read the master key from the configured environment variable.
    pub fn resolve_master_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.master_key_env).map_err(|_| {
            ConfigError::Config(format!(
                "credential master key not set (expected env var {})",
                self.master_key_env
            ))
        })
    }
}

/// Per-provider overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Base URL overrides keyed by provider identifier.
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("conduit/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_master_key_env() -> String {
    "CONDUIT_MASTER_KEY".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConduitConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Serde glue for human-readable durations ("30s", "1m 30s").
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional durations.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConduitConfig::from_toml("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.dispatch.max_retries, 3);
        assert_eq!(config.dispatch.initial_backoff, Duration::from_secs(2));
        assert_eq!(config.dispatch.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.http.request_timeout, Duration::from_secs(30));
        assert_eq!(config.credentials.master_key_env, "CONDUIT_MASTER_KEY");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_full_config() {
        let config = ConduitConfig::from_toml(
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [dispatch]
            timeout = "90s"
            max_retries = 2
            initial_backoff = "500ms"

            [storage]
            backend = "file"
            audit_path = "/var/lib/conduit/audit.log"

            [providers.base_urls]
            Stripe = "http://localhost:12111/v1/"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.dispatch.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.dispatch.max_retries, 2);
        assert_eq!(config.dispatch.initial_backoff, Duration::from_millis(500));
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(
            config.providers.base_urls.get("Stripe").map(String::as_str),
            Some("http://localhost:12111/v1/")
        );
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let parsed = ConduitConfig::from_toml("[dispatch]\ntimeout = \"soon\"\n");
        assert!(matches!(parsed, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConduitConfig::load_or_default("/nonexistent/conduit.toml").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }
}
