//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the instance store and the audit store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Audit log path (for file backend).
    #[serde(default = "default_audit_path")]
    pub audit_path: String,

    /// Environment variable holding the database URL (for postgres backend).
    #[serde(default = "default_database_url_env")]
    pub database_url_env: String,

    /// Maximum pooled connections (for postgres backend).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// JSON array of connector instances loaded at startup (memory and file
    /// backends only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances_path: Option<String>,
}

/// Storage backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Keep everything in process memory.
    #[default]
    Memory,
    /// Audit records appended to a JSON-lines file; instances in memory.
    File,
    /// Both stores in Postgres.
    Postgres,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            audit_path: default_audit_path(),
            database_url_env: default_database_url_env(),
            max_connections: default_max_connections(),
            instances_path: None,
        }
    }
}

impl StorageConfig {
    /// Resolve the database URL from the configured environment variable.
    pub fn database_url(&self) -> Option<String> {
        std::env::var(&self.database_url_env).ok()
    }
}

fn default_audit_path() -> String {
    "audit.log".to_string()
}

fn default_database_url_env() -> String {
    "DATABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    5
}
