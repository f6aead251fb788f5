//! # conduit-core
//!
//! Types shared by every Conduit crate:
//!
//! - [`ConnectorInstance`]: a tenant's stored credential set for one provider
//! - [`CallRequest`] / [`CallResult`]: the generic call shape every provider
//!   adapter consumes and produces
//! - [`InstanceStore`]: read-only view of the connector-instance store
//! - [`config`]: the `conduit.toml` configuration types

pub mod config;
pub mod model;
pub mod store;

pub use config::{
    ConduitConfig, ConfigError, CredentialsConfig, DispatchConfig, HttpConfig, ProvidersConfig,
    ServerConfig, StorageBackend, StorageConfig,
};
pub use model::{
    CallRequest, CallResult, ConnectorInstance, FAULT_BODY, HttpMethod, ParseMethodError,
};
pub use store::{InMemoryInstanceStore, InstanceStore, StoreError};
