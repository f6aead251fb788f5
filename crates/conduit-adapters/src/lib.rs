//! # conduit-adapters
//!
//! One [`ProviderAdapter`] per external API. An adapter turns a generic
//! [`CallRequest`](conduit_core::CallRequest) into the provider's upstream
//! HTTP call, injects the provider's authentication from the instance's
//! decoded credentials, and maps whatever comes back into a
//! [`CallResult`](conduit_core::CallResult).
//!
//! The set of providers is fixed at build time ([`Provider::ALL`]) and
//! registered once into an immutable [`AdapterRegistry`].
//!
//! Stored credentials are sealed blobs; [`CredentialCipher`] opens them.

pub mod adapter;
pub mod credentials;
pub mod error;
pub mod http;
pub mod providers;
pub mod registry;

pub use adapter::ProviderAdapter;
pub use credentials::{CredentialCipher, CredentialCodec, ProviderCredentials};
pub use error::{AdapterError, CredentialError};
pub use http::build_client;
pub use registry::{AdapterRegistry, AdapterRegistryBuilder, Provider};
