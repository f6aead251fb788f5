//! Error types for adapters and the credential codec.

use thiserror::Error;

/// Faults an adapter may raise instead of returning a `CallResult`.
///
/// Ordinary upstream non-2xx responses are never errors.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Stored credentials are missing a required field or malformed.
    #[error("{0}")]
    InvalidConfiguration(String),

    /// DNS failure, refused connection, client-side timeout.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AdapterError {
    /// Fault for a provider whose credentials do not fit its shape.
    pub fn invalid_configuration(provider: &str) -> Self {
        Self::InvalidConfiguration(format!("Invalid {} configuration", provider))
    }
}

/// Errors from sealing or opening credential blobs.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The master key is not 32 bytes of base64.
    #[error("invalid master key: {0}")]
    InvalidKey(String),

    #[error("failed to seal credentials: {0}")]
    SealFailed(String),

    /// Wrong organization, wrong key or a tampered blob.
    #[error("failed to open credentials: {0}")]
    OpenFailed(String),

    /// The blob opened but is not a JSON object.
    #[error("malformed credentials: {0}")]
    Malformed(String),
}
