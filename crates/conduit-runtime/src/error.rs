use conduit_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Reasons a dispatch is rejected before any adapter runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Unknown to the calling organization (it may exist for another one).
    #[error("Connector instance {0} not found")]
    NotFound(Uuid),

    #[error("Connector instance {0} is not active")]
    InstanceInactive(Uuid),

    /// The catalog names a provider this build has no adapter for.
    #[error("No executor registered for provider '{0}'")]
    UnknownProvider(String),

    #[error("instance lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

impl DispatchError {
    /// HTTP-style status recorded for the rejection.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InstanceInactive(_) | Self::UnknownProvider(_) => 400,
            Self::Lookup(_) => 503,
        }
    }
}
