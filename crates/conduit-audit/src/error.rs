use thiserror::Error;

/// Failures of an audit store backend.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backend could not be opened or connected.
    #[error("audit store unavailable at startup: {0}")]
    InitializationFailed(String),

    /// A record was not persisted. The dispatch result stands regardless.
    #[error("audit append failed: {0}")]
    AppendFailed(String),

    #[error("audit query failed: {0}")]
    QueryFailed(String),

    /// In-process state is unusable (poisoned lock).
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    #[error("audit record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
