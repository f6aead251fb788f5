use conduit_audit::AuditError;
use conduit_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("instance store error: {0}")]
    Store(#[from] StoreError),

    #[error("audit store error: {0}")]
    Audit(#[from] AuditError),
}
