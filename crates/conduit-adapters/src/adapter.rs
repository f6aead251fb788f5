use async_trait::async_trait;
use conduit_core::{CallRequest, CallResult, ConnectorInstance};

use crate::credentials::ProviderCredentials;
use crate::error::AdapterError;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Catalog identifier this adapter serves.
    fn provider_id(&self) -> &str;

    /// Execute one upstream call for `instance`.
    ///
    /// Any upstream HTTP response, 4xx and 5xx included, comes back as `Ok`.
    /// `Err` is reserved for unusable credentials and transport failures.
    async fn execute(
        &self,
        instance: &ConnectorInstance,
        credentials: &ProviderCredentials,
        request: &CallRequest,
    ) -> Result<CallResult, AdapterError>;
}
