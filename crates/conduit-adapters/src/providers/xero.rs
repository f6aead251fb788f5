//! Xero (accounting).
//!
//! Calls are tagged with the tenant's Xero organisation. Access-token
//! acquisition is out of scope; callers that hold a token pass it as an
//! `Authorization` header override.

use async_trait::async_trait;
use conduit_core::{CallRequest, CallResult, ConnectorInstance};
use reqwest::Client;
use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::credentials::ProviderCredentials;
use crate::error::AdapterError;
use crate::http;

pub const PROVIDER_ID: &str = "Xero";
pub const BASE_URL: &str = "https://api.xero.com/api.xro/2.0/";

const TENANT_HEADER: &str = "xero-tenant-id";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct XeroCredentials {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    tenant_id: String,
}

pub struct XeroAdapter {
    client: Client,
    base_url: String,
}

impl XeroAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ProviderAdapter for XeroAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn execute(
        &self,
        _instance: &ConnectorInstance,
        credentials: &ProviderCredentials,
        request: &CallRequest,
    ) -> Result<CallResult, AdapterError> {
        let creds: XeroCredentials = credentials.parse(PROVIDER_ID)?;
        super::require(&creds.client_id, PROVIDER_ID)?;

        let builder = http::request(&self.client, &self.base_url, request)
            .headers(http::caller_headers(
                PROVIDER_ID,
                &request.headers,
                &[TENANT_HEADER],
            ))
            .header(TENANT_HEADER, creds.tenant_id.as_str());

        http::send(PROVIDER_ID, &request.endpoint, builder).await
    }
}
