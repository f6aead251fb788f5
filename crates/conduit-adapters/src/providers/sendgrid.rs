//! SendGrid (email).

use async_trait::async_trait;
use conduit_core::{CallRequest, CallResult, ConnectorInstance};
use reqwest::Client;
use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::credentials::ProviderCredentials;
use crate::error::AdapterError;
use crate::http;

pub const PROVIDER_ID: &str = "SendGrid";
pub const BASE_URL: &str = "https://api.sendgrid.com/v3/";

// fromEmail/fromName are stored alongside the key for the UI; calls only
// need the key.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendGridCredentials {
    #[serde(default)]
    api_key: String,
}

pub struct SendGridAdapter {
    client: Client,
    base_url: String,
}

impl SendGridAdapter {
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
impl ProviderAdapter for SendGridAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn execute(
        &self,
        _instance: &ConnectorInstance,
        credentials: &ProviderCredentials,
        request: &CallRequest,
    ) -> Result<CallResult, AdapterError> {
        let creds: SendGridCredentials = credentials.parse(PROVIDER_ID)?;
        let api_key = super::require(&creds.api_key, PROVIDER_ID)?;

        let builder = http::request(&self.client, &self.base_url, request)
            .headers(http::caller_headers(
                PROVIDER_ID,
                &request.headers,
                &["Authorization"],
            ))
            .bearer_auth(api_key);

        http::send(PROVIDER_ID, &request.endpoint, builder).await
    }
}
