//! Australia Post (shipping and tracking).

use async_trait::async_trait;
use conduit_core::{CallRequest, CallResult, ConnectorInstance};
use reqwest::Client;
use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::credentials::ProviderCredentials;
use crate::error::AdapterError;
use crate::http;

pub const PROVIDER_ID: &str = "Australia Post";
pub const BASE_URL: &str = "https://digitalapi.auspost.com.au/";

const AUTH_KEY_HEADER: &str = "AUTH-KEY";
const ACCOUNT_NUMBER_HEADER: &str = "Account-Number";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AustraliaPostCredentials {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    account_number: String,
}

pub struct AustraliaPostAdapter {
    client: Client,
    base_url: String,
}

impl AustraliaPostAdapter {
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
impl ProviderAdapter for AustraliaPostAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn execute(
        &self,
        _instance: &ConnectorInstance,
        credentials: &ProviderCredentials,
        request: &CallRequest,
    ) -> Result<CallResult, AdapterError> {
        let creds: AustraliaPostCredentials = credentials.parse(PROVIDER_ID)?;
        let api_key = super::require(&creds.api_key, PROVIDER_ID)?;

        let mut builder = http::request(&self.client, &self.base_url, request)
            .headers(http::caller_headers(
                PROVIDER_ID,
                &request.headers,
                &[AUTH_KEY_HEADER, ACCOUNT_NUMBER_HEADER],
            ))
            .header(AUTH_KEY_HEADER, api_key);

        if !creds.account_number.is_empty() {
            builder = builder.header(ACCOUNT_NUMBER_HEADER, creds.account_number.as_str());
        }

        http::send(PROVIDER_ID, &request.endpoint, builder).await
    }
}
