//! Slack (incoming webhooks and the Web API).

use async_trait::async_trait;
use conduit_core::{CallRequest, CallResult, ConnectorInstance};
use reqwest::Client;
use serde::Deserialize;

use crate::adapter::ProviderAdapter;
use crate::credentials::ProviderCredentials;
use crate::error::AdapterError;
use crate::http;

pub const PROVIDER_ID: &str = "Slack";
pub const BASE_URL: &str = "https://slack.com/api/";

/// Endpoint that routes a call to the stored webhook URL.
pub const WEBHOOK_ENDPOINT: &str = "webhook";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlackCredentials {
    #[serde(default)]
    webhook_url: String,
    #[serde(default)]
    bot_token: Option<String>,
}

/// Posts to the tenant's webhook, or calls the Web API with the bot token.
///
/// The webhook path posts the body (or `{}`) with no auth header. On the Web
/// API path the bearer token is attached only when one is stored; caller
/// headers are not forwarded there.
pub struct SlackAdapter {
    client: Client,
    base_url: String,
}

impl SlackAdapter {
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

    fn targets_webhook(request: &CallRequest) -> bool {
        request.endpoint.is_empty() || request.endpoint == WEBHOOK_ENDPOINT
    }
}

#[async_trait]
impl ProviderAdapter for SlackAdapter {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn execute(
        &self,
        _instance: &ConnectorInstance,
        credentials: &ProviderCredentials,
        request: &CallRequest,
    ) -> Result<CallResult, AdapterError> {
        let creds: SlackCredentials = credentials.parse(PROVIDER_ID)?;
        let webhook_url = super::require(&creds.webhook_url, PROVIDER_ID)?;

        if Self::targets_webhook(request) {
            let body = request.body_content().unwrap_or("{}").to_string();
            let builder = http::json_body(self.client.post(webhook_url), body);
            return http::send(PROVIDER_ID, WEBHOOK_ENDPOINT, builder).await;
        }

        let mut builder = http::request(&self.client, &self.base_url, request);
        if let Some(token) = creds.bot_token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }

        http::send(PROVIDER_ID, &request.endpoint, builder).await
    }
}
