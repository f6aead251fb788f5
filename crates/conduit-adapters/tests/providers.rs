//! Provider adapters against wiremock upstreams.

use conduit_adapters::providers::{
    AustraliaPostAdapter, SendGridAdapter, SlackAdapter, StripeAdapter, XeroAdapter,
};
use conduit_adapters::{AdapterError, ProviderAdapter, ProviderCredentials};
use conduit_core::{CallRequest, ConnectorInstance, HttpMethod};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn instance(provider: &str) -> ConnectorInstance {
    ConnectorInstance::new(Uuid::new_v4(), provider, "test", "sealed")
}

fn creds(value: serde_json::Value) -> ProviderCredentials {
    ProviderCredentials::new(value)
}

// =============================================================================
// Stripe
// =============================================================================

#[tokio::test]
async fn test_stripe_injects_bearer_and_passes_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/charges"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"amount":100}"#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"id":"ch_1"}"#)
                .insert_header("request-id", "req_9"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = StripeAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/v1/", server.uri()));
    let request = CallRequest::new(HttpMethod::Post, "/charges").with_body(r#"{"amount":100}"#);

    let result = adapter
        .execute(
            &instance("Stripe"),
            &creds(json!({ "apiKey": "sk_test_123" })),
            &request,
        )
        .await
        .unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, r#"{"id":"ch_1"}"#);
    assert_eq!(result.headers.get("request-id").map(String::as_str), Some("req_9"));
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn test_caller_cannot_override_auth_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/balance"))
        .and(header("authorization", "Bearer sk_real"))
        .and(header("stripe-version", "2024-06-20"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = StripeAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/v1/", server.uri()));
    let request = CallRequest::new(HttpMethod::Get, "balance")
        .with_header("Authorization", "Bearer sk_forged")
        .with_header("Stripe-Version", "2024-06-20");

    let result = adapter
        .execute(&instance("Stripe"), &creds(json!({ "apiKey": "sk_real" })), &request)
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_upstream_failure_is_a_result_not_a_fault() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/charges"))
        .respond_with(ResponseTemplate::new(402).set_body_string(r#"{"error":"card_declined"}"#))
        .mount(&server)
        .await;

    let adapter = StripeAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/v1/", server.uri()));
    let result = adapter
        .execute(
            &instance("Stripe"),
            &creds(json!({ "apiKey": "sk" })),
            &CallRequest::new(HttpMethod::Post, "charges"),
        )
        .await
        .unwrap();

    assert_eq!(result.status_code, 402);
    assert_eq!(result.error_message.as_deref(), Some(r#"{"error":"card_declined"}"#));
}

#[tokio::test]
async fn test_missing_api_key_is_invalid_configuration() {
    let adapter = StripeAdapter::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9/");
    let err = adapter
        .execute(
            &instance("Stripe"),
            &creds(json!({ "apiKey": "" })),
            &CallRequest::new(HttpMethod::Get, "balance"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::InvalidConfiguration(_)));
    assert_eq!(err.to_string(), "Invalid Stripe configuration");
}

#[tokio::test]
async fn test_connection_refused_is_transport_fault() {
    // Nothing listens on the discard port.
    let adapter = StripeAdapter::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9/");
    let err = adapter
        .execute(
            &instance("Stripe"),
            &creds(json!({ "apiKey": "sk" })),
            &CallRequest::new(HttpMethod::Get, "balance"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Transport(_)));
}

#[tokio::test]
async fn test_empty_body_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.key"))
        .respond_with(|req: &Request| {
            if req.body.is_empty() && !req.headers.contains_key("content-type") {
                ResponseTemplate::new(202)
            } else {
                ResponseTemplate::new(418)
            }
        })
        .mount(&server)
        .await;

    let adapter = SendGridAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/v3/", server.uri()));
    let request = CallRequest::new(HttpMethod::Post, "/mail/send").with_body("");

    let result = adapter
        .execute(
            &instance("SendGrid"),
            &creds(json!({ "apiKey": "SG.key", "fromEmail": "ops@example.com" })),
            &request,
        )
        .await
        .unwrap();
    assert_eq!(result.status_code, 202);
}

// =============================================================================
// SendGrid
// =============================================================================

#[tokio::test]
async fn test_sendgrid_joins_path_and_injects_bearer() {
    let server = MockServer::start().await;
    let payload = r#"{"personalizations":[{"to":[{"email":"a@example.com"}]}]}"#;

    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer SG.real"))
        .and(header("content-type", "application/json"))
        .and(body_string(payload))
        .respond_with(ResponseTemplate::new(202).insert_header("x-message-id", "m-1"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SendGridAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/v3/", server.uri()));
    let request = CallRequest::new(HttpMethod::Post, "mail/send")
        .with_header("Authorization", "Bearer SG.forged")
        .with_body(payload);

    let result = adapter
        .execute(
            &instance("SendGrid"),
            &creds(json!({
                "apiKey": "SG.real",
                "fromEmail": "ops@example.com",
                "fromName": "Ops"
            })),
            &request,
        )
        .await
        .unwrap();

    assert_eq!(result.status_code, 202);
    assert_eq!(result.headers.get("x-message-id").map(String::as_str), Some("m-1"));
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn test_sendgrid_requires_api_key() {
    let adapter = SendGridAdapter::new(reqwest::Client::new());
    let err = adapter
        .execute(
            &instance("SendGrid"),
            &creds(json!({ "fromEmail": "ops@example.com" })),
            &CallRequest::new(HttpMethod::Post, "mail/send"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidConfiguration(_)));
}

// =============================================================================
// Slack
// =============================================================================

#[tokio::test]
async fn test_slack_empty_endpoint_posts_empty_object_to_webhook() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/T000/B000/XXX"))
        .and(body_string("{}"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SlackAdapter::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9/");
    let credentials = creds(json!({
        "webhookUrl": format!("{}/services/T000/B000/XXX", server.uri())
    }));

    let result = adapter
        .execute(&instance("Slack"), &credentials, &CallRequest::new(HttpMethod::Get, ""))
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, "ok");
}

#[tokio::test]
async fn test_slack_webhook_path_posts_body_without_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string(r#"{"text":"hi"}"#))
        .respond_with(|req: &Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_string("ok")
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SlackAdapter::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9/");
    let credentials = creds(json!({
        "webhookUrl": format!("{}/hook", server.uri()),
        "botToken": "xoxb-1"
    }));
    let request = CallRequest::new(HttpMethod::Post, "webhook").with_body(r#"{"text":"hi"}"#);

    let result = adapter
        .execute(&instance("Slack"), &credentials, &request)
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_slack_api_uses_bot_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let adapter =
        SlackAdapter::new(reqwest::Client::new()).with_base_url(format!("{}/api/", server.uri()));
    let result = adapter
        .execute(
            &instance("Slack"),
            &creds(json!({ "webhookUrl": "http://127.0.0.1:9/hook", "botToken": "xoxb-1" })),
            &CallRequest::new(HttpMethod::Post, "/chat.postMessage").with_body(r#"{"channel":"C1"}"#),
        )
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_slack_requires_webhook_url() {
    let adapter = SlackAdapter::new(reqwest::Client::new());
    let err = adapter
        .execute(
            &instance("Slack"),
            &creds(json!({ "botToken": "xoxb-1" })),
            &CallRequest::new(HttpMethod::Post, "chat.postMessage"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid Slack configuration");
}

// =============================================================================
// Australia Post / Xero
// =============================================================================

#[tokio::test]
async fn test_australia_post_custom_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shipping/v1/track"))
        .and(header("auth-key", "ap-key"))
        .and(header("account-number", "0001234567"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = AustraliaPostAdapter::new(reqwest::Client::new()).with_base_url(server.uri());
    let result = adapter
        .execute(
            &instance("Australia Post"),
            &creds(json!({ "apiKey": "ap-key", "accountNumber": "0001234567" })),
            &CallRequest::new(HttpMethod::Get, "/shipping/v1/track")
                .with_header("AUTH-KEY", "forged"),
        )
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn test_xero_tags_tenant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api.xro/2.0/Invoices"))
        .and(header("xero-tenant-id", "tenant-42"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = XeroAdapter::new(reqwest::Client::new())
        .with_base_url(format!("{}/api.xro/2.0/", server.uri()));
    let result = adapter
        .execute(
            &instance("Xero"),
            &creds(json!({ "clientId": "cid", "clientSecret": "s", "tenantId": "tenant-42" })),
            &CallRequest::new(HttpMethod::Get, "Invoices")
                .with_header("Authorization", "Bearer access-token"),
        )
        .await
        .unwrap();

    assert_eq!(result.status_code, 503);
    assert!(result.is_transient());
    assert_eq!(result.error_message.as_deref(), Some("maintenance"));
}

#[tokio::test]
async fn test_xero_requires_client_id() {
    let adapter = XeroAdapter::new(reqwest::Client::new());
    let err = adapter
        .execute(
            &instance("Xero"),
            &creds(json!({ "tenantId": "t" })),
            &CallRequest::new(HttpMethod::Get, "Invoices"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidConfiguration(_)));
}
