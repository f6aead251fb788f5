//! Upstream request plumbing shared by every provider.

use std::collections::BTreeMap;
use std::time::Instant;

use conduit_core::{CallRequest, CallResult, HttpConfig, HttpMethod};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use tracing::{info, warn};

use crate::error::AdapterError;

/// Build the HTTP client shared by all adapters.
pub fn build_client(config: &HttpConfig) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| AdapterError::Transport(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Join a provider base URL and a request path.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Start an upstream request for `request`: method, URL and body.
///
/// Only a non-empty body is sent, as JSON unless the caller named a
/// content type.
pub(crate) fn request(client: &Client, base: &str, request: &CallRequest) -> RequestBuilder {
    let builder = client.request(method(request.method), join(base, request.path()));
    match request.body_content() {
        Some(body) if has_content_type(&request.headers) => builder.body(body.to_string()),
        Some(body) => json_body(builder, body.to_string()),
        None => builder,
    }
}

pub(crate) fn json_body(builder: RequestBuilder, body: String) -> RequestBuilder {
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
}

fn has_content_type(headers: &BTreeMap<String, String>) -> bool {
    headers
        .keys()
        .any(|name| name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()))
}

/// Merge caller headers, skipping any that collide with `reserved`
/// (the adapter's own auth headers) and any that are not valid HTTP.
pub(crate) fn caller_headers(
    provider: &str,
    headers: &BTreeMap<String, String>,
    reserved: &[&str],
) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if reserved.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            warn!(provider, header = %name, "Ignoring caller override of auth header");
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => warn!(provider, header = %name, "Skipping invalid caller header"),
        }
    }
    map
}

/// Send and map the response 1:1 into a `CallResult`.
///
/// Elapsed time covers the network exchange up to the response head.
pub(crate) async fn send(
    provider: &str,
    endpoint: &str,
    builder: RequestBuilder,
) -> Result<CallResult, AdapterError> {
    let started = Instant::now();
    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            AdapterError::Transport(format!("{} request timed out: {}", provider, e))
        } else {
            AdapterError::Transport(format!("{} request failed: {}", provider, e))
        }
    })?;
    let elapsed = started.elapsed();

    let status = response.status().as_u16();
    let headers = normalize_headers(response.headers());
    let body = response
        .bytes()
        .await
        .map_err(|e| AdapterError::Transport(format!("{} response body: {}", provider, e)))?;

    info!(
        provider,
        endpoint,
        status,
        elapsed_ms = elapsed.as_millis() as u64,
        "Upstream call completed"
    );

    Ok(CallResult::from_upstream(
        status,
        String::from_utf8_lossy(&body).into_owned(),
        headers,
        elapsed,
    ))
}

/// Lowercase header names, duplicate values joined with a comma.
pub(crate) fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut normalized: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        normalized
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    normalized
}
