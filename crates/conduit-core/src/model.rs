//! Call and connector-instance data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Body returned to the caller when an adapter fault is collapsed into a result.
pub const FAULT_BODY: &str = r#"{"error": "Internal server error"}"#;

/// A tenant's configured credential set for one external provider.
///
/// Owned by the CRUD subsystem. `(id, organization_id)` never changes after
/// creation; the dispatcher only ever reads instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorInstance {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Catalog identifier of the provider (case-sensitive), e.g. `"Stripe"`.
    pub provider_id: String,
    /// Display name chosen by the tenant.
    pub name: String,
    /// Sealed credential blob. Only the credential codec can open it.
    pub config: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectorInstance {
    /// Create an active instance with fresh timestamps.
    pub fn new(
        organization_id: Uuid,
        provider_id: impl Into<String>,
        name: impl Into<String>,
        config: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            provider_id: provider_id.into(),
            name: name.into(),
            config: config.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same instance, marked inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Standard HTTP verbs accepted in a [`CallRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a method string is not a standard HTTP verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ParseMethodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The generic call a tenant submits for one connector instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Path (or fragment) relative to the provider's base URL.
    #[serde(default)]
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Header overrides. Never replace the adapter's own auth headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Upper bound on the whole dispatch, retries included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl CallRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            headers: BTreeMap::new(),
            timeout_ms: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Endpoint with any leading slashes removed.
    pub fn path(&self) -> &str {
        self.endpoint.trim_start_matches('/')
    }

    /// Body to send upstream. An empty body counts as no body.
    pub fn body_content(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// The uniform outcome of one call, successful or not.
///
/// `error_message` is set iff the status indicates failure (>= 400) or the
/// result was synthesized from a fault or timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
    pub response_time_ms: u64,
    pub error_message: Option<String>,
}

impl CallResult {
    /// Map an upstream response 1:1. The body doubles as the error message
    /// for failure statuses.
    pub fn from_upstream(
        status_code: u16,
        body: String,
        headers: BTreeMap<String, String>,
        elapsed: Duration,
    ) -> Self {
        let error_message = (status_code >= 400).then(|| body.clone());
        Self {
            status_code,
            body,
            headers,
            response_time_ms: elapsed.as_millis() as u64,
            error_message,
        }
    }

    /// Result standing in for an adapter fault.
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: FAULT_BODY.to_string(),
            headers: BTreeMap::new(),
            response_time_ms: 0,
            error_message: Some(message.into()),
        }
    }

    /// Result standing in for a dispatch that exceeded its deadline.
    pub fn timed_out(timeout: Duration, elapsed: Duration) -> Self {
        Self {
            status_code: 504,
            body: String::new(),
            headers: BTreeMap::new(),
            response_time_ms: elapsed.as_millis() as u64,
            error_message: Some(format!(
                "dispatch timed out after {}ms",
                timeout.as_millis()
            )),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }

    /// Upstream server-side failure, eligible for retry.
    pub fn is_transient(&self) -> bool {
        self.status_code >= 500
    }
}
