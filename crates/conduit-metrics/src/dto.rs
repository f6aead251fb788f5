//! Dashboard response shapes (camelCase JSON).

use chrono::{DateTime, Utc};
use conduit_core::HttpMethod;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Calls in the trailing 7 days.
    pub total_calls: u64,
    /// Percent change against the 7 days before that, 1 decimal place.
    pub calls_change: f64,
    pub active_connectors: u64,
    /// Percent of this week's calls with status >= 400, 2 decimal places.
    pub error_rate: f64,
    /// Mean response time this week in ms, whole number.
    pub avg_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageBucket {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Warning,
    Error,
}

impl ActivityStatus {
    pub fn from_status_code(status_code: u16) -> Self {
        match status_code {
            400.. => Self::Error,
            300..=399 => Self::Warning,
            _ => Self::Success,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: Uuid,
    /// `"METHOD endpoint"`.
    pub title: String,
    /// Instance display name.
    pub description: String,
    pub status: ActivityStatus,
    pub timestamp: DateTime<Utc>,
    pub connector_name: String,
    pub response_time: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorItem {
    pub id: Uuid,
    pub endpoint: String,
    pub method: HttpMethod,
    pub status_code: u16,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub connector_name: String,
    pub instance_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPerformance {
    pub connector: String,
    pub avg_response_time: f64,
    pub total_calls: u64,
    pub error_count: u64,
    /// Percent of calls with status < 400.
    pub success_rate: f64,
}
