use chrono::{DateTime, Utc};
use serde::Serialize;

/// Liveness report listing the registered provider ids.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub executors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn healthy(executors: Vec<String>) -> Self {
        Self {
            status: "healthy",
            executors,
            timestamp: Utc::now(),
        }
    }
}
