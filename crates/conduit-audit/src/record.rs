//! Audit record types.
//!
//! One record per dispatch, written after the attempt sequence concludes and
//! never updated afterwards.

use chrono::{DateTime, Utc};
use conduit_core::{CallRequest, CallResult, HttpMethod};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The upstream answered; the record carries its final status.
    Completed,
    /// The adapter raised instead of returning a result.
    Fault,
    /// The caller's deadline expired before the attempts concluded.
    TimedOut,
    /// Rejected before any adapter was invoked.
    Rejected,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Fault => "fault",
            Self::TimedOut => "timed_out",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "COMPLETED"),
            Self::Fault => write!(f, "FAULT"),
            Self::TimedOut => write!(f, "TIMED_OUT"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for CallOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "fault" => Ok(Self::Fault),
            "timed_out" => Ok(Self::TimedOut),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown call outcome: {}", other)),
        }
    }
}

/// Immutable log entry of one dispatch's final outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,

    /// Organization that issued the call (the verified caller, not
    /// necessarily the owner of `instance_id` for rejected calls).
    pub organization_id: Uuid,

    pub instance_id: Uuid,

    pub endpoint: String,

    pub method: HttpMethod,

    /// Status of the final attempt, or the synthesized status.
    pub status_code: u16,

    /// Elapsed time of the final attempt.
    pub response_time_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub outcome: CallOutcome,

    /// Adapter invocations made; zero for rejections.
    pub attempts: u32,

    /// Ordering key for every metrics query.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a builder with the identifying fields set.
    pub fn builder(
        organization_id: Uuid,
        instance_id: Uuid,
        endpoint: impl Into<String>,
        method: HttpMethod,
    ) -> AuditRecordBuilder {
        AuditRecordBuilder::new(organization_id, instance_id, endpoint, method)
    }

    /// Record for a dispatch that ran its attempt sequence.
    pub fn for_result(
        organization_id: Uuid,
        instance_id: Uuid,
        request: &CallRequest,
        result: &CallResult,
        outcome: CallOutcome,
        attempts: u32,
    ) -> Self {
        let mut builder = Self::builder(
            organization_id,
            instance_id,
            request.endpoint.clone(),
            request.method,
        )
        .status_code(result.status_code)
        .response_time_ms(result.response_time_ms)
        .outcome(outcome)
        .attempts(attempts);

        if let Some(ref message) = result.error_message {
            builder = builder.error(message.clone());
        }
        builder.build()
    }

    /// Zero-duration failed record for a dispatch rejected before execution.
    pub fn rejected(
        organization_id: Uuid,
        instance_id: Uuid,
        request: &CallRequest,
        status_code: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self::builder(
            organization_id,
            instance_id,
            request.endpoint.clone(),
            request.method,
        )
        .status_code(status_code)
        .error(reason)
        .outcome(CallOutcome::Rejected)
        .attempts(0)
        .build()
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }

    /// Format the record as a human-readable log line.
    ///
    /// Format: `[timestamp] OUTCOME instance=... method=... endpoint=... status=...`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} org={} instance={} method={} endpoint={} status={} duration_ms={}",
            self.created_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.outcome,
            self.organization_id,
            self.instance_id,
            self.method,
            self.endpoint,
            self.status_code,
            self.response_time_ms,
        );

        if self.attempts > 1 {
            line.push_str(&format!(" attempts={}", self.attempts));
        }

        if let Some(ref error) = self.error_message {
            let preview = if error.len() > 100 {
                let mut cut = 100;
                while !error.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...", &error[..cut])
            } else {
                error.clone()
            };
            line.push_str(&format!(
                " error=\"{}\"",
                preview.replace('"', "'").replace('\n', " ")
            ));
        }

        line
    }
}

/// Builder for audit records.
#[derive(Debug)]
pub struct AuditRecordBuilder {
    record: AuditRecord,
}

impl AuditRecordBuilder {
    pub fn new(
        organization_id: Uuid,
        instance_id: Uuid,
        endpoint: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            record: AuditRecord {
                id: Uuid::new_v4(),
                organization_id,
                instance_id,
                endpoint: endpoint.into(),
                method,
                status_code: 0,
                response_time_ms: 0,
                error_message: None,
                outcome: CallOutcome::Completed,
                attempts: 1,
                created_at: Utc::now(),
            },
        }
    }

    pub fn status_code(mut self, status_code: u16) -> Self {
        self.record.status_code = status_code;
        self
    }

    pub fn response_time_ms(mut self, ms: u64) -> Self {
        self.record.response_time_ms = ms;
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.record.error_message = Some(message.into());
        self
    }

    pub fn outcome(mut self, outcome: CallOutcome) -> Self {
        self.record.outcome = outcome;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.record.attempts = attempts;
        self
    }

    /// Override the timestamp (imports and fixtures).
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.created_at = at;
        self
    }

    pub fn build(self) -> AuditRecord {
        self.record
    }
}
