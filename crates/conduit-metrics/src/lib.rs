//! Tenant dashboards computed from the audit trail: summary counters, daily
//! usage, recent activity and errors, and per-provider performance.

pub mod aggregator;
pub mod dto;
pub mod error;

pub use aggregator::{
    DEFAULT_ACTIVITY_LIMIT, DEFAULT_ERRORS_LIMIT, DEFAULT_PERFORMANCE_DAYS, DEFAULT_USAGE_DAYS,
    MetricsAggregator,
};
pub use dto::{
    ActivityItem, ActivityStatus, ErrorItem, MetricsSummary, ProviderPerformance, UsageBucket,
};
pub use error::MetricsError;
