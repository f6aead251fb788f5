//! Tenant dashboards under `/api/metrics`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{Extension, Json};
use conduit_metrics::{
    ActivityItem, DEFAULT_ACTIVITY_LIMIT, DEFAULT_ERRORS_LIMIT, DEFAULT_PERFORMANCE_DAYS,
    DEFAULT_USAGE_DAYS, ErrorItem, MetricsSummary, ProviderPerformance, UsageBucket,
};
use serde::Deserialize;

use crate::error::ServerError;
use crate::middleware::OrganizationId;
use crate::state::AppState;

/// Longest window the day-based dashboards accept.
const MAX_DAYS: u32 = 366;

/// Largest page the list dashboards return.
const MAX_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    days: Option<u32>,
}

impl DaysQuery {
    fn resolve(&self, default: u32) -> Result<u32, ServerError> {
        match self.days {
            None => Ok(default),
            Some(days) if days <= MAX_DAYS => Ok(days),
            Some(days) => Err(ServerError::InvalidRequest(format!(
                "days must be at most {}, got {}",
                MAX_DAYS, days
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

impl LimitQuery {
    fn resolve(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).min(MAX_LIMIT)
    }
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
) -> Result<Json<MetricsSummary>, ServerError> {
    Ok(Json(state.metrics.summary(organization_id).await?))
}

pub async fn usage(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<UsageBucket>>, ServerError> {
    let days = query.resolve(DEFAULT_USAGE_DAYS)?;
    Ok(Json(state.metrics.usage(organization_id, days).await?))
}

pub async fn activity(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ActivityItem>>, ServerError> {
    let limit = query.resolve(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(state.metrics.activity(organization_id, limit).await?))
}

pub async fn errors(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ErrorItem>>, ServerError> {
    let limit = query.resolve(DEFAULT_ERRORS_LIMIT);
    Ok(Json(state.metrics.errors(organization_id, limit).await?))
}

pub async fn performance(
    State(state): State<Arc<AppState>>,
    Extension(OrganizationId(organization_id)): Extension<OrganizationId>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<ProviderPerformance>>, ServerError> {
    let days = query.resolve(DEFAULT_PERFORMANCE_DAYS)?;
    Ok(Json(state.metrics.performance(organization_id, days).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_defaults_and_bounds() {
        assert_eq!(DaysQuery::default().resolve(7).unwrap(), 7);
        assert_eq!(DaysQuery { days: Some(30) }.resolve(7).unwrap(), 30);
        assert!(matches!(
            DaysQuery { days: Some(10_000) }.resolve(7),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(LimitQuery::default().resolve(20), 20);
        assert_eq!(LimitQuery { limit: Some(0) }.resolve(20), 0);
        assert_eq!(LimitQuery { limit: Some(100_000) }.resolve(20), MAX_LIMIT);
    }
}
