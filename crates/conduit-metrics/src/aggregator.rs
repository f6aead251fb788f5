use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use conduit_audit::{AuditQuery, AuditRecord, AuditStore};
use conduit_core::{ConnectorInstance, InstanceStore};
use uuid::Uuid;

use crate::dto::{
    ActivityItem, ActivityStatus, ErrorItem, MetricsSummary, ProviderPerformance, UsageBucket,
};
use crate::error::MetricsError;

pub const DEFAULT_USAGE_DAYS: u32 = 7;
pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;
pub const DEFAULT_ERRORS_LIMIT: usize = 50;
pub const DEFAULT_PERFORMANCE_DAYS: u32 = 7;

/// Read-only dashboards over the audit trail.
///
/// Every query is scoped to the calling organization: only its own calls
/// against its own current instances are counted. Records are ordered and
/// windowed by their own `created_at`.
pub struct MetricsAggregator {
    instances: Arc<dyn InstanceStore>,
    audit: Arc<dyn AuditStore>,
}

/// The organization's instances, keyed by id.
struct Scope {
    organization_id: Uuid,
    instances: HashMap<Uuid, ConnectorInstance>,
}

impl Scope {
    fn query(&self) -> AuditQuery {
        AuditQuery::for_instances(self.organization_id, self.instances.keys().copied().collect())
    }

    fn instance_name(&self, record: &AuditRecord) -> String {
        self.instances
            .get(&record.instance_id)
            .map(|i| i.name.clone())
            .unwrap_or_default()
    }

    fn provider(&self, record: &AuditRecord) -> String {
        self.instances
            .get(&record.instance_id)
            .map(|i| i.provider_id.clone())
            .unwrap_or_default()
    }
}

impl MetricsAggregator {
    pub fn new(instances: Arc<dyn InstanceStore>, audit: Arc<dyn AuditStore>) -> Self {
        Self { instances, audit }
    }

    async fn scope(&self, organization_id: Uuid) -> Result<Scope, MetricsError> {
        let instances = self
            .instances
            .list(organization_id)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect::<HashMap<_, _>>();
        tracing::debug!(
            organization_id = %organization_id,
            instances = instances.len(),
            "Resolved metrics scope"
        );
        Ok(Scope {
            organization_id,
            instances,
        })
    }

    pub async fn summary(&self, organization_id: Uuid) -> Result<MetricsSummary, MetricsError> {
        self.summary_at(organization_id, Utc::now()).await
    }

    /// Summary as of `now`: this week is `[now-7d, now)`, last week
    /// `[now-14d, now-7d)`.
    pub async fn summary_at(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MetricsSummary, MetricsError> {
        let scope = self.scope(organization_id).await?;
        let week_ago = now - Duration::days(7);
        let two_weeks_ago = now - Duration::days(14);

        let this_week = self
            .audit
            .query(&scope.query().since(week_ago).until(now))
            .await?;
        let last_week = self
            .audit
            .count(&scope.query().since(two_weeks_ago).until(week_ago))
            .await? as u64;

        let total = this_week.len() as u64;
        let errors = this_week.iter().filter(|r| r.is_error()).count() as u64;
        let active = scope.instances.values().filter(|i| i.is_active).count() as u64;

        let calls_change = if last_week > 0 {
            (total as f64 - last_week as f64) * 100.0 / last_week as f64
        } else {
            0.0
        };
        let error_rate = percent(errors, total);
        let avg_response_time = mean(this_week.iter().map(|r| r.response_time_ms));

        Ok(MetricsSummary {
            total_calls: total,
            calls_change: round_to(calls_change, 1),
            active_connectors: active,
            error_rate: round_to(error_rate, 2),
            avg_response_time: round_to(avg_response_time, 0),
        })
    }

    pub async fn usage(
        &self,
        organization_id: Uuid,
        days: u32,
    ) -> Result<Vec<UsageBucket>, MetricsError> {
        self.usage_at(organization_id, days, Utc::now()).await
    }

    /// Calls per UTC date since midnight of `now - days`, ascending. Dates
    /// without calls are omitted.
    pub async fn usage_at(
        &self,
        organization_id: Uuid,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageBucket>, MetricsError> {
        let scope = self.scope(organization_id).await?;
        let start = (now - Duration::days(i64::from(days)))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(now);

        let records = self.audit.query(&scope.query().since(start)).await?;

        let mut buckets: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        for record in &records {
            *buckets.entry(record.created_at.date_naive()).or_default() += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(date, count)| UsageBucket {
                date: date.format("%Y-%m-%d").to_string(),
                count,
            })
            .collect())
    }

    /// Latest calls, newest first.
    pub async fn activity(
        &self,
        organization_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ActivityItem>, MetricsError> {
        let scope = self.scope(organization_id).await?;
        let records = self
            .audit
            .query(&scope.query().newest_first().limit(limit))
            .await?;

        Ok(records
            .iter()
            .map(|r| ActivityItem {
                id: r.id,
                title: format!("{} {}", r.method, r.endpoint),
                description: scope.instance_name(r),
                status: ActivityStatus::from_status_code(r.status_code),
                timestamp: r.created_at,
                connector_name: scope.provider(r),
                response_time: r.response_time_ms,
            })
            .collect())
    }

    /// Latest failed calls (status >= 400), newest first.
    pub async fn errors(
        &self,
        organization_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ErrorItem>, MetricsError> {
        let scope = self.scope(organization_id).await?;
        let records = self
            .audit
            .query(&scope.query().min_status(400).newest_first().limit(limit))
            .await?;

        Ok(records
            .iter()
            .map(|r| ErrorItem {
                id: r.id,
                endpoint: r.endpoint.clone(),
                method: r.method,
                status_code: r.status_code,
                error_message: r.error_message.clone(),
                timestamp: r.created_at,
                connector_name: scope.provider(r),
                instance_name: scope.instance_name(r),
            })
            .collect())
    }

    pub async fn performance(
        &self,
        organization_id: Uuid,
        days: u32,
    ) -> Result<Vec<ProviderPerformance>, MetricsError> {
        self.performance_at(organization_id, days, Utc::now()).await
    }

    /// Per-provider figures over `[now - days, now)`, sorted by provider.
    pub async fn performance_at(
        &self,
        organization_id: Uuid,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProviderPerformance>, MetricsError> {
        let scope = self.scope(organization_id).await?;
        let since = now - Duration::days(i64::from(days));
        let records = self
            .audit
            .query(&scope.query().since(since).until(now))
            .await?;

        let mut groups: BTreeMap<String, Vec<&AuditRecord>> = BTreeMap::new();
        for record in &records {
            groups.entry(scope.provider(record)).or_default().push(record);
        }

        Ok(groups
            .into_iter()
            .map(|(connector, calls)| {
                let total = calls.len() as u64;
                let errors = calls.iter().filter(|r| r.is_error()).count() as u64;
                ProviderPerformance {
                    connector,
                    avg_response_time: mean(calls.iter().map(|r| r.response_time_ms)),
                    total_calls: total,
                    error_count: errors,
                    success_rate: percent(total - errors, total),
                }
            })
            .collect())
    }
}

/// `part / whole * 100`, or 0 for an empty whole.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

fn mean(values: impl Iterator<Item = u64>) -> f64 {
    let (sum, n) = values.fold((0u64, 0u64), |(s, n), v| (s.saturating_add(v), n + 1));
    if n == 0 { 0.0 } else { sum as f64 / n as f64 }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use conduit_audit::MemoryAuditStore;
    use conduit_core::{HttpMethod, InMemoryInstanceStore};

    struct Fixture {
        org: Uuid,
        instances: Arc<InMemoryInstanceStore>,
        audit: Arc<MemoryAuditStore>,
        aggregator: MetricsAggregator,
    }

    fn fixture() -> Fixture {
        let instances = Arc::new(InMemoryInstanceStore::new());
        let audit = Arc::new(MemoryAuditStore::new());
        let aggregator = MetricsAggregator::new(instances.clone(), audit.clone());
        Fixture {
            org: Uuid::new_v4(),
            instances,
            audit,
            aggregator,
        }
    }

    impl Fixture {
        fn instance(&self, provider: &str, name: &str) -> Uuid {
            let instance = ConnectorInstance::new(self.org, provider, name, "sealed");
            let id = instance.id;
            self.instances.insert(instance).unwrap();
            id
        }

        async fn call(&self, instance: Uuid, status: u16, ms: u64, at: DateTime<Utc>) {
            self.audit
                .append(
                    AuditRecord::builder(self.org, instance, "charges", HttpMethod::Post)
                        .status_code(status)
                        .response_time_ms(ms)
                        .created_at(at)
                        .build(),
                )
                .await
                .unwrap();
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_summary_with_no_calls_is_all_zero() {
        let f = fixture();
        f.instance("Stripe", "Payments");

        let summary = f.aggregator.summary_at(f.org, now()).await.unwrap();
        assert_eq!(
            summary,
            MetricsSummary {
                total_calls: 0,
                calls_change: 0.0,
                active_connectors: 1,
                error_rate: 0.0,
                avg_response_time: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn test_summary_week_over_week() {
        let f = fixture();
        let id = f.instance("Stripe", "Payments");
        let inactive = ConnectorInstance::new(f.org, "Slack", "Alerts", "sealed").deactivated();
        f.instances.insert(inactive).unwrap();

        // Three calls this week, one of them failed.
        f.call(id, 200, 100, now() - Duration::hours(1)).await;
        f.call(id, 201, 150, now() - Duration::days(3)).await;
        f.call(id, 500, 201, now() - Duration::days(6)).await;
        // Two last week.
        f.call(id, 200, 10, now() - Duration::days(8)).await;
        f.call(id, 200, 10, now() - Duration::days(13)).await;
        // Outside both windows.
        f.call(id, 200, 10, now() - Duration::days(20)).await;

        let summary = f.aggregator.summary_at(f.org, now()).await.unwrap();
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.calls_change, 50.0);
        assert_eq!(summary.active_connectors, 1);
        assert_eq!(summary.error_rate, 33.33);
        assert_eq!(summary.avg_response_time, 150.0);
    }

    #[tokio::test]
    async fn test_calls_change_is_zero_without_last_week() {
        let f = fixture();
        let id = f.instance("Stripe", "Payments");

        f.call(id, 200, 40, now() - Duration::hours(2)).await;
        f.call(id, 200, 60, now() - Duration::days(2)).await;
        // Older than two weeks; does not count as last week.
        f.call(id, 200, 10, now() - Duration::days(15)).await;

        let summary = f.aggregator.summary_at(f.org, now()).await.unwrap();
        assert_eq!(summary.total_calls, 2);
        assert_eq!(summary.calls_change, 0.0);
        assert!(summary.calls_change.is_finite());
    }

    #[tokio::test]
    async fn test_summary_ignores_other_tenants() {
        let f = fixture();
        let mine = f.instance("Stripe", "Payments");
        f.call(mine, 200, 10, now() - Duration::hours(1)).await;

        // Another organization's record that names my instance id.
        f.audit
            .append(
                AuditRecord::builder(Uuid::new_v4(), mine, "x", HttpMethod::Get)
                    .status_code(404)
                    .created_at(now() - Duration::hours(2))
                    .build(),
            )
            .await
            .unwrap();

        let summary = f.aggregator.summary_at(f.org, now()).await.unwrap();
        assert_eq!(summary.total_calls, 1);
        assert_eq!(summary.error_rate, 0.0);

        let stranger = f.aggregator.summary_at(Uuid::new_v4(), now()).await.unwrap();
        assert_eq!(stranger.total_calls, 0);
    }

    #[tokio::test]
    async fn test_usage_buckets_skip_empty_days() {
        let f = fixture();
        let id = f.instance("SendGrid", "Mail");

        f.call(id, 200, 1, Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap()).await;
        f.call(id, 200, 1, Utc.with_ymd_and_hms(2026, 3, 5, 23, 59, 0).unwrap()).await;
        // 2026-03-06 has no calls.
        f.call(id, 200, 1, Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap()).await;
        // Before the window start (midnight of 2026-03-03).
        f.call(id, 200, 1, Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap()).await;
        // At the window start.
        f.call(id, 200, 1, Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap()).await;

        let usage = f.aggregator.usage_at(f.org, 7, now()).await.unwrap();
        assert_eq!(
            usage,
            vec![
                UsageBucket { date: "2026-03-03".into(), count: 1 },
                UsageBucket { date: "2026-03-05".into(), count: 2 },
                UsageBucket { date: "2026-03-07".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_activity_newest_first_with_labels() {
        let f = fixture();
        let id = f.instance("Stripe", "Payments");
        f.call(id, 200, 5, now() - Duration::minutes(30)).await;
        f.call(id, 302, 5, now() - Duration::minutes(20)).await;
        f.call(id, 429, 5, now() - Duration::minutes(10)).await;

        let activity = f.aggregator.activity(f.org, 2).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].status, ActivityStatus::Error);
        assert_eq!(activity[1].status, ActivityStatus::Warning);
        assert_eq!(activity[0].title, "POST charges");
        assert_eq!(activity[0].description, "Payments");
        assert_eq!(activity[0].connector_name, "Stripe");
    }

    #[tokio::test]
    async fn test_performance_grouped_by_provider() {
        let f = fixture();
        let stripe = f.instance("Stripe", "Payments");
        let slack = f.instance("Slack", "Alerts");

        f.call(stripe, 200, 100, now() - Duration::days(1)).await;
        f.call(stripe, 502, 300, now() - Duration::days(2)).await;
        f.call(slack, 200, 40, now() - Duration::days(1)).await;
        f.call(slack, 200, 40, now() - Duration::days(9)).await;

        let perf = f.aggregator.performance_at(f.org, 7, now()).await.unwrap();
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].connector, "Slack");
        assert_eq!(perf[0].total_calls, 1);
        assert_eq!(perf[0].success_rate, 100.0);
        assert_eq!(perf[1].connector, "Stripe");
        assert_eq!(perf[1].avg_response_time, 200.0);
        assert_eq!(perf[1].error_count, 1);
        assert_eq!(perf[1].success_rate, 50.0);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(33.3333, 2), 33.33);
        assert_eq!(round_to(-12.345, 1), -12.3);
        assert_eq!(round_to(149.5, 0), 150.0);
        assert_eq!(percent(1, 0), 0.0);
    }
}
