//! Filters for reading the audit trail.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::record::AuditRecord;

/// Filter for querying audit records.
///
/// Results are ordered by `created_at`, oldest first unless `newest_first`
/// is set.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Only records issued by this organization.
    pub organization_id: Option<Uuid>,
    /// Only records for these instances. An empty list matches nothing.
    pub instance_ids: Option<Vec<Uuid>>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub until: Option<DateTime<Utc>>,
    /// Only records with `status_code >= min_status`.
    pub min_status: Option<u16>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Sort descending by `created_at`.
    pub newest_first: bool,
}

impl AuditQuery {
    /// Tenant-scoped query: the organization's own calls on its own instances.
    pub fn for_instances(organization_id: Uuid, instance_ids: Vec<Uuid>) -> Self {
        Self {
            organization_id: Some(organization_id),
            instance_ids: Some(instance_ids),
            ..Default::default()
        }
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn min_status(mut self, status: u16) -> Self {
        self.min_status = Some(status);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    /// Whether a record passes every filter (ordering and limit aside).
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(org) = self.organization_id
            && record.organization_id != org
        {
            return false;
        }
        if let Some(ref ids) = self.instance_ids
            && !ids.contains(&record.instance_id)
        {
            return false;
        }
        if let Some(since) = self.since
            && record.created_at < since
        {
            return false;
        }
        if let Some(until) = self.until
            && record.created_at >= until
        {
            return false;
        }
        if let Some(min_status) = self.min_status
            && record.status_code < min_status
        {
            return false;
        }
        true
    }

    /// Filter, order and truncate an in-memory set of records.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a AuditRecord>) -> Vec<AuditRecord> {
        let mut results: Vec<AuditRecord> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();

        results.sort_by_key(|record| record.created_at);
        if self.newest_first {
            results.reverse();
        }
        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use conduit_core::HttpMethod;

    fn record_at(org: Uuid, instance: Uuid, status: u16, at: DateTime<Utc>) -> AuditRecord {
        AuditRecord::builder(org, instance, "x", HttpMethod::Get)
            .status_code(status)
            .created_at(at)
            .build()
    }

    #[test]
    fn test_tenant_scoping() {
        let org = Uuid::new_v4();
        let mine = Uuid::new_v4();
        let now = Utc::now();
        let records = [
            record_at(org, mine, 200, now),
            record_at(org, Uuid::new_v4(), 200, now),
            record_at(Uuid::new_v4(), mine, 404, now),
        ];

        let results = AuditQuery::for_instances(org, vec![mine]).apply(&records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status_code, 200);
    }

    #[test]
    fn test_empty_instance_list_matches_nothing() {
        let org = Uuid::new_v4();
        let records = [record_at(org, Uuid::new_v4(), 200, Utc::now())];
        assert!(AuditQuery::for_instances(org, vec![]).apply(&records).is_empty());
    }

    #[test]
    fn test_half_open_window_and_ordering() {
        let org = Uuid::new_v4();
        let instance = Uuid::new_v4();
        let now = Utc::now();
        let records = [
            record_at(org, instance, 201, now - Duration::days(2)),
            record_at(org, instance, 500, now - Duration::days(7)),
            record_at(org, instance, 200, now - Duration::days(1)),
            record_at(org, instance, 202, now),
        ];

        let results = AuditQuery::for_instances(org, vec![instance])
            .since(now - Duration::days(7))
            .until(now)
            .newest_first()
            .apply(&records);

        let statuses: Vec<u16> = results.iter().map(|r| r.status_code).collect();
        assert_eq!(statuses, vec![200, 201, 500]);
    }

    #[test]
    fn test_min_status_and_limit() {
        let org = Uuid::new_v4();
        let instance = Uuid::new_v4();
        let now = Utc::now();
        let records: Vec<_> = [200, 404, 500, 302, 429]
            .into_iter()
            .enumerate()
            .map(|(i, s)| record_at(org, instance, s, now - Duration::minutes(i as i64)))
            .collect();

        let results = AuditQuery::for_instances(org, vec![instance])
            .min_status(400)
            .newest_first()
            .limit(2)
            .apply(&records);

        let statuses: Vec<u16> = results.iter().map(|r| r.status_code).collect();
        assert_eq!(statuses, vec![404, 500]);
    }
}
