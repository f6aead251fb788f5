use crate::{PgStore, args_add};
use async_trait::async_trait;
use conduit_audit::{AuditError, AuditQuery, AuditRecord, AuditStore, CallOutcome};
use conduit_core::HttpMethod;
use sqlx::Row;
use sqlx::postgres::{PgArguments, PgRow};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, organization_id, instance_id, endpoint, method, status_code, \
     response_time_ms, error_message, outcome, attempts, created_at";

/// `WHERE` clause and bound arguments for an [`AuditQuery`].
struct Filter {
    conditions: Vec<String>,
    args: PgArguments,
}

impl Filter {
    fn from_query(query: &AuditQuery) -> Result<Self, AuditError> {
        let mut filter = Self {
            conditions: Vec::new(),
            args: PgArguments::default(),
        };

        if let Some(org) = query.organization_id {
            filter.push("organization_id = ", org)?;
        }
        if let Some(ref ids) = query.instance_ids {
            // An empty array matches nothing, same as the in-memory filter.
            filter.push_any("instance_id", ids.clone())?;
        }
        if let Some(since) = query.since {
            filter.push("created_at >= ", since)?;
        }
        if let Some(until) = query.until {
            filter.push("created_at < ", until)?;
        }
        if let Some(min_status) = query.min_status {
            filter.push("status_code >= ", i32::from(min_status))?;
        }
        Ok(filter)
    }

    fn next_placeholder(&self) -> usize {
        self.conditions.len() + 1
    }

    fn push<T>(&mut self, condition: &str, value: T) -> Result<(), AuditError>
    where
        T: Send + Sync + 'static,
        for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        let n = self.next_placeholder();
        args_add(&mut self.args, value).map_err(AuditError::QueryFailed)?;
        self.conditions.push(format!("{}${}", condition, n));
        Ok(())
    }

    fn push_any(&mut self, column: &str, values: Vec<Uuid>) -> Result<(), AuditError> {
        let n = self.next_placeholder();
        args_add(&mut self.args, values).map_err(AuditError::QueryFailed)?;
        self.conditions.push(format!("{} = ANY(${})", column, n));
        Ok(())
    }

    fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

fn select_sql(query: &AuditQuery, filter: &Filter) -> String {
    let mut sql = format!(
        "SELECT {} FROM api_calls{} ORDER BY created_at {}",
        SELECT_COLUMNS,
        filter.where_sql(),
        if query.newest_first { "DESC" } else { "ASC" }
    );
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    sql
}

fn record_from_row(row: &PgRow) -> Result<AuditRecord, AuditError> {
    let corrupt = |e: sqlx::Error| AuditError::QueryFailed(e.to_string());

    let method: String = row.try_get("method").map_err(corrupt)?;
    let method: HttpMethod = method
        .parse()
        .map_err(|e: conduit_core::ParseMethodError| AuditError::QueryFailed(e.to_string()))?;
    let outcome: String = row.try_get("outcome").map_err(corrupt)?;
    let outcome: CallOutcome = outcome.parse().map_err(AuditError::QueryFailed)?;
    let status_code: i32 = row.try_get("status_code").map_err(corrupt)?;
    let response_time_ms: i64 = row.try_get("response_time_ms").map_err(corrupt)?;
    let attempts: i32 = row.try_get("attempts").map_err(corrupt)?;

    Ok(AuditRecord {
        id: row.try_get("id").map_err(corrupt)?,
        organization_id: row.try_get("organization_id").map_err(corrupt)?,
        instance_id: row.try_get("instance_id").map_err(corrupt)?,
        endpoint: row.try_get("endpoint").map_err(corrupt)?,
        method,
        status_code: u16::try_from(status_code)
            .map_err(|_| AuditError::QueryFailed(format!("status out of range: {}", status_code)))?,
        response_time_ms: response_time_ms.max(0) as u64,
        error_message: row.try_get("error_message").map_err(corrupt)?,
        outcome,
        attempts: attempts.max(0) as u32,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

#[async_trait]
impl AuditStore for PgStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO api_calls
                (id, organization_id, instance_id, endpoint, method, status_code,
                 response_time_ms, error_message, outcome, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.organization_id)
        .bind(record.instance_id)
        .bind(&record.endpoint)
        .bind(record.method.as_str())
        .bind(i32::from(record.status_code))
        .bind(i64::try_from(record.response_time_ms).unwrap_or(i64::MAX))
        .bind(&record.error_message)
        .bind(record.outcome.as_str())
        .bind(i32::try_from(record.attempts).unwrap_or(i32::MAX))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::AppendFailed(e.to_string()))?;

        tracing::debug!(record_id = %record.id, "Audit record appended");
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let filter = Filter::from_query(query)?;
        let sql = select_sql(query, &filter);
        let rows = sqlx::query_with(&sql, filter.args)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self, query: &AuditQuery) -> Result<usize, AuditError> {
        let filter = Filter::from_query(query)?;
        let sql = format!("SELECT COUNT(*) FROM api_calls{}", filter.where_sql());
        let (count,): (i64,) = sqlx::query_as_with(&sql, filter.args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        let count = count.max(0) as usize;
        Ok(query.limit.map_or(count, |limit| count.min(limit)))
    }

    async fn get(&self, record_id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        let sql = format!("SELECT {} FROM api_calls WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        row.as_ref().map(record_from_row).transpose()
    }
}
