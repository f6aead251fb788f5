use crate::PgStore;
use async_trait::async_trait;
use conduit_core::{ConnectorInstance, InstanceStore, StoreError};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, organization_id, provider_id, name, config, is_active, created_at, updated_at";

/// Identity columns (`id`, `organization_id`, `provider_id`) are never
/// rewritten on conflict; only the mutable fields are.
const UPSERT_INSTANCE: &str = r#"
INSERT INTO connector_instances
    (id, organization_id, provider_id, name, config, is_active, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    config = EXCLUDED.config,
    is_active = EXCLUDED.is_active,
    updated_at = EXCLUDED.updated_at
"#;

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn instance_from_row(row: &PgRow) -> Result<ConnectorInstance, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::Corrupt(e.to_string());
    Ok(ConnectorInstance {
        id: row.try_get("id").map_err(corrupt)?,
        organization_id: row.try_get("organization_id").map_err(corrupt)?,
        provider_id: row.try_get("provider_id").map_err(corrupt)?,
        name: row.try_get("name").map_err(corrupt)?,
        config: row.try_get("config").map_err(corrupt)?,
        is_active: row.try_get("is_active").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

impl PgStore {
    /// Insert or replace an instance. Instances are owned by the CRUD
    /// subsystem; this exists for seeding and tests.
    pub async fn upsert_instance(&self, instance: &ConnectorInstance) -> Result<(), StoreError> {
        sqlx::query(UPSERT_INSTANCE)
            .bind(instance.id)
            .bind(instance.organization_id)
            .bind(&instance.provider_id)
            .bind(&instance.name)
            .bind(&instance.config)
            .bind(instance.is_active)
            .bind(instance.created_at)
            .bind(instance.updated_at)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for PgStore {
    async fn get(
        &self,
        instance_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<ConnectorInstance>, StoreError> {
        let sql = format!(
            "SELECT {} FROM connector_instances WHERE id = $1 AND organization_id = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(instance_id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.as_ref().map(instance_from_row).transpose()
    }

    async fn list(&self, organization_id: Uuid) -> Result<Vec<ConnectorInstance>, StoreError> {
        let sql = format!(
            "SELECT {} FROM connector_instances WHERE organization_id = $1 ORDER BY created_at",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(instance_from_row).collect()
    }

    async fn list_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query("SELECT id FROM connector_instances WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid, _>("id")
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .collect()
    }

    async fn active_count(&self, organization_id: Uuid) -> Result<usize, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM connector_instances WHERE organization_id = $1 AND is_active",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(count.max(0) as usize)
    }
}
