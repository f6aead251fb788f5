//! Postgres persistence for connector instances and the call audit trail.
//!
//! One [`PgStore`] serves both collaborator traits from a shared pool, so the
//! server can hand the same `Arc` to the dispatcher and the metrics side.

use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Arguments, PgPool};

mod audit;
mod instances;
pub mod schema;

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), String>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(|e| e.to_string())
}

/// Instance and audit store backed by Postgres.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!(statements = schema::STATEMENTS.len(), "Schema ensured");
        Ok(())
    }
}
