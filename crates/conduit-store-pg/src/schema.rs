//! DDL for the tables this crate reads and writes.

pub const CREATE_CONNECTOR_INSTANCES: &str = r#"
CREATE TABLE IF NOT EXISTS connector_instances (
    id              uuid PRIMARY KEY,
    organization_id uuid NOT NULL,
    provider_id     text NOT NULL,
    name            text NOT NULL,
    config          text NOT NULL,
    is_active       boolean NOT NULL DEFAULT true,
    created_at      timestamptz NOT NULL DEFAULT now(),
    updated_at      timestamptz NOT NULL DEFAULT now()
)
"#;

pub const CREATE_API_CALLS: &str = r#"
CREATE TABLE IF NOT EXISTS api_calls (
    id               uuid PRIMARY KEY,
    organization_id  uuid NOT NULL,
    instance_id      uuid NOT NULL,
    endpoint         text NOT NULL,
    method           text NOT NULL,
    status_code      integer NOT NULL,
    response_time_ms bigint NOT NULL,
    error_message    text,
    outcome          text NOT NULL,
    attempts         integer NOT NULL,
    created_at       timestamptz NOT NULL
)
"#;

pub const CREATE_INSTANCES_ORG_INDEX: &str = "CREATE INDEX IF NOT EXISTS connector_instances_org_idx \
     ON connector_instances (organization_id)";

pub const CREATE_API_CALLS_ORG_TIME_INDEX: &str = "CREATE INDEX IF NOT EXISTS api_calls_org_created_idx \
     ON api_calls (organization_id, created_at)";

/// Applied in order by `PgStore::ensure_schema`. Postgres rejects several
/// commands in one prepared statement, so each runs on its own.
pub const STATEMENTS: &[&str] = &[
    CREATE_CONNECTOR_INSTANCES,
    CREATE_API_CALLS,
    CREATE_INSTANCES_ORG_INDEX,
    CREATE_API_CALLS_ORG_TIME_INDEX,
];
