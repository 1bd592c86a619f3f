use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};
use tracing::{info, instrument};

use super::schema::SchemaStep;
use super::{writer, Store, UpsertRow, SCHEMA};
use crate::error::{SeedError, SeedResult};

/// Pool and session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbOptions {
    pub max_connections: u32,
    /// Keep the statement cache on. Off by default for PgBouncer txn mode.
    pub use_prepared: bool,
    /// Per-connection `synchronous_commit = off` plus a larger `work_mem`.
    pub fast_ingest: bool,
    pub work_mem_mb: u32,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            max_connections: 20,
            use_prepared: false,
            fast_ingest: false,
            work_mem_mb: 64,
        }
    }
}

#[derive(Clone)]
pub struct Db {
    pub pool: PgPool,
}

fn is_undefined_table_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("42P01"),
        _ => false,
    }
}

fn query_err(operation: &str) -> impl FnOnce(sqlx::Error) -> SeedError + '_ {
    move |source| SeedError::Query {
        operation: operation.to_string(),
        source,
    }
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, opts: DbOptions) -> SeedResult<Self> {
        let mut connect_options =
            PgConnectOptions::from_str(database_url).map_err(query_err("connect"))?;

        if database_url.contains("sslmode=require") && !database_url.contains("sslmode=disable") {
            connect_options = connect_options.ssl_mode(PgSslMode::Require);
        }

        if !opts.use_prepared {
            // PgBouncer txn mode safe
            connect_options = connect_options.statement_cache_capacity(0);
        }

        let fast_ingest = opts.fast_ingest;
        let work_mem_mb = opts.work_mem_mb;
        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if fast_ingest {
                        // Best-effort; restricted roles may refuse session settings
                        let _ = sqlx::query("SET synchronous_commit = 'off'")
                            .execute(&mut *conn)
                            .await;
                        let _ = sqlx::query(&format!("SET work_mem = '{}MB'", work_mem_mb))
                            .execute(&mut *conn)
                            .await;
                    }
                    Ok(())
                })
            })
            .connect_with(connect_options)
            .await
            .map_err(query_err("connect"))?;
        info!(
            max_connections = opts.max_connections,
            fast_ingest, "connected to db"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for Db {
    async fn upsert<R: UpsertRow>(&self, operation: &str, rows: Vec<R>) -> SeedResult<u64> {
        writer::upsert_rows(&self.pool, operation, rows).await
    }

    async fn game_ids(&self, year: i32) -> SeedResult<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT id::bigint FROM {SCHEMA}.games WHERE season = $1 ORDER BY id"
        ))
        .persistent(false)
        .bind(year)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err("game_ids"))
    }

    async fn schema_exists(&self) -> SeedResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
        )
        .persistent(false)
        .bind(SCHEMA)
        .fetch_one(&self.pool)
        .await
        .map_err(query_err("sentinel.namespace"))
    }

    async fn table_exists(&self, table: &str) -> SeedResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .persistent(false)
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .map_err(query_err("sentinel.marker"))
    }

    async fn constraint_exists(&self, constraint: &str) -> SeedResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM pg_constraint c
                JOIN pg_namespace n ON n.oid = c.connamespace
                WHERE n.nspname = $1 AND c.conname = $2
             )",
        )
        .persistent(false)
        .bind(SCHEMA)
        .bind(constraint)
        .fetch_one(&self.pool)
        .await
        .map_err(query_err("sentinel.constraint"))
    }

    #[instrument(skip(self, step), fields(step = step.name))]
    async fn apply_step(&self, step: &SchemaStep) -> SeedResult<()> {
        // raw_sql: multi-statement and no prepared statements under PgBouncer
        sqlx::raw_sql(&step.sql)
            .execute(&self.pool)
            .await
            .map_err(|source| SeedError::Schema {
                step: step.name,
                source,
            })?;
        Ok(())
    }

    async fn row_count(&self, table: &str) -> SeedResult<Option<i64>> {
        match sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {SCHEMA}.{table}"))
            .persistent(false)
            .fetch_one(&self.pool)
            .await
        {
            Ok(n) => Ok(Some(n)),
            Err(e) if is_undefined_table_error(&e) => Ok(None),
            Err(e) => Err(query_err("row_count")(e)),
        }
    }
}
