//! One-time schema setup.
//!
//! Steps run in order and are each idempotent, so a partial setup can simply
//! be re-run. The marker table is created after every entity table and the
//! season-type constraint is applied last; the sentinel keys off both.

use tracing::info;

use super::{Store, TableDef, UpsertRow, SCHEMA};
use crate::error::SeedResult;

pub const MARKER_TABLE: &str = "seed_marker";
pub const SEASON_TYPE_CONSTRAINT: &str = "calendar_weeks_season_type_check";

pub const SEASON_TYPES: &[&str] = &[
    "regular",
    "postseason",
    "both",
    "allstar",
    "spring_regular",
    "spring_postseason",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Namespace,
    Table(&'static str),
    Marker,
    Constraint,
}

#[derive(Debug, Clone)]
pub struct SchemaStep {
    pub name: &'static str,
    pub kind: StepKind,
    pub sql: String,
}

pub fn create_table_sql<R: UpsertRow>() -> String {
    let mut cols: Vec<String> = R::COLUMNS
        .iter()
        .map(|(c, ty)| {
            if R::KEY.contains(c) {
                format!("{c} {ty} NOT NULL")
            } else {
                format!("{c} {ty}")
            }
        })
        .collect();
    cols.push(format!("PRIMARY KEY ({})", R::KEY.join(", ")));
    format!(
        "CREATE TABLE IF NOT EXISTS {SCHEMA}.{} (\n    {}\n)",
        R::TABLE,
        cols.join(",\n    ")
    )
}

/// Full ordered setup for the given entity tables.
pub fn steps(tables: &[TableDef]) -> Vec<SchemaStep> {
    let mut out = Vec::with_capacity(tables.len() + 3);
    out.push(SchemaStep {
        name: "namespace",
        kind: StepKind::Namespace,
        sql: format!("CREATE SCHEMA IF NOT EXISTS {SCHEMA}"),
    });
    for t in tables {
        out.push(SchemaStep {
            name: t.name,
            kind: StepKind::Table(t.name),
            sql: t.create_sql.clone(),
        });
    }
    out.push(SchemaStep {
        name: MARKER_TABLE,
        kind: StepKind::Marker,
        sql: format!(
            "CREATE TABLE IF NOT EXISTS {SCHEMA}.{MARKER_TABLE} (
                id SMALLINT PRIMARY KEY DEFAULT 1,
                initialized_at TIMESTAMPTZ NOT NULL DEFAULT now()
             );
             INSERT INTO {SCHEMA}.{MARKER_TABLE} (id) VALUES (1) ON CONFLICT (id) DO NOTHING;"
        ),
    });
    let allowed: Vec<String> = SEASON_TYPES.iter().map(|s| format!("'{s}'")).collect();
    out.push(SchemaStep {
        name: SEASON_TYPE_CONSTRAINT,
        kind: StepKind::Constraint,
        sql: format!(
            "DO $$
             BEGIN
                 IF NOT EXISTS (
                     SELECT 1 FROM pg_constraint c
                     JOIN pg_namespace n ON n.oid = c.connamespace
                     WHERE n.nspname = '{SCHEMA}' AND c.conname = '{SEASON_TYPE_CONSTRAINT}'
                 ) THEN
                     ALTER TABLE {SCHEMA}.calendar_weeks
                         ADD CONSTRAINT {SEASON_TYPE_CONSTRAINT}
                         CHECK (season_type IN ({}));
                 END IF;
             END $$;",
            allowed.join(", ")
        ),
    });
    out
}

/// Runs every setup step in order, stopping at the first failure.
pub async fn initialize<S: Store + ?Sized>(store: &S, tables: &[TableDef]) -> SeedResult<()> {
    let plan = steps(tables);
    info!(steps = plan.len(), "running schema setup");
    for step in &plan {
        store.apply_step(step).await?;
    }
    info!("schema setup complete");
    Ok(())
}
