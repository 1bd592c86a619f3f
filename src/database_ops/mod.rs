//! Store seam: the `cfbd` namespace in Postgres, or an in-memory stand-in
//! under test.

pub mod db;
#[cfg(test)]
pub mod memory;
pub mod schema;
pub mod sentinel;
pub mod writer;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::query_builder::Separated;
use sqlx::Postgres;

use crate::error::SeedResult;
use schema::SchemaStep;

pub const SCHEMA: &str = "cfbd";

/// One store row keyed by upstream identifiers.
///
/// Implementations are generated by [`store_row!`]; the column list doubles
/// as the table definition used by schema setup.
pub trait UpsertRow: Serialize + Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    /// `(column, sql type)` in bind order.
    const COLUMNS: &'static [(&'static str, &'static str)];
    const KEY: &'static [&'static str];
    /// Rows per INSERT statement.
    const CHUNK: usize;

    /// Natural key rendered as a string, used for in-batch dedupe.
    fn key(&self) -> String;

    fn push_binds<'qb, 'args>(&self, b: &mut Separated<'qb, 'args, Postgres, &'static str>);
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Upserts `rows` into `R::TABLE`. Returns the number of rows sent.
    async fn upsert<R: UpsertRow>(&self, operation: &str, rows: Vec<R>) -> SeedResult<u64>;

    /// Every game id stored for `year`, ascending.
    async fn game_ids(&self, year: i32) -> SeedResult<Vec<i64>>;

    async fn schema_exists(&self) -> SeedResult<bool>;
    async fn table_exists(&self, table: &str) -> SeedResult<bool>;
    async fn constraint_exists(&self, constraint: &str) -> SeedResult<bool>;

    async fn apply_step(&self, step: &SchemaStep) -> SeedResult<()>;

    /// `None` when the table does not exist yet.
    async fn row_count(&self, table: &str) -> SeedResult<Option<i64>>;
}

/// Declares a store row struct and its [`UpsertRow`] impl.
///
/// ```ignore
/// store_row! {
///     pub struct PlayTypeRow => "play_types", key(id), chunk 500;
///     {
///         id: i32 = "INTEGER",
///         text: Option<String> = "TEXT",
///     }
/// }
/// ```
macro_rules! store_row {
    (
        $(#[$meta:meta])*
        pub struct $name:ident => $table:literal, key($($key:ident),+ $(,)?), chunk $chunk:expr;
        { $($field:ident : $ty:ty = $sql:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        pub struct $name {
            $(pub $field: $ty,)+
        }

        impl $crate::database_ops::UpsertRow for $name {
            const TABLE: &'static str = $table;
            const COLUMNS: &'static [(&'static str, &'static str)] =
                &[$((stringify!($field), $sql)),+];
            const KEY: &'static [&'static str] = &[$(stringify!($key)),+];
            const CHUNK: usize = $chunk;

            fn key(&self) -> String {
                let parts: Vec<String> = vec![$(self.$key.to_string()),+];
                parts.join("\u{1f}")
            }

            fn push_binds<'qb, 'args>(
                &self,
                b: &mut sqlx::query_builder::Separated<'qb, 'args, sqlx::Postgres, &'static str>,
            ) {
                $(b.push_bind(self.$field.clone());)+
            }
        }
    };
}
pub(crate) use store_row;

/// Table name plus its DDL, collected for schema setup and status output.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub name: &'static str,
    pub create_sql: String,
}

impl TableDef {
    pub fn of<R: UpsertRow>() -> Self {
        Self {
            name: R::TABLE,
            create_sql: schema::create_table_sql::<R>(),
        }
    }
}
