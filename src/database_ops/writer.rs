//! Idempotent batch upsert.
//!
//! Rows are deduplicated on their natural key (last one wins), split into
//! `R::CHUNK`-sized statements and written with
//! `ON CONFLICT (key) DO UPDATE SET col = EXCLUDED.col` for every non-key
//! column. Nothing is retried here.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use super::{UpsertRow, SCHEMA};
use crate::error::{SeedError, SeedResult};

/// Keeps the last row seen for each key, preserving first-seen order.
pub fn dedupe_by_key<R: UpsertRow>(rows: Vec<R>) -> Vec<R> {
    let mut slot: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut out: Vec<R> = Vec::with_capacity(rows.len());
    for row in rows {
        match slot.get(&row.key()) {
            Some(&i) => out[i] = row,
            None => {
                slot.insert(row.key(), out.len());
                out.push(row);
            }
        }
    }
    out
}

pub fn insert_prefix<R: UpsertRow>() -> String {
    let cols: Vec<&str> = R::COLUMNS.iter().map(|(c, _)| *c).collect();
    format!("INSERT INTO {SCHEMA}.{} ({}) ", R::TABLE, cols.join(", "))
}

pub fn conflict_clause<R: UpsertRow>() -> String {
    let updates: Vec<String> = R::COLUMNS
        .iter()
        .map(|(c, _)| *c)
        .filter(|c| !R::KEY.contains(c))
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    let keys = R::KEY.join(", ");
    if updates.is_empty() {
        format!(" ON CONFLICT ({keys}) DO NOTHING")
    } else {
        format!(" ON CONFLICT ({keys}) DO UPDATE SET {}", updates.join(", "))
    }
}

#[instrument(skip(pool, rows), fields(table = R::TABLE, rows = rows.len()))]
pub async fn upsert_rows<R: UpsertRow>(pool: &PgPool, operation: &str, rows: Vec<R>) -> SeedResult<u64> {
    if rows.is_empty() {
        return Ok(0);
    }
    let rows = dedupe_by_key(rows);
    let prefix = insert_prefix::<R>();
    let conflict = conflict_clause::<R>();
    let mut written = 0u64;
    for chunk in rows.chunks(R::CHUNK.max(1)) {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(&prefix);
        qb.push_values(chunk, |mut b, row| {
            row.push_binds(&mut b);
        });
        qb.push(&conflict);
        qb.build()
            .persistent(false)
            .execute(pool)
            .await
            .map_err(|source| SeedError::Store {
                operation: operation.to_string(),
                source,
            })?;
        written += chunk.len() as u64;
    }
    debug!(written, "upsert complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::store_row;

    store_row! {
        pub struct StatRow => "play_stats_test", key(play_id, athlete_id), chunk 2;
        {
            play_id: String = "TEXT",
            athlete_id: String = "TEXT",
            stat: Option<f64> = "DOUBLE PRECISION",
        }
    }

    store_row! {
        pub struct LinkRow => "links_test", key(a, b), chunk 500;
        {
            a: i32 = "INTEGER",
            b: i32 = "INTEGER",
        }
    }

    fn stat(play: &str, athlete: &str, v: f64) -> StatRow {
        StatRow {
            play_id: play.into(),
            athlete_id: athlete.into(),
            stat: Some(v),
        }
    }

    #[test]
    fn builds_insert_and_conflict_sql() {
        assert_eq!(
            insert_prefix::<StatRow>(),
            "INSERT INTO cfbd.play_stats_test (play_id, athlete_id, stat) "
        );
        assert_eq!(
            conflict_clause::<StatRow>(),
            " ON CONFLICT (play_id, athlete_id) DO UPDATE SET stat = EXCLUDED.stat"
        );
    }

    #[test]
    fn key_only_tables_do_nothing_on_conflict() {
        assert_eq!(conflict_clause::<LinkRow>(), " ON CONFLICT (a, b) DO NOTHING");
    }

    #[test]
    fn dedupe_keeps_last_value_in_first_position() {
        let rows = vec![stat("p1", "a", 1.0), stat("p2", "a", 2.0), stat("p1", "a", 3.0)];
        let out = dedupe_by_key(rows);
        assert_eq!(out, vec![stat("p1", "a", 3.0), stat("p2", "a", 2.0)]);
    }

    #[test]
    fn composite_keys_do_not_collide_on_concatenation() {
        let rows = vec![stat("p1", "2a", 1.0), stat("p12", "a", 2.0)];
        assert_eq!(dedupe_by_key(rows).len(), 2);
    }
}
