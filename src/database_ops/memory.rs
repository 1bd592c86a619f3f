use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::schema::{SchemaStep, StepKind, MARKER_TABLE, SEASON_TYPE_CONSTRAINT};
use super::writer::dedupe_by_key;
use super::{Store, UpsertRow, SCHEMA};
use crate::error::{SeedError, SeedResult};

type Table = BTreeMap<String, Value>;

#[derive(Default)]
struct State {
    namespace: bool,
    marker: bool,
    constraint: bool,
    created: HashSet<&'static str>,
    tables: HashMap<&'static str, Table>,
    write_calls: HashMap<&'static str, usize>,
    failing_steps: HashSet<String>,
    failing_tables: HashSet<String>,
}

/// In-memory store for tests. Last write wins per natural key.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_step(&self, step: &str) {
        self.state.lock().unwrap().failing_steps.insert(step.to_string());
    }

    pub fn fail_writes_to(&self, table: &str) {
        self.state.lock().unwrap().failing_tables.insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        let mut st = self.state.lock().unwrap();
        st.failing_steps.clear();
        st.failing_tables.clear();
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    pub fn write_calls(&self, table: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .write_calls
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    /// Every table's rows, ordered, for whole-store comparisons.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Value>> {
        self.state
            .lock()
            .unwrap()
            .tables
            .iter()
            .map(|(name, t)| (name.to_string(), t.values().cloned().collect()))
            .collect()
    }
}

fn injected(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure: {what}"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert<R: UpsertRow>(&self, operation: &str, rows: Vec<R>) -> SeedResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = dedupe_by_key(rows);
        let mut st = self.state.lock().unwrap();
        *st.write_calls.entry(R::TABLE).or_default() += 1;
        if st.failing_tables.contains(R::TABLE) {
            return Err(SeedError::Store {
                operation: operation.to_string(),
                source: injected(R::TABLE),
            });
        }
        let mut encoded = Vec::with_capacity(rows.len());
        for row in &rows {
            let value = serde_json::to_value(row).map_err(|e| SeedError::Store {
                operation: operation.to_string(),
                source: injected(&e.to_string()),
            })?;
            encoded.push((row.key(), value));
        }
        let table = st.tables.entry(R::TABLE).or_default();
        for (key, value) in encoded {
            table.insert(key, value);
        }
        Ok(rows.len() as u64)
    }

    async fn game_ids(&self, year: i32) -> SeedResult<Vec<i64>> {
        let st = self.state.lock().unwrap();
        let mut ids: Vec<i64> = st
            .tables
            .get("games")
            .map(|t| {
                t.values()
                    .filter(|g| g.get("season").and_then(Value::as_i64) == Some(i64::from(year)))
                    .filter_map(|g| g.get("id").and_then(Value::as_i64))
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn schema_exists(&self) -> SeedResult<bool> {
        Ok(self.state.lock().unwrap().namespace)
    }

    async fn table_exists(&self, table: &str) -> SeedResult<bool> {
        let st = self.state.lock().unwrap();
        let bare = table.strip_prefix(&format!("{SCHEMA}.")).unwrap_or(table);
        if bare == MARKER_TABLE {
            return Ok(st.marker);
        }
        Ok(st.created.contains(bare))
    }

    async fn constraint_exists(&self, constraint: &str) -> SeedResult<bool> {
        Ok(constraint == SEASON_TYPE_CONSTRAINT && self.state.lock().unwrap().constraint)
    }

    async fn apply_step(&self, step: &SchemaStep) -> SeedResult<()> {
        let mut st = self.state.lock().unwrap();
        if st.failing_steps.contains(step.name) {
            return Err(SeedError::Schema {
                step: step.name,
                source: injected(step.name),
            });
        }
        match &step.kind {
            StepKind::Namespace => st.namespace = true,
            StepKind::Table(name) => {
                st.created.insert(*name);
            }
            StepKind::Marker => st.marker = true,
            StepKind::Constraint => st.constraint = true,
        }
        Ok(())
    }

    async fn row_count(&self, table: &str) -> SeedResult<Option<i64>> {
        let st = self.state.lock().unwrap();
        if !st.created.contains(table) && !st.tables.contains_key(table) {
            return Ok(None);
        }
        Ok(Some(st.tables.get(table).map(|t| t.len() as i64).unwrap_or(0)))
    }
}
