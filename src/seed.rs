//! Top-level run: sentinel check, schema setup when needed, then the phase plan.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, instrument};

use crate::database_ops::{schema, sentinel, Store};
use crate::entities;
use crate::error::{SeedError, SeedResult};
use crate::orchestrator::{run_phases, PhaseReport};
use crate::provider::Upstream;
use crate::task::{TaskContext, TaskReport};

pub struct Seeder<S, U> {
    ctx: TaskContext<S, U>,
}

impl<S: Store, U: Upstream> Seeder<S, U> {
    pub fn new(ctx: TaskContext<S, U>) -> Self {
        Self { ctx }
    }

    /// Runs schema setup when `force` is set or the sentinel reports the
    /// store as uninitialized. Returns whether setup ran.
    pub async fn ensure_schema(&self, force: bool) -> SeedResult<bool> {
        if !force && sentinel::is_initialized(&*self.ctx.store).await? {
            info!("store already initialized; skipping schema setup");
            return Ok(false);
        }
        schema::initialize(&*self.ctx.store, &entities::tables()).await?;
        Ok(true)
    }

    /// Full seed. An empty `only` runs every task.
    #[instrument(skip_all, fields(only = ?only))]
    pub async fn run(&self, only: &[String]) -> SeedResult<Vec<PhaseReport>> {
        let mut phases = entities::plan::<S, U>();
        if !only.is_empty() {
            let known: HashSet<&str> = phases.iter().flat_map(|p| p.task_names()).collect();
            let unknown: Vec<&str> = only
                .iter()
                .map(String::as_str)
                .filter(|n| !known.contains(n))
                .collect();
            if !unknown.is_empty() {
                return Err(SeedError::InvalidConfig(format!(
                    "unknown task(s): {}",
                    unknown.join(", ")
                )));
            }
            for phase in &mut phases {
                phase.retain(only);
            }
        }

        let started = Instant::now();
        self.ensure_schema(false).await?;
        let reports = run_phases(&phases, &self.ctx).await?;

        let mut total = TaskReport::default();
        for r in &reports {
            total.absorb(r.totals());
        }
        info!(
            phases = reports.len(),
            requests = total.requests,
            fetched = total.fetched,
            dropped = total.dropped,
            written = total.written,
            skipped_keys = total.skipped_keys,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "seed complete"
        );
        Ok(reports)
    }
}
