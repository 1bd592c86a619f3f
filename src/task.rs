//! Fetch-transform-load tasks.
//!
//! Every upstream request goes through the shared throttle first. Bulk and
//! per-period tasks treat each request as all-or-nothing: a fetch error
//! fails the task. Fan-out tasks resolve their keys from the store and
//! tolerate individual key failures.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::accumulator::{BatchAccumulator, StoreFlush};
use crate::database_ops::{Store, UpsertRow};
use crate::error::{SeedError, SeedResult};
use crate::provider::{records, Endpoint, Filter, Upstream};
use crate::throttle::ThrottleHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSettings {
    pub years: Vec<i32>,
    pub fanout_concurrency: usize,
    pub flush_threshold: usize,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            years: vec![crate::config::DEFAULT_YEAR_MIN],
            fanout_concurrency: 10,
            flush_threshold: 100,
        }
    }
}

/// What a task needs to run. Cloned per task; `cancel` is the phase scope.
pub struct TaskContext<S, U> {
    pub store: Arc<S>,
    pub upstream: Arc<U>,
    pub throttle: ThrottleHandle,
    pub cancel: CancellationToken,
    pub settings: Arc<SeedSettings>,
}

impl<S, U> Clone for TaskContext<S, U> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            upstream: self.upstream.clone(),
            throttle: self.throttle.clone(),
            cancel: self.cancel.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<S, U> TaskContext<S, U> {
    pub fn new(
        store: Arc<S>,
        upstream: Arc<U>,
        throttle: ThrottleHandle,
        cancel: CancellationToken,
        settings: SeedSettings,
    ) -> Self {
        Self {
            store,
            upstream,
            throttle,
            cancel,
            settings: Arc::new(settings),
        }
    }

    /// Same collaborators under a different cancellation scope.
    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub requests: u64,
    pub fetched: u64,
    pub dropped: u64,
    pub written: u64,
    pub skipped_keys: u64,
}

impl TaskReport {
    pub fn absorb(&mut self, other: TaskReport) {
        self.requests += other.requests;
        self.fetched += other.fetched;
        self.dropped += other.dropped;
        self.written += other.written;
        self.skipped_keys += other.skipped_keys;
    }
}

#[async_trait]
pub trait SeedTask<S: Store, U: Upstream>: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: TaskContext<S, U>) -> SeedResult<TaskReport>;
}

/// Upstream record shape that maps onto at most one store row.
///
/// `filter` is the query the record came from; some payloads omit fields
/// (year, game id) that only the query carries.
pub trait Transform: DeserializeOwned + Send + 'static {
    type Row: UpsertRow;
    fn into_row(self, filter: &Filter) -> Option<Self::Row>;
}

/// Decodes and transforms each record; anything malformed is dropped and
/// counted.
pub fn transform_all<T: Transform>(
    raw: Vec<Value>,
    filter: &Filter,
    report: &mut TaskReport,
) -> Vec<T::Row> {
    let mut rows = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<T>(value) {
            Ok(rec) => match rec.into_row(filter) {
                Some(row) => rows.push(row),
                None => report.dropped += 1,
            },
            Err(e) => {
                trace!(error = %e, "dropping undecodable record");
                report.dropped += 1;
            }
        }
    }
    rows
}

async fn fetch_gated<S, U: Upstream>(
    ctx: &TaskContext<S, U>,
    operation: &str,
    endpoint: Endpoint,
    filter: &Filter,
    report: &mut TaskReport,
) -> SeedResult<Vec<Value>> {
    ctx.throttle.acquire(operation, &ctx.cancel).await?;
    report.requests += 1;
    let body = ctx
        .upstream
        .fetch(endpoint, filter)
        .await
        .map_err(|source| SeedError::Upstream {
            operation: operation.to_string(),
            filter: filter.to_string(),
            source,
        })?;
    Ok(records(body))
}

async fn load<S: Store, U, R: UpsertRow>(
    ctx: &TaskContext<S, U>,
    operation: &str,
    rows: Vec<R>,
) -> SeedResult<u64> {
    if ctx.cancel.is_cancelled() {
        return Err(SeedError::Cancelled {
            operation: operation.to_string(),
        });
    }
    ctx.store.upsert(operation, rows).await
}

/// One gated request followed by transform and load.
async fn fetch_transform_load<S: Store, U: Upstream, T: Transform>(
    ctx: &TaskContext<S, U>,
    operation: &str,
    endpoint: Endpoint,
    filter: &Filter,
    report: &mut TaskReport,
) -> SeedResult<()> {
    let raw = fetch_gated(ctx, operation, endpoint, filter, report).await?;
    if raw.is_empty() {
        debug!(operation, %filter, "no records");
        return Ok(());
    }
    report.fetched += raw.len() as u64;
    let rows = transform_all::<T>(raw, filter, report);
    report.written += load(ctx, operation, rows).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A single unfiltered request.
    Once,
    /// One request per configured year.
    PerYear,
}

/// Single-request-per-filter task.
pub struct BulkTask<T> {
    name: &'static str,
    endpoint: Endpoint,
    scope: Scope,
    _source: PhantomData<fn() -> T>,
}

impl<T> BulkTask<T> {
    pub fn once(name: &'static str, endpoint: Endpoint) -> Self {
        Self {
            name,
            endpoint,
            scope: Scope::Once,
            _source: PhantomData,
        }
    }

    pub fn per_year(name: &'static str, endpoint: Endpoint) -> Self {
        Self {
            name,
            endpoint,
            scope: Scope::PerYear,
            _source: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Store, U: Upstream, T: Transform> SeedTask<S, U> for BulkTask<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: TaskContext<S, U>) -> SeedResult<TaskReport> {
        let filters: Vec<Filter> = match self.scope {
            Scope::Once => vec![Filter::none()],
            Scope::PerYear => ctx.settings.years.iter().copied().map(Filter::year).collect(),
        };
        let mut report = TaskReport::default();
        for filter in &filters {
            fetch_transform_load::<S, U, T>(&ctx, self.name, self.endpoint, filter, &mut report)
                .await?;
        }
        Ok(report)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodKey {
    week: Option<i32>,
    season_type: Option<String>,
}

/// Distinct `(week, season type)` pairs of a calendar response, ordered.
pub fn period_pairs(raw: Vec<Value>) -> Vec<(i32, String)> {
    let set: BTreeSet<(i32, String)> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<PeriodKey>(v).ok())
        .filter_map(|k| Some((k.week?, k.season_type?)))
        .collect();
    set.into_iter().collect()
}

/// Per-(year, week, season type) task. The periods of each year come from a
/// gated calendar request; if that request fails the task fails.
pub struct PeriodTask<T> {
    name: &'static str,
    endpoint: Endpoint,
    _source: PhantomData<fn() -> T>,
}

impl<T> PeriodTask<T> {
    pub fn new(name: &'static str, endpoint: Endpoint) -> Self {
        Self {
            name,
            endpoint,
            _source: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Store, U: Upstream, T: Transform> SeedTask<S, U> for PeriodTask<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: TaskContext<S, U>) -> SeedResult<TaskReport> {
        let mut report = TaskReport::default();
        for &year in &ctx.settings.years {
            let calendar =
                fetch_gated(&ctx, self.name, Endpoint::Calendar, &Filter::year(year), &mut report)
                    .await?;
            let periods = period_pairs(calendar);
            debug!(task = self.name, year, periods = periods.len(), "resolved periods");
            for (week, season_type) in periods {
                let filter = Filter::period(year, week, season_type);
                fetch_transform_load::<S, U, T>(&ctx, self.name, self.endpoint, &filter, &mut report)
                    .await?;
            }
        }
        Ok(report)
    }
}

type RowAccumulator<S, R> = BatchAccumulator<i64, Vec<R>, StoreFlush<S, R>>;

/// One fan-out key: gate, fetch, transform, hand to the accumulator. A fetch
/// error skips the key; gate and store errors propagate.
async fn fan_one<S: Store, U: Upstream, T: Transform>(
    ctx: &TaskContext<S, U>,
    operation: &'static str,
    endpoint: Endpoint,
    acc: &RowAccumulator<S, T::Row>,
    game_id: i64,
) -> SeedResult<TaskReport> {
    let mut report = TaskReport::default();
    ctx.throttle.acquire(operation, &ctx.cancel).await?;
    report.requests = 1;
    let filter = Filter::game(game_id);
    let body = match ctx.upstream.fetch(endpoint, &filter).await {
        Ok(body) => body,
        Err(e) => {
            warn!(task = operation, game_id, error = %e, "fan-out fetch failed; skipping key");
            report.skipped_keys = 1;
            return Ok(report);
        }
    };
    let raw = records(body);
    if raw.is_empty() {
        return Ok(report);
    }
    report.fetched = raw.len() as u64;
    let rows = transform_all::<T>(raw, &filter, &mut report);
    if rows.is_empty() {
        return Ok(report);
    }
    report.written += acc.add(game_id, rows).await?;
    Ok(report)
}

/// Per-game detail task over every stored game id of each configured year.
pub struct FanoutTask<T> {
    name: &'static str,
    endpoint: Endpoint,
    _source: PhantomData<fn() -> T>,
}

impl<T> FanoutTask<T> {
    pub fn new(name: &'static str, endpoint: Endpoint) -> Self {
        Self {
            name,
            endpoint,
            _source: PhantomData,
        }
    }
}

#[async_trait]
impl<S: Store, U: Upstream, T: Transform> SeedTask<S, U> for FanoutTask<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: TaskContext<S, U>) -> SeedResult<TaskReport> {
        let workers = ctx.settings.fanout_concurrency.max(1);
        let acc: RowAccumulator<S, T::Row> = BatchAccumulator::new(
            ctx.settings.flush_threshold,
            StoreFlush::new(ctx.store.clone(), ctx.cancel.clone(), self.name),
        );
        let mut report = TaskReport::default();
        for &year in &ctx.settings.years {
            let keys = ctx.store.game_ids(year).await?;
            info!(task = self.name, year, keys = keys.len(), workers, "fanning out");
            let mut pending = keys.into_iter();
            let mut in_flight = FuturesUnordered::new();
            loop {
                while in_flight.len() < workers {
                    match pending.next() {
                        Some(id) => in_flight.push(fan_one::<S, U, T>(
                            &ctx,
                            self.name,
                            self.endpoint,
                            &acc,
                            id,
                        )),
                        None => break,
                    }
                }
                match in_flight.next().await {
                    Some(res) => report.absorb(res?),
                    None => break,
                }
            }
        }
        report.written += acc.finish().await?;
        if report.skipped_keys > 0 {
            warn!(task = self.name, skipped = report.skipped_keys, "fan-out finished with skipped keys");
        }
        Ok(report)
    }
}
