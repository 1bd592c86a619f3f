//! Phase scheduler.
//!
//! Phases run strictly in order. Every task of a phase is spawned at once
//! under a child cancellation token; the first task error cancels that
//! token, the remaining tasks are drained, and the error is returned without
//! starting later phases.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::database_ops::Store;
use crate::error::{SeedError, SeedResult};
use crate::provider::Upstream;
use crate::task::{SeedTask, TaskContext, TaskReport};

pub struct Phase<S, U> {
    pub name: &'static str,
    pub tasks: Vec<Arc<dyn SeedTask<S, U>>>,
}

impl<S: Store, U: Upstream> Phase<S, U> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: Vec::new(),
        }
    }

    pub fn task(mut self, task: impl SeedTask<S, U> + 'static) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Keeps only tasks whose name is in `only`.
    pub fn retain(&mut self, only: &[String]) {
        self.tasks.retain(|t| only.iter().any(|n| n == t.name()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub tasks: Vec<(&'static str, TaskReport)>,
    pub elapsed: Duration,
}

impl PhaseReport {
    pub fn totals(&self) -> TaskReport {
        let mut total = TaskReport::default();
        for (_, r) in &self.tasks {
            total.absorb(*r);
        }
        total
    }
}

pub async fn run_phase<S: Store, U: Upstream>(
    phase: &Phase<S, U>,
    ctx: &TaskContext<S, U>,
) -> SeedResult<PhaseReport> {
    let started = Instant::now();
    let scope = ctx.cancel.child_token();
    info!(phase = phase.name, tasks = phase.tasks.len(), "phase starting");

    let mut set = JoinSet::new();
    for task in &phase.tasks {
        let task = task.clone();
        let task_ctx = ctx.with_cancel(scope.clone());
        set.spawn(async move {
            let name = task.name();
            let t0 = Instant::now();
            let res = task.run(task_ctx).await;
            (name, t0.elapsed(), res)
        });
    }

    let mut first_err: Option<SeedError> = None;
    let mut done: Vec<(&'static str, TaskReport)> = Vec::with_capacity(phase.tasks.len());
    while let Some(joined) = set.join_next().await {
        let outcome = match joined {
            Ok((name, elapsed, Ok(report))) => {
                info!(
                    phase = phase.name,
                    task = name,
                    requests = report.requests,
                    fetched = report.fetched,
                    dropped = report.dropped,
                    written = report.written,
                    skipped_keys = report.skipped_keys,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "task complete"
                );
                done.push((name, report));
                continue;
            }
            Ok((name, _, Err(e))) => (name.to_string(), e),
            Err(source) => (
                "<join>".to_string(),
                SeedError::Join {
                    operation: phase.name.to_string(),
                    source,
                },
            ),
        };
        let (name, err) = outcome;
        if first_err.is_none() {
            error!(phase = phase.name, task = %name, error = %err, "task failed; cancelling phase");
            scope.cancel();
            first_err = Some(err);
        } else {
            debug!(phase = phase.name, task = %name, error = %err, "sibling stopped after cancellation");
        }
    }

    if let Some(err) = first_err {
        return Err(err);
    }
    let report = PhaseReport {
        phase: phase.name,
        tasks: done,
        elapsed: started.elapsed(),
    };
    let totals = report.totals();
    info!(
        phase = phase.name,
        written = totals.written,
        requests = totals.requests,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "phase complete"
    );
    Ok(report)
}

/// Runs `phases` in order; stops at the first failing phase.
pub async fn run_phases<S: Store, U: Upstream>(
    phases: &[Phase<S, U>],
    ctx: &TaskContext<S, U>,
) -> SeedResult<Vec<PhaseReport>> {
    let mut reports = Vec::with_capacity(phases.len());
    for phase in phases {
        if phase.tasks.is_empty() {
            debug!(phase = phase.name, "no tasks selected; skipping");
            continue;
        }
        reports.push(run_phase(phase, ctx).await?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::memory::MemoryStore;
    use crate::provider::scripted::ScriptedUpstream;
    use crate::provider::Filter;
    use crate::task::SeedSettings;
    use crate::throttle::{ThrottleConfig, ThrottleHandle};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    type Log = Arc<Mutex<Vec<String>>>;

    struct TimedTask {
        name: &'static str,
        delay: Duration,
        fail: bool,
        log: Log,
    }

    #[async_trait]
    impl SeedTask<MemoryStore, ScriptedUpstream> for TimedTask {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(
            &self,
            ctx: TaskContext<MemoryStore, ScriptedUpstream>,
        ) -> SeedResult<TaskReport> {
            self.log.lock().unwrap().push(format!("start:{}", self.name));
            tokio::select! {
                _ = ctx.cancel.cancelled() => {
                    self.log.lock().unwrap().push(format!("cancelled:{}", self.name));
                    return Err(SeedError::Cancelled { operation: self.name.to_string() });
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
            if self.fail {
                self.log.lock().unwrap().push(format!("fail:{}", self.name));
                return Err(SeedError::Upstream {
                    operation: self.name.to_string(),
                    filter: Filter::none().to_string(),
                    source: crate::error::UpstreamError::Other("boom".into()),
                });
            }
            self.log.lock().unwrap().push(format!("end:{}", self.name));
            Ok(TaskReport {
                requests: 1,
                ..TaskReport::default()
            })
        }
    }

    fn timed(name: &'static str, ms: u64, fail: bool, log: &Log) -> TimedTask {
        TimedTask {
            name,
            delay: Duration::from_millis(ms),
            fail,
            log: log.clone(),
        }
    }

    fn ctx() -> TaskContext<MemoryStore, ScriptedUpstream> {
        TaskContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedUpstream::new()),
            ThrottleHandle::from_config(ThrottleConfig::default()).unwrap(),
            CancellationToken::new(),
            SeedSettings::default(),
        )
    }

    fn position(log: &[String], entry: &str) -> usize {
        log.iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry} not in {log:?}"))
    }

    #[tokio::test]
    async fn phases_are_barriers() {
        let log: Log = Arc::default();
        let phases = vec![
            Phase::new("reference")
                .task(timed("a", 60, false, &log))
                .task(timed("b", 10, false, &log)),
            Phase::new("spine").task(timed("c", 0, false, &log)),
        ];
        let reports = run_phases(&phases, &ctx()).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].tasks.len(), 2);
        assert_eq!(reports[0].totals().requests, 2);

        let log = log.lock().unwrap().clone();
        let c_start = position(&log, "start:c");
        assert!(position(&log, "end:a") < c_start);
        assert!(position(&log, "end:b") < c_start);
        // siblings start together
        assert!(position(&log, "start:b") < position(&log, "end:a"));
    }

    #[tokio::test]
    async fn failure_cancels_siblings_and_stops_later_phases() {
        let log: Log = Arc::default();
        let phases = vec![
            Phase::new("detail")
                .task(timed("slow", 10_000, false, &log))
                .task(timed("broken", 10, true, &log)),
            Phase::new("never").task(timed("later", 0, false, &log)),
        ];
        let started = Instant::now();
        let err = run_phases(&phases, &ctx()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            SeedError::Upstream { operation, .. } => assert_eq!(operation, "broken"),
            other => panic!("unexpected error: {other}"),
        }
        let log = log.lock().unwrap().clone();
        assert!(log.contains(&"cancelled:slow".to_string()));
        assert!(!log.iter().any(|e| e.ends_with(":later")));
    }

    #[tokio::test]
    async fn retain_filters_by_name_and_empty_phases_are_skipped() {
        let log: Log = Arc::default();
        let mut phases = vec![
            Phase::new("reference").task(timed("a", 0, false, &log)),
            Phase::new("spine")
                .task(timed("b", 0, false, &log))
                .task(timed("c", 0, false, &log)),
        ];
        let only = vec!["c".to_string()];
        for p in &mut phases {
            p.retain(&only);
        }
        assert_eq!(phases[1].task_names(), vec!["c"]);
        let reports = run_phases(&phases, &ctx()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].phase, "spine");
    }
}
