//! Shared upstream throttle.
//!
//! Every upstream request, including each fan-out iteration, waits on the
//! [`ThrottleHandle`] first. The active [`Throttle`] is immutable and lives
//! behind an [`ArcSwap`], so a differently configured limiter can be swapped
//! in between phases while in-flight waiters keep the instance they loaded.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{SeedError, SeedResult};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Steady-state requests per second.
    pub rate_per_sec: u32,
    /// Requests allowed back-to-back before the steady rate applies.
    pub burst: u32,
    /// Upper bound on a single `acquire` wait.
    pub wait_timeout: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: 5,
            burst: 5,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Token bucket plus its wait bound. Never mutated after construction.
pub struct Throttle {
    limiter: DefaultDirectRateLimiter,
    wait_timeout: Duration,
    label: String,
}

impl Throttle {
    pub fn new(cfg: ThrottleConfig) -> SeedResult<Self> {
        let rate = NonZeroU32::new(cfg.rate_per_sec)
            .ok_or_else(|| SeedError::InvalidConfig("throttle rate must be > 0".into()))?;
        let burst = NonZeroU32::new(cfg.burst)
            .ok_or_else(|| SeedError::InvalidConfig("throttle burst must be > 0".into()))?;
        let quota = Quota::per_second(rate).allow_burst(burst);
        Ok(Self::from_quota(
            quota,
            cfg.wait_timeout,
            format!("{}rps/burst{}", cfg.rate_per_sec, cfg.burst),
        ))
    }

    pub fn from_quota(quota: Quota, wait_timeout: Duration, label: impl Into<String>) -> Self {
        Self {
            limiter: RateLimiter::direct(quota),
            wait_timeout,
            label: label.into(),
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Single indirection point through which all tasks reach the active throttle.
#[derive(Clone)]
pub struct ThrottleHandle {
    active: Arc<ArcSwap<Throttle>>,
}

impl ThrottleHandle {
    pub fn new(throttle: Throttle) -> Self {
        Self {
            active: Arc::new(ArcSwap::from_pointee(throttle)),
        }
    }

    pub fn from_config(cfg: ThrottleConfig) -> SeedResult<Self> {
        Ok(Self::new(Throttle::new(cfg)?))
    }

    pub fn current(&self) -> Arc<Throttle> {
        self.active.load_full()
    }

    /// Installs `next` for all subsequent `acquire` calls and returns the
    /// previous instance.
    pub fn replace(&self, next: Throttle) -> Arc<Throttle> {
        debug!(throttle = %next.label, "replacing active throttle");
        self.active.swap(Arc::new(next))
    }

    /// Waits for a token. Fails if the wait bound elapses or `cancel` fires
    /// first.
    pub async fn acquire(&self, operation: &str, cancel: &CancellationToken) -> SeedResult<()> {
        let throttle = self.current();
        let limit = throttle.wait_timeout();
        if cancel.is_cancelled() {
            return Err(SeedError::Cancelled {
                operation: operation.to_string(),
            });
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SeedError::Cancelled {
                operation: operation.to_string(),
            }),
            waited = tokio::time::timeout(limit, throttle.limiter.until_ready()) => {
                match waited {
                    Ok(_) => Ok(()),
                    Err(_) => {
                        warn!(
                            operation,
                            throttle = %throttle.label,
                            timeout_ms = limit.as_millis() as u64,
                            "throttle wait timed out"
                        );
                        Err(SeedError::ThrottleTimeout {
                            operation: operation.to_string(),
                            timeout: limit,
                        })
                    }
                }
            }
        }
    }
}
