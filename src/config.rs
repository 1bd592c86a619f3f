use std::fmt;
use std::time::Duration;

use chrono::Datelike;

use crate::database_ops::db::DbOptions;
use crate::error::{SeedError, SeedResult};
use crate::task::SeedSettings;
use crate::throttle::ThrottleConfig;
use crate::util::env::EnvSource;

pub const DEFAULT_YEAR_MIN: i32 = 2024;

/// Everything the seeder reads from the environment, resolved once at startup.
#[derive(Clone)]
pub struct SeederConfig {
    pub database_url: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub http_timeout: Duration,
    pub year_min: i32,
    pub year_max: i32,
    pub throttle: ThrottleConfig,
    pub fanout_concurrency: usize,
    pub flush_threshold: usize,
    pub db: DbOptions,
}

impl SeederConfig {
    pub fn from_env() -> SeedResult<Self> {
        Self::from_source(&EnvSource::process())
    }

    pub fn from_source(env: &EnvSource) -> SeedResult<Self> {
        let defaults = ThrottleConfig::default();
        let db_defaults = DbOptions::default();
        let cfg = Self {
            database_url: env.req(&["DATABASE_URL", "DATABASE_DSN"])?,
            api_key: env.req(&["CFBD_API_KEY"])?,
            base_url: env.opt("CFBD_BASE_URL"),
            http_timeout: Duration::from_secs(env.parse("CFBD_TIMEOUT_SECS", 30u64)?),
            year_min: env.parse("SEED_YEAR_MIN", DEFAULT_YEAR_MIN)?,
            year_max: env.parse("SEED_YEAR_MAX", chrono::Utc::now().year())?,
            throttle: ThrottleConfig {
                rate_per_sec: env.parse("THROTTLE_RPS", defaults.rate_per_sec)?,
                burst: env.parse("THROTTLE_BURST", defaults.burst)?,
                wait_timeout: Duration::from_secs(
                    env.parse("THROTTLE_WAIT_SECS", defaults.wait_timeout.as_secs())?,
                ),
            },
            fanout_concurrency: env.parse("FANOUT_CONCURRENCY", 10usize)?,
            flush_threshold: env.parse("FANOUT_FLUSH_THRESHOLD", 100usize)?,
            db: DbOptions {
                max_connections: env.parse("DB_MAX_CONNS", db_defaults.max_connections)?,
                use_prepared: env.flag("USE_PREPARED", false),
                fast_ingest: env.flag("FAST_INGEST", false),
                work_mem_mb: env.parse("FAST_INGEST_WORK_MEM_MB", db_defaults.work_mem_mb)?,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SeedResult<()> {
        if self.year_min > self.year_max {
            return Err(SeedError::InvalidConfig(format!(
                "year range {}..={} is empty",
                self.year_min, self.year_max
            )));
        }
        if self.throttle.rate_per_sec == 0 || self.throttle.burst == 0 {
            return Err(SeedError::InvalidConfig(
                "throttle rate and burst must be > 0".into(),
            ));
        }
        if self.fanout_concurrency == 0 || self.flush_threshold == 0 {
            return Err(SeedError::InvalidConfig(
                "fan-out concurrency and flush threshold must be > 0".into(),
            ));
        }
        if self.db.max_connections == 0 {
            return Err(SeedError::InvalidConfig("DB_MAX_CONNS must be > 0".into()));
        }
        Ok(())
    }

    pub fn settings(&self) -> SeedSettings {
        SeedSettings {
            years: (self.year_min..=self.year_max).collect(),
            fanout_concurrency: self.fanout_concurrency,
            flush_threshold: self.flush_threshold,
        }
    }
}

impl fmt::Debug for SeederConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeederConfig")
            .field("database_url", &"***")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("http_timeout", &self.http_timeout)
            .field("years", &(self.year_min..=self.year_max))
            .field("throttle", &self.throttle)
            .field("fanout_concurrency", &self.fanout_concurrency)
            .field("flush_threshold", &self.flush_threshold)
            .field("db", &self.db)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://u:p@localhost/cfbd"),
            ("CFBD_API_KEY", "secret"),
        ]
    }

    #[test]
    fn missing_credentials_are_startup_errors() {
        let err = SeederConfig::from_source(&EnvSource::from_pairs([("CFBD_API_KEY", "k")]))
            .unwrap_err();
        assert!(matches!(err, SeedError::MissingConfig("DATABASE_URL")));

        let err = SeederConfig::from_source(&EnvSource::from_pairs([("DATABASE_URL", "x")]))
            .unwrap_err();
        assert!(matches!(err, SeedError::MissingConfig("CFBD_API_KEY")));
    }

    #[test]
    fn defaults_apply() {
        let mut pairs = required();
        pairs.push(("SEED_YEAR_MAX", "2025"));
        let cfg = SeederConfig::from_source(&EnvSource::from_pairs(pairs)).unwrap();
        assert_eq!(cfg.throttle, ThrottleConfig::default());
        assert_eq!(cfg.fanout_concurrency, 10);
        assert_eq!(cfg.flush_threshold, 100);
        assert_eq!(cfg.settings().years, vec![2024, 2025]);
        assert_eq!(cfg.db, DbOptions::default());
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let mut pairs = required();
        pairs.push(("SEED_YEAR_MIN", "2025"));
        pairs.push(("SEED_YEAR_MAX", "2020"));
        assert!(matches!(
            SeederConfig::from_source(&EnvSource::from_pairs(pairs)),
            Err(SeedError::InvalidConfig(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = SeederConfig::from_source(&EnvSource::from_pairs(required())).unwrap();
        let shown = format!("{cfg:?}");
        assert!(!shown.contains("secret"));
        assert!(!shown.contains("u:p@"));
    }
}
