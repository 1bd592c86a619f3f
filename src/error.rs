use std::time::Duration;

use thiserror::Error;

/// Errors produced while talking to the upstream provider.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("other: {0}")]
    Other(String),
}

/// Errors surfaced by the seeding pipeline.
///
/// Everything here is fatal for the task that raises it and therefore for its
/// phase. Per-record transform failures and per-key fan-out fetch failures are
/// absorbed inside the task layer and never become a `SeedError`.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{operation}: throttle wait exceeded {timeout:?}")]
    ThrottleTimeout {
        operation: String,
        timeout: Duration,
    },

    #[error("{operation}: cancelled")]
    Cancelled { operation: String },

    #[error("{operation} [{filter}]: upstream fetch failed: {source}")]
    Upstream {
        operation: String,
        filter: String,
        #[source]
        source: UpstreamError,
    },

    #[error("{operation}: store write failed: {source}")]
    Store {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: store query failed: {source}")]
    Query {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("schema setup step '{step}' failed: {source}")]
    Schema {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation}: task panicked or was aborted: {source}")]
    Join {
        operation: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl SeedError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SeedError::Cancelled { .. })
    }
}

pub type SeedResult<T> = Result<T, SeedError>;
