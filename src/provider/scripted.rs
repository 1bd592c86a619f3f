use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Endpoint, Filter, Upstream};
use crate::error::UpstreamError;

/// Canned upstream for tests. Unscripted queries return an empty array.
#[derive(Default)]
pub struct ScriptedUpstream {
    responses: Mutex<HashMap<(Endpoint, Filter), Value>>,
    failures: Mutex<HashSet<(Endpoint, Filter)>>,
    calls: Mutex<Vec<(Endpoint, Filter)>>,
    delay: Option<Duration>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, endpoint: Endpoint, filter: Filter, body: Value) -> &Self {
        self.responses.lock().unwrap().insert((endpoint, filter), body);
        self
    }

    pub fn fail(&self, endpoint: Endpoint, filter: Filter) -> &Self {
        self.failures.lock().unwrap().insert((endpoint, filter));
        self
    }

    pub fn calls(&self) -> Vec<(Endpoint, Filter)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn fetch(&self, endpoint: Endpoint, filter: &Filter) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push((endpoint, filter.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = (endpoint, filter.clone());
        if self.failures.lock().unwrap().contains(&key) {
            return Err(UpstreamError::Http {
                status: 503,
                body: format!("scripted failure for {endpoint} [{filter}]"),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new())))
    }
}
