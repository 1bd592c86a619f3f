use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{Endpoint, Filter, Upstream};
use crate::error::UpstreamError;

pub const DEFAULT_BASE_URL: &str = "https://api.collegefootballdata.com";

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// CollegeFootballData HTTP client.
///
/// All endpoints are `GET` with bearer-token auth and return JSON. Rate
/// limiting is not handled here; callers pass through the shared throttle
/// before every request.
#[derive(Debug, Clone)]
pub struct CfbdClient {
    base_url: Url,
    http: Client,
    api_key: String,
}

impl CfbdClient {
    pub fn new(base_url: Option<&str>, api_key: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(UpstreamError::Other("api key is empty".into()));
        }
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let http = Client::builder()
            .user_agent(concat!("cfbd-seeder/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: Url::parse(base)?,
            http,
            api_key: api_key.to_string(),
        })
    }

    fn url_for(&self, endpoint: Endpoint) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), endpoint.path());
        url.set_path(&joined);
        Ok(url)
    }
}

#[async_trait]
impl Upstream for CfbdClient {
    // SECURITY: the client carries the bearer token; keep it out of spans.
    #[instrument(skip(self), fields(endpoint = %endpoint, filter = %filter))]
    async fn fetch(&self, endpoint: Endpoint, filter: &Filter) -> Result<Value, UpstreamError> {
        let url = self.url_for(endpoint)?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(&filter.query_pairs(endpoint))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            debug!(status = status.as_u16(), "endpoint returned non-success status");
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
