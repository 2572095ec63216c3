// src/fetch.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

// bilibili rejects requests without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport capability consumed by the pollers. No caching, retries or
/// rate limiting are assumed; any failure is reported as-is and handled at
/// the call site.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String>;
}

/// Production fetcher over a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let body = resp
            .error_for_status()
            .with_context(|| format!("GET {url} non-2xx"))?
            .text()
            .await
            .with_context(|| format!("GET {url} body"))?;
        Ok(body)
    }
}
