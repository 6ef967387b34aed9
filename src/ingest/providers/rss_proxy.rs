// src/ingest/providers/rss_proxy.rs
//! Fetches feeds through an RSS-to-JSON proxy:
//! `GET {proxy_base}?rss_url={feed}&count={n}` → `{ status, items: [...] }`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::USER_AGENT;
use crate::ingest::error::SourceError;
use crate::ingest::types::{CandidateItem, FeedFetcher, FeedSource};

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items: Vec<ProxyItem>,
}

#[derive(Debug, Deserialize)]
struct ProxyItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    content: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

pub struct RssProxyFetcher {
    client: reqwest::Client,
    proxy_base: String,
    count: u32,
    api_key: Option<String>,
}

impl RssProxyFetcher {
    /// `timeout` bounds the whole request; a hung proxy becomes `SourceError::Timeout`.
    pub fn new(
        proxy_base: impl Into<String>,
        count: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("building proxy http client")?;
        Ok(Self {
            client,
            proxy_base: proxy_base.into(),
            count,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    fn request_url(&self, source: &FeedSource) -> Result<reqwest::Url, SourceError> {
        let count = self.count.to_string();
        let mut params = vec![("rss_url", source.url.as_str()), ("count", count.as_str())];
        if let Some(key) = self.api_key.as_deref() {
            params.push(("api_key", key));
        }
        reqwest::Url::parse_with_params(&self.proxy_base, &params)
            .map_err(|e| SourceError::InvalidUrl(e.to_string()))
    }
}

/// Decode a proxy body into candidates. Items without a title or link are skipped.
pub fn parse_proxy_body(body: &str) -> Result<Vec<CandidateItem>, SourceError> {
    let resp: ProxyResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    if !resp.status.eq_ignore_ascii_case("ok") {
        return Err(SourceError::Upstream(
            resp.message.unwrap_or_else(|| resp.status.clone()),
        ));
    }

    let out = resp
        .items
        .into_iter()
        .filter_map(|it| {
            let title = it.title.map(|t| t.trim().to_string()).unwrap_or_default();
            let link = it.link.map(|l| l.trim().to_string()).unwrap_or_default();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            let raw_description = it
                .description
                .filter(|d| !d.trim().is_empty())
                .or(it.content)
                .unwrap_or_default();
            Some(CandidateItem {
                title,
                link,
                raw_description,
                published_at_raw: it.pub_date,
            })
        })
        .collect();
    Ok(out)
}

#[async_trait]
impl FeedFetcher for RssProxyFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<CandidateItem>, SourceError> {
        let url = self.request_url(source)?;
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status.as_u16()));
        }
        let body = resp.text().await.map_err(SourceError::from_reqwest)?;
        let items = parse_proxy_body(&body)?;
        tracing::debug!(
            target: "ingest",
            source = %source.name,
            items = items.len(),
            "proxy feed parsed"
        );
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "rss-proxy"
    }
}
