// src/store/supabase.rs
//! Hosted Postgres table reached through its PostgREST endpoint.
//!
//! lookup: `GET  {url}/rest/v1/{table}?select=id&link=eq.{link}&limit=1`
//! insert: `POST {url}/rest/v1/{table}` with `Prefer: return=minimal`

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;

use super::{ArticleStore, InsertOutcome, StoreError};
use crate::article::Article;
use crate::config::StoreConfig;

#[derive(Debug, Serialize)]
struct ArticleRow<'a> {
    title: &'a str,
    link: &'a str,
    source: &'a str,
    summary: &'a str,
    published_at: Option<DateTime<Utc>>,
    relevance_score: u8,
    is_sticky: bool,
    sticky_priority: u32,
    content_type: &'a str,
    article_hash: &'a str,
}

impl<'a> From<&'a Article> for ArticleRow<'a> {
    fn from(a: &'a Article) -> Self {
        Self {
            title: &a.title,
            link: &a.link,
            source: &a.source_label,
            summary: &a.summary,
            published_at: a.published_at,
            relevance_score: a.relevance_score,
            is_sticky: a.is_sticky,
            sticky_priority: a.sticky_priority,
            content_type: a.kind.as_str(),
            article_hash: &a.id,
        }
    }
}

pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        table: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building store http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: table.into(),
        })
    }

    /// Build from the env vars named in `cfg`. `Ok(None)` when they are unset.
    pub fn from_env(cfg: &StoreConfig) -> anyhow::Result<Option<Self>> {
        let url = std::env::var(&cfg.url_env).ok().filter(|v| !v.trim().is_empty());
        let key = std::env::var(&cfg.key_env).ok().filter(|v| !v.trim().is_empty());
        match (url, key) {
            (Some(url), Some(key)) => Ok(Some(Self::new(
                url,
                key,
                cfg.table.clone(),
                Duration::from_secs(cfg.timeout_secs),
            )?)),
            _ => Ok(None),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

fn request_err(e: reqwest::Error) -> StoreError {
    StoreError::Request(e.to_string())
}

async fn status_err(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    StoreError::Status { status, message }
}

#[async_trait]
impl ArticleStore for SupabaseStore {
    async fn exists_by_link(&self, link: &str) -> Result<bool, StoreError> {
        let eq = format!("eq.{link}");
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "id"), ("link", eq.as_str()), ("limit", "1")])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(request_err)?;
        if !resp.status().is_success() {
            return Err(status_err(resp).await);
        }
        let rows: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome, StoreError> {
        let row = ArticleRow::from(article);
        let resp = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(request_err)?;
        match resp.status() {
            s if s.is_success() => Ok(InsertOutcome::Inserted),
            // unique(link) raced by another run
            StatusCode::CONFLICT => Ok(InsertOutcome::AlreadyPresent),
            _ => Err(status_err(resp).await),
        }
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
