// src/ingest/providers/rss_direct.rs
//! Direct RSS 2.0 fetch, used when the JSON proxy is not configured.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use super::USER_AGENT;
use crate::ingest::error::SourceError;
use crate::ingest::types::{CandidateItem, FeedFetcher, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

pub struct DirectRssFetcher {
    client: reqwest::Client,
    max_items: usize,
}

impl DirectRssFetcher {
    pub fn new(max_items: usize, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("building rss http client")?;
        Ok(Self { client, max_items })
    }
}

/// Parse an RSS document into candidates, keeping at most `max_items`.
pub fn parse_rss_xml(xml: &str, max_items: usize) -> Result<Vec<CandidateItem>, SourceError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let out = rss
        .channel
        .item
        .into_iter()
        .filter_map(|it| {
            let title = it.title.map(|t| t.trim().to_string()).unwrap_or_default();
            let link = it.link.map(|l| l.trim().to_string()).unwrap_or_default();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            Some(CandidateItem {
                title,
                link,
                raw_description: it.description.unwrap_or_default(),
                published_at_raw: it.pub_date,
            })
        })
        .take(max_items)
        .collect();
    Ok(out)
}

#[async_trait]
impl FeedFetcher for DirectRssFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<CandidateItem>, SourceError> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status.as_u16()));
        }
        let body = resp.text().await.map_err(SourceError::from_reqwest)?;
        parse_rss_xml(&body, self.max_items)
    }

    fn name(&self) -> &'static str {
        "rss-direct"
    }
}

// HTML entities that are not defined in XML and would abort the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
