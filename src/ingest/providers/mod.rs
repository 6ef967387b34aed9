// src/ingest/providers/mod.rs
pub mod rss_direct;
pub mod rss_proxy;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

pub use rss_direct::DirectRssFetcher;
pub use rss_proxy::RssProxyFetcher;

pub(crate) const USER_AGENT: &str = "crc-news-pipeline/0.1";

/// Parse the date formats seen across feeds and the JSON proxy.
/// Returns `None` for anything unrecognised (callers fail open).
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Many feeds still send the obsolete "GMT"/"UT" zone names
    let rfc = match s.rsplit_once(' ') {
        Some((head, "GMT" | "UT" | "UTC" | "Z")) => format!("{head} +0000"),
        _ => s.to_string(),
    };
    if let Some(dt) = OffsetDateTime::parse(&rfc, &Rfc2822)
        .ok()
        .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
    {
        return Some(dt);
    }
    // Proxy format: "2024-05-02 14:03:00", always UTC
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| Utc.from_utc_datetime(&n))
}
