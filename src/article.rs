// src/article.rs
//! Canonical article type produced by the classifier and consumed by the ranker,
//! the HTTP API and the persistence adapter.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Score at or above which an article is pinned ("sticky").
pub const STICKY_SCORE: u8 = 9;
/// Sort key for sticky articles (lower = higher priority).
pub const STICKY_PRIORITY: u32 = 1;
/// Sentinel sort key for regular articles.
pub const NON_STICKY_PRIORITY: u32 = 999;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// What a feed publishes. Each kind carries its own retention and scoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    News,
    Publication,
}

impl ContentKind {
    /// Items older than this are excluded regardless of score.
    pub fn retention(self) -> Duration {
        match self {
            ContentKind::News => Duration::days(30),
            ContentKind::Publication => Duration::days(180),
        }
    }

    /// Starting point of the keyword-weighted score.
    pub fn base_score(self) -> u8 {
        match self {
            ContentKind::News => 3,
            ContentKind::Publication => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Publication => "publication",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub source_label: String,
    /// `None` when the upstream date could not be parsed.
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub relevance_score: u8,
    pub is_sticky: bool,
    pub sticky_priority: u32,
    pub kind: ContentKind,
    /// Curated record used to pad a thin live result set.
    #[serde(default)]
    pub is_fallback: bool,
}

impl Article {
    /// Clamp `score` into [1,10] and derive stickiness from it.
    pub fn set_score(&mut self, score: u8) {
        let s = clamp_score(i32::from(score));
        self.relevance_score = s;
        self.is_sticky = s >= STICKY_SCORE;
        self.sticky_priority = if self.is_sticky {
            STICKY_PRIORITY
        } else {
            NON_STICKY_PRIORITY
        };
    }
}

pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(i32::from(MIN_SCORE), i32::from(MAX_SCORE)) as u8
}

/// Stable id from title + summary, so repeated fetches of the same story agree.
pub fn article_id(title: &str, summary: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(summary.trim().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
