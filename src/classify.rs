// src/classify.rs
//! Relevance gate and heuristic classifier.
//!
//! A candidate passes when its lower-cased `title + description` contains an
//! approved keyword, it is inside the retention window for its kind, it carries
//! no exclusion marker, and its keyword-weighted score reaches the call-site
//! minimum. Pure function of input text and the supplied clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::{article_id, clamp_score, Article, ContentKind, MIN_SCORE};
use crate::ingest::providers::parse_published_at;
use crate::ingest::types::CandidateItem;
use crate::ingest::{clean_summary, normalize_text};

/// Summary length cap (chars, before the ellipsis).
pub const SUMMARY_MAX_CHARS: usize = 240;

/// Keyword lists, matched as lower-case substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// General topical terms; at least one (or a high-priority term) must match.
    pub approved: Vec<String>,
    /// Institutions and policy terms: +2 each, and they also open the gate.
    #[serde(default)]
    pub high_priority: Vec<String>,
    /// +1 each.
    #[serde(default)]
    pub medium_priority: Vec<String>,
    /// Promotional or non-clinical markers that force the minimum score.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    NoKeyword,
    Stale,
    Excluded,
    LowScore,
}

impl Rejection {
    /// Label used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed",
            Rejection::NoKeyword => "no_keyword",
            Rejection::Stale => "stale",
            Rejection::Excluded => "excluded",
            Rejection::LowScore => "low_score",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    approved: Vec<String>,
    high: Vec<String>,
    medium: Vec<String>,
    exclusions: Vec<String>,
}

impl Classifier {
    pub fn new(cfg: &KeywordConfig) -> Self {
        Self {
            approved: lower_all(&cfg.approved),
            high: lower_all(&cfg.high_priority),
            medium: lower_all(&cfg.medium_priority),
            exclusions: lower_all(&cfg.exclusions),
        }
    }

    /// True if `haystack` (already lower-cased) contains an approved or high-priority term.
    pub fn contains_approved_keyword(&self, haystack: &str) -> bool {
        self.approved
            .iter()
            .chain(self.high.iter())
            .any(|k| haystack.contains(k.as_str()))
    }

    /// Heuristic score for lower-cased text, clamped to [1,10].
    pub fn score_text(&self, haystack: &str, kind: ContentKind) -> u8 {
        if self.exclusions.iter().any(|k| haystack.contains(k.as_str())) {
            return MIN_SCORE;
        }
        let high = count_matches(&self.high, haystack) as i32;
        let medium = count_matches(&self.medium, haystack) as i32;
        clamp_score(i32::from(kind.base_score()) + 2 * high + medium)
    }

    pub fn classify(
        &self,
        item: &CandidateItem,
        kind: ContentKind,
        source_label: &str,
        now: DateTime<Utc>,
        min_score: u8,
    ) -> Result<Article, Rejection> {
        // 1) malformed
        let title = normalize_text(&item.title);
        let link = item.link.trim();
        if title.is_empty() || link.is_empty() {
            return Err(Rejection::Malformed);
        }

        // 2) keyword gate on the cleaned text, so markup cannot hide or fake a match
        let description = normalize_text(&item.raw_description);
        let haystack = format!("{} {}", title, description).to_lowercase();
        if !self.contains_approved_keyword(&haystack) {
            return Err(Rejection::NoKeyword);
        }

        // 3) retention (fail-open on unparseable dates)
        let published_at = item
            .published_at_raw
            .as_deref()
            .and_then(parse_published_at);
        if let Some(ts) = published_at {
            if now.signed_duration_since(ts) > kind.retention() {
                return Err(Rejection::Stale);
            }
        }

        // 4) exclusions + score cutoff
        let excluded = self.exclusions.iter().any(|k| haystack.contains(k.as_str()));
        let score = self.score_text(&haystack, kind);
        if score < min_score {
            return Err(if excluded {
                Rejection::Excluded
            } else {
                Rejection::LowScore
            });
        }

        let summary = clean_summary(&item.raw_description, SUMMARY_MAX_CHARS);
        let mut article = Article {
            id: article_id(&title, &summary),
            title,
            link: link.to_string(),
            source_label: source_label.to_string(),
            published_at,
            summary,
            relevance_score: score,
            is_sticky: false,
            sticky_priority: 0,
            kind,
            is_fallback: false,
        };
        article.set_score(score);
        Ok(article)
    }
}

fn lower_all(v: &[String]) -> Vec<String> {
    v.iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn count_matches(keywords: &[String], haystack: &str) -> usize {
    keywords
        .iter()
        .filter(|k| haystack.contains(k.as_str()))
        .count()
}
