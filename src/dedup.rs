//! Near-duplicate removal, ranking and truncation.
//!
//! Duplicates are resolved in favour of the most recent article (ties: higher
//! score). Rules, first match wins:
//! - same `id` as an accepted article
//! - same `link` as an accepted article
//! - token Jaccard similarity >= threshold on title/title or summary/summary
//!
//! Ranking: sticky first, then `sticky_priority` asc, `relevance_score` desc,
//! `published_at` desc (unknown dates last). `link` breaks remaining ties so the
//! output depends only on the input set.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::article::Article;

/// Per-call-site limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankProfile {
    pub max_items: usize,
    /// Below this many live articles, the curated fallback pool is used.
    #[serde(default)]
    pub min_items: usize,
    pub min_score: u8,
    pub similarity_threshold: f32,
}

impl RankProfile {
    /// Home-page widget: short list, stricter score cutoff.
    pub const WIDGET: RankProfile = RankProfile {
        max_items: 8,
        min_items: 3,
        min_score: 4,
        similarity_threshold: 0.6,
    };

    /// News page.
    pub const FEED: RankProfile = RankProfile {
        max_items: 20,
        min_items: 3,
        min_score: 3,
        similarity_threshold: 0.6,
    };

    /// Daily persistence job. Never padded with fallback content.
    pub const BATCH: RankProfile = RankProfile {
        max_items: 20,
        min_items: 0,
        min_score: 3,
        similarity_threshold: 0.7,
    };

    /// Keep values inside their meaningful ranges.
    pub fn sanitized(mut self) -> Self {
        if !self.similarity_threshold.is_finite() {
            self.similarity_threshold = 0.6;
        }
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
        self.max_items = self.max_items.max(1);
        self.min_items = self.min_items.min(self.max_items);
        self.min_score = self.min_score.clamp(1, 10);
        self
    }

    /// Same profile with a lower cap (never raises it).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.max_items = self.max_items.min(limit.max(1));
        self.min_items = self.min_items.min(self.max_items);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    pub articles: Vec<Article>,
    /// Candidates removed as duplicates (truncation not included).
    pub dropped: usize,
}

/// Lower-case, split on non-alphanumerics, drop tokens of length <= 2.
pub fn similarity_tokens(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// |A ∩ B| / |A ∪ B|. Two empty sets score 0.0 (nothing to compare).
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f32 / union as f32
}

struct Fingerprint {
    title: HashSet<String>,
    summary: HashSet<String>,
}

impl Fingerprint {
    fn of(a: &Article) -> Self {
        Self {
            title: similarity_tokens(&a.title),
            summary: similarity_tokens(&a.summary),
        }
    }

    fn is_near(&self, other: &Fingerprint, threshold: f32) -> bool {
        jaccard(&self.title, &other.title) >= threshold
            || jaccard(&self.summary, &other.summary) >= threshold
    }
}

/// Tracks what has been accepted so far; shared by dedup and fallback padding.
struct SeenSet {
    ids: HashSet<String>,
    links: HashSet<String>,
    prints: Vec<Fingerprint>,
    threshold: f32,
}

impl SeenSet {
    fn new(threshold: f32) -> Self {
        Self {
            ids: HashSet::new(),
            links: HashSet::new(),
            prints: Vec::new(),
            threshold,
        }
    }

    fn is_duplicate(&self, a: &Article) -> bool {
        if self.ids.contains(&a.id) || self.links.contains(&a.link) {
            return true;
        }
        let fp = Fingerprint::of(a);
        self.prints.iter().any(|p| p.is_near(&fp, self.threshold))
    }

    /// Accept `a` unless it duplicates something already seen.
    fn try_accept(&mut self, a: &Article) -> bool {
        if self.is_duplicate(a) {
            return false;
        }
        self.ids.insert(a.id.clone());
        self.links.insert(a.link.clone());
        self.prints.push(Fingerprint::of(a));
        true
    }
}

/// Most recent first; `None` dates sort last; ties by higher score, then link.
fn recency_order(a: &Article, b: &Article) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.relevance_score.cmp(&a.relevance_score))
        .then_with(|| a.link.cmp(&b.link))
        .then_with(|| a.id.cmp(&b.id))
}

/// Display order.
pub fn rank_order(a: &Article, b: &Article) -> Ordering {
    b.is_sticky
        .cmp(&a.is_sticky)
        .then_with(|| a.sticky_priority.cmp(&b.sticky_priority))
        .then_with(|| b.relevance_score.cmp(&a.relevance_score))
        .then_with(|| b.published_at.cmp(&a.published_at))
        .then_with(|| a.link.cmp(&b.link))
}

pub fn dedup_and_rank(mut candidates: Vec<Article>, profile: &RankProfile) -> DedupOutcome {
    let profile = profile.sanitized();
    let total = candidates.len();

    // Option<DateTime> orders None < Some, so descending puts unknown dates last.
    candidates.sort_by(recency_order);

    let mut seen = SeenSet::new(profile.similarity_threshold);
    let mut kept: Vec<Article> = Vec::with_capacity(candidates.len());
    for a in candidates {
        if seen.try_accept(&a) {
            kept.push(a);
        }
    }
    let dropped = total - kept.len();

    kept.sort_by(rank_order);
    kept.truncate(profile.max_items);

    DedupOutcome {
        articles: kept,
        dropped,
    }
}

/// Pad `articles` with entries from `pool` until `min(min_items, max_items)` is
/// reached or the pool is exhausted. Pool entries that duplicate anything in the
/// set are skipped. Returns the padded list and how many entries were added.
///
/// Ranking order holds for the live prefix only: fallback entries are appended
/// after it in pool order, without re-ranking.
pub fn apply_fallback(
    mut articles: Vec<Article>,
    profile: &RankProfile,
    pool: &[Article],
) -> (Vec<Article>, usize) {
    let profile = profile.sanitized();
    let target = profile.min_items.min(profile.max_items);
    if articles.len() >= target {
        return (articles, 0);
    }

    let mut seen = SeenSet::new(profile.similarity_threshold);
    for a in &articles {
        // Live articles are already mutually distinct; record them unconditionally.
        seen.ids.insert(a.id.clone());
        seen.links.insert(a.link.clone());
        seen.prints.push(Fingerprint::of(a));
    }

    let mut added = 0;
    for fb in pool {
        if articles.len() >= target {
            break;
        }
        if seen.try_accept(fb) {
            articles.push(fb.clone());
            added += 1;
        }
    }
    (articles, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> HashSet<String> {
        similarity_tokens(s)
    }

    #[test]
    fn tokens_drop_short_and_punct() {
        let t = toks("New Colonoscopy Guidelines Released!! (US, 45+)");
        assert!(t.contains("colonoscopy"));
        assert!(t.contains("new"));
        assert!(!t.contains("us"));
        assert!(!t.contains("45"));
    }

    #[test]
    fn jaccard_basics() {
        assert_eq!(jaccard(&toks("alpha beta gamma"), &toks("gamma beta alpha")), 1.0);
        assert_eq!(jaccard(&toks(""), &toks("")), 0.0);
        let j = jaccard(&toks("alpha beta gamma delta"), &toks("alpha beta gamma epsilon"));
        assert!((j - 0.6).abs() < 1e-6);
    }

    #[test]
    fn sanitize_clamps() {
        let p = RankProfile {
            max_items: 0,
            min_items: 9,
            min_score: 0,
            similarity_threshold: 3.0,
        }
        .sanitized();
        assert_eq!(p.max_items, 1);
        assert_eq!(p.min_items, 1);
        assert_eq!(p.min_score, 1);
        assert_eq!(p.similarity_threshold, 1.0);
    }

    #[test]
    fn with_limit_never_raises() {
        assert_eq!(RankProfile::WIDGET.with_limit(50).max_items, 8);
        let p = RankProfile::FEED.with_limit(2);
        assert_eq!(p.max_items, 2);
        assert_eq!(p.min_items, 2);
    }
}
