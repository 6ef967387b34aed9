// src/ingest/mod.rs
pub mod error;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::analyze::ai_adapter::DynAiEnhancer;
use crate::article::Article;
use crate::classify::{Classifier, Rejection, SUMMARY_MAX_CHARS};
use crate::config::{AppConfig, FetchMode};
use crate::dedup::{apply_fallback, dedup_and_rank, RankProfile};
use crate::fallback::fallback_articles;
use crate::ingest::error::SourceFailure;
use crate::ingest::providers::{DirectRssFetcher, RssProxyFetcher};
use crate::ingest::types::{CandidateItem, FeedFetcher, FeedSource};
use crate::store::{ArticleStore, InsertOutcome};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_candidates_total", "Raw items returned by feeds.");
        describe_counter!("news_accepted_total", "Items accepted by the relevance gate.");
        describe_counter!(
            "news_rejected_total",
            "Items rejected by the relevance gate, by reason."
        );
        describe_counter!("news_dedup_dropped_total", "Items removed as duplicates.");
        describe_counter!("news_source_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "news_fallback_used_total",
            "Curated fallback articles served."
        );
        describe_counter!("news_store_inserted_total", "Articles inserted into the store.");
        describe_counter!(
            "news_store_skipped_total",
            "Articles already present in the store."
        );
        describe_counter!("news_store_errors_total", "Store lookup/insert failures.");
        describe_counter!("news_scheduler_runs_total", "Scheduled fetch-and-store runs.");
        describe_histogram!("news_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!(
            "news_pipeline_last_run_ts",
            "Unix ts when the pipeline last ran."
        );
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace, trim stray punctuation.
pub fn normalize_text(s: &str) -> String {
    let mut out = strip_markup(s);

    // Strip trailing sentence punctuation (keep quotes)
    while let Some(last) = out.chars().last() {
        if matches!(last, '!' | '?' | '.' | ',') {
            out.pop();
        } else {
            break;
        }
    }

    // Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Decode entities, remove tags, fold typographic quotes, collapse whitespace.
fn strip_markup(s: &str) -> String {
    // 1) HTML entity decode (twice: feeds often double-escape markup)
    let once = html_escape::decode_html_entities(s).to_string();
    let mut out = html_escape::decode_html_entities(&once).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| {
        regex::Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>|</?[^>]+>")
            .expect("static tag regex")
    });
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP)
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable excerpt: cleaned, capped at `max_chars`, cut on a word
/// boundary when one is close, with a trailing "...".
pub fn clean_summary(raw: &str, max_chars: usize) -> String {
    let text = strip_markup(raw);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(' ') {
        Some(pos) if pos >= max_chars / 2 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end_matches([' ', ',', ';', ':', '.']))
}

/// Result of a UI-facing fetch. Never an error: degradation shows up as
/// `source_errors` and fallback articles.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub articles: Vec<Article>,
    pub source_errors: Vec<SourceFailure>,
    pub fallback_used: bool,
}

/// Result of the batch fetch-and-store job. `articles` is everything that was
/// ranked, including entries whose persistence failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub articles: Vec<Article>,
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
    pub source_errors: Vec<SourceFailure>,
}

/// The aggregation pipeline with its injected configuration. Stateless between runs.
pub struct NewsPipeline {
    sources: Vec<FeedSource>,
    fetcher: Arc<dyn FeedFetcher>,
    classifier: Classifier,
    enhancer: Option<DynAiEnhancer>,
    request_delay: Duration,
    fallback_pool: Vec<Article>,
}

impl NewsPipeline {
    pub fn new(
        sources: Vec<FeedSource>,
        fetcher: Arc<dyn FeedFetcher>,
        classifier: Classifier,
    ) -> Self {
        Self {
            sources,
            fetcher,
            classifier,
            enhancer: None,
            request_delay: Duration::ZERO,
            fallback_pool: fallback_articles(),
        }
    }

    /// Build with the fetcher selected by `cfg.fetch.mode`.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let fetcher: Arc<dyn FeedFetcher> = match cfg.fetch.mode {
            FetchMode::Proxy => Arc::new(
                RssProxyFetcher::new(&cfg.fetch.proxy_base, cfg.fetch.count, cfg.fetch.timeout())?
                    .with_api_key(cfg.fetch.api_key.clone()),
            ),
            FetchMode::Direct => Arc::new(DirectRssFetcher::new(
                cfg.fetch.count as usize,
                cfg.fetch.timeout(),
            )?),
        };
        Ok(Self::new(
            cfg.sources.clone(),
            fetcher,
            Classifier::new(&cfg.keywords),
        )
        .with_request_delay(cfg.fetch.request_delay()))
    }

    pub fn with_enhancer(mut self, enhancer: Option<DynAiEnhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_fallback_pool(mut self, pool: Vec<Article>) -> Self {
        self.fallback_pool = pool;
        self
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Fetch every source concurrently. A failing source contributes nothing
    /// and is reported; it never affects the others.
    async fn fetch_all(&self) -> (Vec<(&FeedSource, Vec<CandidateItem>)>, Vec<SourceFailure>) {
        let fetches = self.sources.iter().map(|src| async move {
            let t0 = Instant::now();
            let res = self.fetcher.fetch(src).await;
            histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            (src, res)
        });

        let mut ok = Vec::with_capacity(self.sources.len());
        let mut failures = Vec::new();
        for (src, res) in join_all(fetches).await {
            match res {
                Ok(items) => {
                    counter!("news_candidates_total").increment(items.len() as u64);
                    ok.push((src, items));
                }
                Err(e) => {
                    tracing::warn!(
                        target: "ingest",
                        error = %e,
                        source = %src.name,
                        fetcher = self.fetcher.name(),
                        "source unavailable"
                    );
                    counter!("news_source_errors_total", "source" => src.name.clone()).increment(1);
                    failures.push(SourceFailure::new(&src.name, &e));
                }
            }
        }
        (ok, failures)
    }

    /// Classify sequentially; AI calls (if any) are spaced by `request_delay`.
    async fn classify_all(
        &self,
        fetched: Vec<(&FeedSource, Vec<CandidateItem>)>,
        now: DateTime<Utc>,
        min_score: u8,
    ) -> Vec<Article> {
        let mut accepted = Vec::new();
        let mut ai_calls = 0usize;

        for (src, items) in fetched {
            for item in items {
                let mut article = match self.classifier.classify(
                    &item,
                    src.kind,
                    &src.source_label,
                    now,
                    min_score,
                ) {
                    Ok(a) => a,
                    Err(r) => {
                        if r != Rejection::Malformed {
                            tracing::debug!(
                                target: "ingest",
                                reason = r.as_str(),
                                link = %item.link,
                                "candidate rejected"
                            );
                        }
                        counter!("news_rejected_total", "reason" => r.as_str()).increment(1);
                        continue;
                    }
                };

                if let Some(enhancer) = &self.enhancer {
                    if ai_calls > 0 && !self.request_delay.is_zero() {
                        tokio::time::sleep(self.request_delay).await;
                    }
                    ai_calls += 1;
                    if let Some(assessment) =
                        enhancer.assess(&article.title, &article.summary).await
                    {
                        article.set_score(assessment.relevance_score);
                        if !assessment.summary.is_empty() {
                            // `id` keeps the heuristic summary so it stays stable across runs
                            article.summary = clean_summary(&assessment.summary, SUMMARY_MAX_CHARS);
                        }
                        if article.relevance_score < min_score {
                            let reason = Rejection::LowScore.as_str();
                            counter!("news_rejected_total", "reason" => reason).increment(1);
                            continue;
                        }
                    }
                }

                counter!("news_accepted_total").increment(1);
                accepted.push(article);
            }
        }
        accepted
    }

    /// UI path with the current clock.
    pub async fn fetch_fresh(&self, profile: &RankProfile) -> PipelineReport {
        self.fetch_fresh_at(profile, Utc::now()).await
    }

    pub async fn fetch_fresh_at(
        &self,
        profile: &RankProfile,
        now: DateTime<Utc>,
    ) -> PipelineReport {
        ensure_metrics_described();
        let profile = profile.sanitized();

        let (fetched, source_errors) = self.fetch_all().await;
        let candidates = self.classify_all(fetched, now, profile.min_score).await;
        let accepted = candidates.len();

        let outcome = dedup_and_rank(candidates, &profile);
        counter!("news_dedup_dropped_total").increment(outcome.dropped as u64);
        let live = outcome.articles.len();

        let (articles, added) = apply_fallback(outcome.articles, &profile, &self.fallback_pool);
        if added > 0 {
            counter!("news_fallback_used_total").increment(added as u64);
            tracing::warn!(target: "ingest", live, added, "padding result with fallback articles");
        }
        gauge!("news_pipeline_last_run_ts").set(now.timestamp() as f64);

        tracing::info!(
            target: "ingest",
            sources = self.sources.len(),
            source_errors = source_errors.len(),
            accepted,
            dedup_dropped = outcome.dropped,
            returned = articles.len(),
            "fetch cycle complete"
        );

        PipelineReport {
            articles,
            source_errors,
            fallback_used: added > 0,
        }
    }

    /// Batch path with the current clock.
    pub async fn fetch_and_store(
        &self,
        store: &dyn ArticleStore,
        profile: &RankProfile,
    ) -> StoreSummary {
        self.fetch_and_store_at(store, profile, Utc::now()).await
    }

    /// Fetch, rank, and insert each article unless its link already exists.
    /// Store errors are logged per article and never stop the batch. Fallback
    /// content is never persisted.
    pub async fn fetch_and_store_at(
        &self,
        store: &dyn ArticleStore,
        profile: &RankProfile,
        now: DateTime<Utc>,
    ) -> StoreSummary {
        ensure_metrics_described();
        let profile = profile.sanitized();

        let (fetched, source_errors) = self.fetch_all().await;
        let candidates = self.classify_all(fetched, now, profile.min_score).await;
        let outcome = dedup_and_rank(candidates, &profile);
        counter!("news_dedup_dropped_total").increment(outcome.dropped as u64);

        let mut summary = StoreSummary {
            source_errors,
            ..StoreSummary::default()
        };

        for (i, article) in outcome.articles.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            match store.insert_if_absent(article).await {
                Ok(InsertOutcome::Inserted) => {
                    summary.inserted += 1;
                    counter!("news_store_inserted_total").increment(1);
                    tracing::debug!(target: "store", link = %article.link, "article inserted");
                }
                Ok(InsertOutcome::AlreadyPresent) => {
                    summary.already_present += 1;
                    counter!("news_store_skipped_total").increment(1);
                }
                Err(e) => {
                    summary.failed += 1;
                    counter!("news_store_errors_total").increment(1);
                    tracing::warn!(
                        target: "store",
                        error = %e,
                        store = store.name(),
                        link = %article.link,
                        "persisting article failed"
                    );
                }
            }
        }
        summary.articles = outcome.articles;
        gauge!("news_pipeline_last_run_ts").set(now.timestamp() as f64);

        tracing::info!(
            target: "store",
            inserted = summary.inserted,
            already_present = summary.already_present,
            failed = summary.failed,
            source_errors = summary.source_errors.len(),
            "fetch-and-store complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_punct() {
        let s = "  Hello,&nbsp;&nbsp; world!!!  ";
        let out = normalize_text(s);
        assert_eq!(out, "Hello, world");
    }

    #[test]
    fn normalize_strips_double_escaped_markup() {
        let s = "&lt;p&gt;FIT &amp;amp; colonoscopy&lt;/p&gt;";
        assert_eq!(normalize_text(s), "FIT & colonoscopy");
    }

    #[test]
    fn summary_short_text_untouched() {
        assert_eq!(clean_summary("<b>Short</b> text.", 240), "Short text.");
    }

    #[test]
    fn summary_truncates_on_word_boundary() {
        let raw = "word ".repeat(100);
        let s = clean_summary(&raw, 42);
        assert!(s.ends_with("..."));
        assert!(s.chars().count() <= 45);
        assert!(!s.contains("wor..."));
    }

    #[test]
    fn summary_drops_script_blocks() {
        let s = clean_summary("<script>alert(1)</script>Screening saves lives", 240);
        assert_eq!(s, "Screening saves lives");
    }
}
