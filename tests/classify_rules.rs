// tests/classify_rules.rs
//
// Relevance gate and scoring with the shipped keyword lists.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crc_news_pipeline::article::ContentKind;
use crc_news_pipeline::classify::{Classifier, Rejection};
use crc_news_pipeline::config::AppConfig;
use crc_news_pipeline::ingest::types::CandidateItem;

fn classifier() -> Classifier {
    Classifier::new(&AppConfig::builtin().unwrap().keywords)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

fn item(title: &str, desc: &str, days_ago: i64) -> CandidateItem {
    CandidateItem {
        title: title.into(),
        link: format!("https://feed.test/{}", title.len()),
        raw_description: desc.into(),
        published_at_raw: Some((now() - Duration::days(days_ago)).to_rfc3339()),
    }
}

#[test]
fn guideline_headline_scores_at_least_five() {
    let a = classifier()
        .classify(
            &item("New Colonoscopy Guidelines Released", "", 0),
            ContentKind::News,
            "Google News",
            now(),
            3,
        )
        .unwrap();
    assert!(a.relevance_score >= 5, "got {}", a.relevance_score);
    assert_eq!(a.source_label, "Google News");
    assert!(!a.is_sticky);
    assert_eq!(a.sticky_priority, 999);
}

#[test]
fn keyword_in_markup_only_does_not_pass_gate() {
    let r = classifier().classify(
        &item(
            "Weekend weather outlook",
            r#"<a href="https://x.test/colonoscopy">link</a> sunny skies"#,
            0,
        ),
        ContentKind::News,
        "X",
        now(),
        1,
    );
    assert_eq!(r.unwrap_err(), Rejection::NoKeyword);
}

#[test]
fn entities_and_tags_are_cleaned_from_title_and_summary() {
    let a = classifier()
        .classify(
            &item(
                "Colon cancer &amp; diet: what&#39;s new",
                "<p>Fiber &lt;and&gt; screening.</p>",
                1,
            ),
            ContentKind::News,
            "X",
            now(),
            1,
        )
        .unwrap();
    assert_eq!(a.title, "Colon cancer & diet: what's new");
    assert_eq!(a.summary, "Fiber screening.");
}

#[test]
fn long_description_is_truncated_with_ellipsis() {
    let desc = "Colonoscopy remains the reference exam for detecting polyps early. ".repeat(10);
    let a = classifier()
        .classify(&item("Colonoscopy explained", &desc, 2), ContentKind::News, "X", now(), 1)
        .unwrap();
    assert!(a.summary.ends_with("..."));
    assert!(a.summary.chars().count() <= 243);
}

#[test]
fn retention_boundaries_per_kind() {
    let c = classifier();
    let news_ok = item("Colonoscopy access widens", "", 29);
    let news_old = item("Colonoscopy access widens", "", 31);
    let pub_old = item("Polyp surveillance intervals revisited", "", 179);
    let pub_too_old = item("Polyp surveillance intervals revisited", "", 181);

    assert!(c.classify(&news_ok, ContentKind::News, "X", now(), 1).is_ok());
    assert_eq!(
        c.classify(&news_old, ContentKind::News, "X", now(), 1).unwrap_err(),
        Rejection::Stale
    );
    assert!(c.classify(&pub_old, ContentKind::Publication, "X", now(), 1).is_ok());
    assert_eq!(
        c.classify(&pub_too_old, ContentKind::Publication, "X", now(), 1)
            .unwrap_err(),
        Rejection::Stale
    );
}

#[test]
fn promotional_copy_is_excluded() {
    let r = classifier().classify(
        &item("Colonoscopy prep giveaway", "Use promo code SAVE20", 0),
        ContentKind::News,
        "X",
        now(),
        3,
    );
    assert_eq!(r.unwrap_err(), Rejection::Excluded);
}

#[test]
fn missing_title_or_link_is_malformed() {
    let c = classifier();
    let mut it = item("Colonoscopy", "", 0);
    it.link = "   ".into();
    assert_eq!(
        c.classify(&it, ContentKind::News, "X", now(), 1).unwrap_err(),
        Rejection::Malformed
    );
    let it = item("<b></b>", "colonoscopy", 0);
    assert_eq!(
        c.classify(&it, ContentKind::News, "X", now(), 1).unwrap_err(),
        Rejection::Malformed
    );
}

#[test]
fn same_story_gets_same_id() {
    let c = classifier();
    let a = c
        .classify(&item("Colonoscopy at 45", "Start earlier.", 0), ContentKind::News, "A", now(), 1)
        .unwrap();
    let mut other = item("Colonoscopy at 45", "Start earlier.", 3);
    other.link = "https://elsewhere.test/x".into();
    let b = c
        .classify(&other, ContentKind::News, "B", now(), 1)
        .unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.id.len(), 16);
}
