// src/fallback.rs
//! Hand-authored evergreen articles shown when live feeds return too little.

use crate::article::{article_id, Article, ContentKind, NON_STICKY_PRIORITY};

struct Curated {
    title: &'static str,
    link: &'static str,
    source_label: &'static str,
    summary: &'static str,
    score: u8,
    kind: ContentKind,
}

const CURATED: &[Curated] = &[
    Curated {
        title: "USPSTF Recommends Colorectal Cancer Screening Starting at Age 45",
        link: "https://www.uspreventiveservicestaskforce.org/uspstf/recommendation/colorectal-cancer-screening",
        source_label: "U.S. Preventive Services Task Force",
        summary: "Adults aged 45 to 75 should be screened for colorectal cancer. The recommendation lowered the starting age from 50 after a rise in cases among younger adults.",
        score: 8,
        kind: ContentKind::Publication,
    },
    Curated {
        title: "American Cancer Society Guideline for Colorectal Cancer Screening",
        link: "https://www.cancer.org/cancer/types/colon-rectal-cancer/detection-diagnosis-staging/acs-recommendations.html",
        source_label: "American Cancer Society",
        summary: "People at average risk should start regular screening at age 45, with either a stool-based test or a visual exam of the colon and rectum.",
        score: 8,
        kind: ContentKind::Publication,
    },
    Curated {
        title: "Which Colorectal Cancer Screening Test Is Right for You?",
        link: "https://www.cdc.gov/colorectal-cancer/screening/index.html",
        source_label: "CDC",
        summary: "Several tests can find polyps or cancer early: FIT kits done at home every year, stool DNA tests every three years, and colonoscopy every ten years.",
        score: 7,
        kind: ContentKind::News,
    },
    Curated {
        title: "Early-Onset Colorectal Cancer Is Rising Among Younger Adults",
        link: "https://www.cancer.gov/news-events/cancer-currents-blog/2020/colorectal-cancer-rising-younger-adults",
        source_label: "National Cancer Institute",
        summary: "Incidence in people under 50 has climbed for decades. Researchers are studying diet, obesity and the microbiome as possible drivers.",
        score: 7,
        kind: ContentKind::News,
    },
    Curated {
        title: "Colonoscopy Prep Tips From Gastroenterologists",
        link: "https://www.fightcolorectalcancer.org/prevent/about-colorectal-cancer/screening/",
        source_label: "Fight Colorectal Cancer",
        summary: "Planning the bowel prep, adjusting diet the day before, and knowing what to expect on procedure day make the exam easier.",
        score: 6,
        kind: ContentKind::News,
    },
];

/// The curated pool, in presentation order. Never empty.
pub fn fallback_articles() -> Vec<Article> {
    CURATED
        .iter()
        .map(|c| Article {
            id: article_id(c.title, c.summary),
            title: c.title.to_string(),
            link: c.link.to_string(),
            source_label: c.source_label.to_string(),
            published_at: None,
            summary: c.summary.to_string(),
            relevance_score: c.score,
            is_sticky: false,
            sticky_priority: NON_STICKY_PRIORITY,
            kind: c.kind,
            is_fallback: true,
        })
        .collect()
}
