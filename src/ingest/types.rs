// src/ingest/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::article::ContentKind;
use crate::ingest::error::SourceError;

/// A configured feed origin. Static configuration, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub source_label: String,
    pub kind: ContentKind,
}

/// Raw entry returned by a fetcher, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
    pub raw_description: String,
    pub published_at_raw: Option<String>,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<CandidateItem>, SourceError>;
    fn name(&self) -> &'static str;
}
