// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod article;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod fallback;
pub mod ingest;
pub mod metrics;
pub mod store;

// Optional LLM summary/score enhancement
pub mod analyze;
pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::{router, AppState};
pub use crate::article::{Article, ContentKind};
pub use crate::dedup::{apply_fallback, dedup_and_rank, RankProfile};
pub use crate::ingest::{NewsPipeline, PipelineReport, StoreSummary};
