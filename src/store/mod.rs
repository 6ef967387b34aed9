// src/store/mod.rs
//! Idempotent persistence keyed by article link: look up, insert if absent.
//! There is no update or delete path.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use thiserror::Error;

use crate::article::Article;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected store response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn exists_by_link(&self, link: &str) -> Result<bool, StoreError>;

    /// Insert a new row. Implementations report a unique-key conflict as
    /// `Ok(InsertOutcome::AlreadyPresent)`.
    async fn insert(&self, article: &Article) -> Result<InsertOutcome, StoreError>;

    /// Skip-if-exists insert; safe to repeat.
    async fn insert_if_absent(&self, article: &Article) -> Result<InsertOutcome, StoreError> {
        if self.exists_by_link(&article.link).await? {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        self.insert(article).await
    }

    fn name(&self) -> &'static str;
}
