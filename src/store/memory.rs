// src/store/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ArticleStore, InsertOutcome, StoreError};
use crate::article::Article;

/// In-process store for local runs without credentials, and for tests.
/// Links listed in `failing_links` make every call for them fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, Article>>,
    failing_links: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: Mutex::new(HashMap::new()),
            failing_links: links.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock_rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, link: &str) -> Result<Option<Article>, StoreError> {
        Ok(self.lock_rows()?.get(link).cloned())
    }

    fn lock_rows(&self) -> Result<MutexGuard<'_, HashMap<String, Article>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Request("lock poisoned".into()))
    }

    fn check(&self, link: &str) -> Result<(), StoreError> {
        if self.failing_links.contains(link) {
            return Err(StoreError::Request(format!("injected failure for {link}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists_by_link(&self, link: &str) -> Result<bool, StoreError> {
        self.check(link)?;
        let rows = self.lock_rows()?;
        Ok(rows.contains_key(link))
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome, StoreError> {
        self.check(&article.link)?;
        let mut rows = self.lock_rows()?;
        if rows.contains_key(&article.link) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        rows.insert(article.link.clone(), article.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
