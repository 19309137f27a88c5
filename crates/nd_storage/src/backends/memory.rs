use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nd_core::{Article, ArticleId, ArticlePatch, ArticleStore, NewArticle, Result};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StorageBackend;

pub struct MemoryStore {
    articles: BTreeMap<ArticleId, Article>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            articles: BTreeMap::new(),
            last_id: 0,
        }
    }

    pub fn insert(&mut self, article: NewArticle, now: DateTime<Utc>) -> Article {
        self.last_id += 1;
        let article = Article::from_new(ArticleId(self.last_id), article, now);
        self.articles.insert(article.id, article.clone());
        article
    }

    pub fn update(&mut self, id: ArticleId, patch: &ArticlePatch, now: DateTime<Utc>) -> Option<Article> {
        let article = self.articles.get_mut(&id)?;
        patch.apply(article, now);
        Some(article.clone())
    }

    pub fn list(&self, offset: u64, limit: u64) -> (Vec<Article>, u64) {
        let mut articles = self.articles.values().collect::<Vec<_>>();
        articles.sort_by_key(|a| Reverse((a.published_at, a.id)));
        let page = articles
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        (page, self.articles.len() as u64)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-local store. Ids are never reused, even after deletes.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_url: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn insert(&self, article: NewArticle, now: DateTime<Utc>) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.insert(article, now))
    }

    async fn get(&self, id: ArticleId) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.get(&id).cloned())
    }

    async fn update(&self, id: ArticleId, patch: &ArticlePatch, now: DateTime<Utc>) -> Result<Option<Article>> {
        let mut store = self.store.write().await;
        Ok(store.update(id, patch, now))
    }

    async fn delete(&self, id: ArticleId) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.articles.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.articles.len() as u64)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Article>, u64)> {
        let store = self.store.read().await;
        Ok(store.list(offset, limit))
    }
}
