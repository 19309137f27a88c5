use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Article, ArticleId, ArticlePatch, NewArticle};
use crate::Result;

/// Persisted article collection. Every call commits before returning and is
/// atomic with respect to other calls on the same store.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Assign the next id and persist the article with `now` as both timestamps.
    async fn insert(&self, article: NewArticle, now: DateTime<Utc>) -> Result<Article>;

    /// Fetch one article
    async fn get(&self, id: ArticleId) -> Result<Option<Article>>;

    /// Merge a patch into an existing article. `None` if the id is unknown.
    async fn update(&self, id: ArticleId, patch: &ArticlePatch, now: DateTime<Utc>) -> Result<Option<Article>>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: ArticleId) -> Result<bool>;

    /// Number of stored articles
    async fn count(&self) -> Result<u64>;

    /// A window of articles, newest `published_at` first (ties: highest id
    /// first), together with the total count read in the same snapshot.
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Article>, u64)>;
}
