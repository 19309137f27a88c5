use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::ArticleStore;
use crate::types::{Article, ArticleId, ArticlePatch, NewArticle, Page, PER_PAGE};
use crate::validation::Fields;
use crate::{Error, Result};

/// Stateless CRUD operations over an [`ArticleStore`].
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
}

impl ArticleService {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    /// One page of [`PER_PAGE`] articles. Pages are 1-based; 0 is read as 1.
    /// A page past the last one comes back empty.
    pub async fn list(&self, page: u64) -> Result<Page<Article>> {
        let page = page.max(1);
        let offset = (page - 1).saturating_mul(PER_PAGE);
        let (articles, total) = self.store.list(offset, PER_PAGE).await?;
        debug!("📰 Listed page {} ({} of {} articles)", page, articles.len(), total);
        Ok(Page::new(articles, page, PER_PAGE, total))
    }

    pub async fn get(&self, id: ArticleId) -> Result<Article> {
        self.store.get(id).await?.ok_or(Error::NotFound(id))
    }

    pub async fn create(&self, fields: &Fields) -> Result<Article> {
        let article = NewArticle::from_fields(fields)?;
        let article = self.store.insert(article, Utc::now()).await?;
        info!("🆕 Created article {}: {}", article.id, article.title);
        Ok(article)
    }

    /// Unknown ids fail with `NotFound` before the body is looked at.
    pub async fn update(&self, id: ArticleId, fields: &Fields) -> Result<Article> {
        if self.store.get(id).await?.is_none() {
            return Err(Error::NotFound(id));
        }
        let patch = ArticlePatch::from_fields(fields)?;
        let article = self
            .store
            .update(id, &patch, Utc::now())
            .await?
            .ok_or(Error::NotFound(id))?;
        info!("📝 Updated article {}", article.id);
        Ok(article)
    }

    pub async fn delete(&self, id: ArticleId) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(Error::NotFound(id));
        }
        info!("🗑️ Deleted article {}", id);
        Ok(())
    }
}
