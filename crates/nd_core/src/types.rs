use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed page size of the list endpoint.
pub const PER_PAGE: u64 = 10;

/// Store-assigned article identifier. Increases with creation order and is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(ArticleId)
    }
}

/// A stored article in its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: String,
    pub author: Option<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn from_new(id: ArticleId, new: NewArticle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            content: new.content,
            image_url: new.image_url,
            published_at: new.published_at,
            source: new.source,
            category: new.category,
            author: new.author,
            url: new.url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated creation request. Built by [`NewArticle::from_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: String,
    pub author: Option<String>,
    pub url: String,
}

/// A validated partial update. `None` leaves a field untouched; for the
/// nullable fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<Option<String>>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub author: Option<Option<String>>,
    pub url: Option<String>,
}

impl ArticlePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the present fields into `article` and bumps `updated_at`.
    pub fn apply(&self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(description) = &self.description {
            article.description = description.clone();
        }
        if let Some(content) = &self.content {
            article.content = content.clone();
        }
        if let Some(image_url) = &self.image_url {
            article.image_url = image_url.clone();
        }
        if let Some(published_at) = self.published_at {
            article.published_at = published_at;
        }
        if let Some(source) = &self.source {
            article.source = source.clone();
        }
        if let Some(category) = &self.category {
            article.category = category.clone();
        }
        if let Some(author) = &self.author {
            article.author = author.clone();
        }
        if let Some(url) = &self.url {
            article.url = url.clone();
        }
        article.updated_at = next_timestamp(article.updated_at, now);
    }
}

/// `now`, or one microsecond past `previous` when the clock has not moved on.
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Paginated envelope returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u64,
    pub total: u64,
    pub per_page: u64,
    pub last_page: u64,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, current_page: u64, per_page: u64, total: u64) -> Self {
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = current_page.saturating_sub(1) * per_page + 1;
            (Some(from), Some(from + data.len() as u64 - 1))
        };
        Self {
            data,
            current_page,
            total,
            per_page,
            last_page,
            from,
            to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            total: self.total,
            per_page: self.per_page,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}
