//! Mapping between the wire shape of an article and the shape the client
//! displays.
//!
//! Going to display, a null `image_url` becomes an empty string and a null
//! `author` becomes `None`. Going back to the wire, an empty string in either
//! optional field is sent as an explicit null. That direction is lossy: an
//! empty optional never survives as an empty string.

use chrono::{DateTime, Local, Utc};
use nd_core::{Article, Fields};
use serde::{Deserialize, Serialize};

/// Article as the list and detail views consume it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: String,
    pub author: Option<String>,
    pub url: String,
}

/// Body of a create request: the wire shape minus server-set fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSubmission {
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

/// Edits made on the client. `None` leaves a field alone; an empty
/// `image_url` or `author` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl From<&Article> for DisplayArticle {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.to_string(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone().unwrap_or_default(),
            published_at: article.published_at,
            source: article.source.clone(),
            category: article.category.clone(),
            author: article.author.clone(),
            url: article.url.clone(),
        }
    }
}

impl From<Article> for DisplayArticle {
    fn from(article: Article) -> Self {
        Self::from(&article)
    }
}

impl From<&DisplayArticle> for ArticleSubmission {
    fn from(article: &DisplayArticle) -> Self {
        Self {
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image_url: optional(&article.image_url),
            published_at: article.published_at,
            source: article.source.clone(),
            category: article.category.clone(),
            author: article.author.as_deref().and_then(optional),
            url: article.url.clone(),
        }
    }
}

impl ArticleSubmission {
    /// The request body as a JSON object, nulls included.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".into(), self.title.clone().into());
        fields.insert("description".into(), self.description.clone().into());
        fields.insert("content".into(), self.content.clone().into());
        fields.insert("image_url".into(), self.image_url.clone().into());
        fields.insert("published_at".into(), self.published_at.to_rfc3339().into());
        fields.insert("source".into(), self.source.clone().into());
        fields.insert("category".into(), self.category.clone().into());
        fields.insert("author".into(), self.author.clone().into());
        fields.insert("url".into(), self.url.clone().into());
        fields
    }
}

impl DisplayPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Only the touched fields, with cleared optionals as explicit nulls.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        let texts = [
            ("title", &self.title),
            ("description", &self.description),
            ("content", &self.content),
            ("source", &self.source),
            ("category", &self.category),
            ("url", &self.url),
        ];
        for (name, value) in texts {
            if let Some(value) = value {
                fields.insert(name.into(), value.clone().into());
            }
        }
        for (name, value) in [("image_url", &self.image_url), ("author", &self.author)] {
            if let Some(value) = value {
                fields.insert(name.into(), optional(value).into());
            }
        }
        if let Some(published_at) = self.published_at {
            fields.insert("published_at".into(), published_at.to_rfc3339().into());
        }
        fields
    }
}

impl DisplayArticle {
    /// Whether the publish time has been reached.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.published_at <= now
    }

    /// The first `length` characters of `text`, with `...` when cut.
    pub fn excerpt(text: &str, length: usize) -> String {
        if text.chars().count() <= length {
            return text.to_string();
        }
        let cut: String = text.chars().take(length).collect();
        format!("{}...", cut)
    }

    pub fn local_published_at(&self, format: &str) -> String {
        self.published_at.with_timezone(&Local).format(format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nd_core::ArticleId;
    use serde_json::Value;

    fn wire() -> Article {
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 7, 0, 0).unwrap();
        Article {
            id: ArticleId(12),
            title: "AI advances".to_string(),
            description: "Summary".to_string(),
            content: "Body".to_string(),
            image_url: Some("https://images.example.com/ai.jpg".to_string()),
            published_at: at,
            source: "Tech News".to_string(),
            category: "technology".to_string(),
            author: Some("T. Tanaka".to_string()),
            url: "https://example.com/ai".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn submitted_fields(article: &Article) -> ArticleSubmission {
        ArticleSubmission {
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone(),
            published_at: article.published_at,
            source: article.source.clone(),
            category: article.category.clone(),
            author: article.author.clone(),
            url: article.url.clone(),
        }
    }

    #[test]
    fn test_to_display() {
        let mut article = wire();
        article.image_url = None;
        article.author = None;
        let display = DisplayArticle::from(&article);

        assert_eq!(display.id, "12");
        assert_eq!(display.image_url, "");
        assert_eq!(display.author, None);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let article = wire();
        let back = ArticleSubmission::from(&DisplayArticle::from(&article));
        assert_eq!(back, submitted_fields(&article));

        let mut bare = wire();
        bare.image_url = None;
        bare.author = None;
        let back = ArticleSubmission::from(&DisplayArticle::from(&bare));
        assert_eq!(back, submitted_fields(&bare));
    }

    #[test]
    fn test_empty_optionals_become_null() {
        let mut display = DisplayArticle::from(&wire());
        display.image_url = String::new();
        display.author = Some(String::new());

        let submission = ArticleSubmission::from(&display);
        assert_eq!(submission.image_url, None);
        assert_eq!(submission.author, None);

        let body = serde_json::to_value(&submission).unwrap();
        assert_eq!(body["image_url"], Value::Null);
        assert_eq!(body["author"], Value::Null);
        assert_eq!(submission.to_fields().get("author"), Some(&Value::Null));
    }

    #[test]
    fn test_patch_fields() {
        let patch = DisplayPatch {
            title: Some("New".to_string()),
            author: Some(String::new()),
            ..Default::default()
        };
        let fields = patch.to_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["title"], "New");
        assert_eq!(fields["author"], Value::Null);
        assert!(DisplayPatch::default().to_fields().is_empty());
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(DisplayArticle::excerpt("short", 10), "short");
        assert_eq!(DisplayArticle::excerpt("a longer sentence", 8), "a longer...");
        assert_eq!(DisplayArticle::excerpt("月面基地建設", 2), "月面...");
    }

    #[test]
    fn test_is_published() {
        let display = DisplayArticle::from(&wire());
        assert!(display.is_published(Utc::now()));
        assert!(!display.is_published(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
    }
}
