use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::RangeInclusive;
use url::Url;

use crate::types::{ArticlePatch, NewArticle};

/// Raw request body: the JSON object a caller submitted.
pub type Fields = serde_json::Map<String, Value>;

pub const TITLE_MAX: usize = 255;
/// Width of the plain string columns (`source`, `category`, `author`, `url`, `image_url`).
pub const COLUMN_MAX: usize = 255;

/// Four-digit years only: stored timestamps stay fixed width.
pub const YEAR_RANGE: RangeInclusive<i32> = 0..=9999;

/// Field-level validation failures, keyed by wire field name in the order
/// the rules ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Headline message: the first error, plus a count of the rest.
    pub fn summary(&self) -> String {
        let Some(first) = self.0.values().flatten().next() else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{} (and 1 more error)", first),
            n => format!("{} (and {} more errors)", first, n),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

enum Slot<'a> {
    Missing,
    Null,
    Present(&'a Value),
}

/// Walks a submitted body, collecting every failure before giving up.
struct FieldReader<'a> {
    fields: &'a Fields,
    errors: ValidationErrors,
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a Fields) -> Self {
        Self {
            fields,
            errors: ValidationErrors::new(),
        }
    }

    // Blank strings count as null.
    fn slot(&self, field: &str) -> Slot<'a> {
        match self.fields.get(field) {
            None => Slot::Missing,
            Some(Value::Null) => Slot::Null,
            Some(Value::String(s)) if s.trim().is_empty() => Slot::Null,
            Some(value) => Slot::Present(value),
        }
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors.add(field, message);
    }

    /// Must be present and non-null.
    fn required<T: Default>(&mut self, field: &str, check: fn(&mut Self, &str, &Value) -> Option<T>) -> T {
        match self.slot(field) {
            Slot::Present(value) => check(self, field, value).unwrap_or_default(),
            Slot::Missing | Slot::Null => {
                self.fail(field, format!("The {} field is required.", label(field)));
                T::default()
            }
        }
    }

    /// May be missing or null.
    fn nullable<T>(&mut self, field: &str, check: fn(&mut Self, &str, &Value) -> Option<T>) -> Option<T> {
        match self.slot(field) {
            Slot::Present(value) => check(self, field, value),
            Slot::Missing | Slot::Null => None,
        }
    }

    /// Checked only when present; null is checked like any other value.
    fn sometimes<T>(&mut self, field: &str, check: fn(&mut Self, &str, &Value) -> Option<T>) -> Option<T> {
        match self.slot(field) {
            Slot::Missing => None,
            Slot::Null => check(self, field, &Value::Null),
            Slot::Present(value) => check(self, field, value),
        }
    }

    /// Like [`Self::nullable`], but reports an explicit null as `Some(None)`.
    fn sometimes_nullable<T>(
        &mut self,
        field: &str,
        check: fn(&mut Self, &str, &Value) -> Option<T>,
    ) -> Option<Option<T>> {
        match self.slot(field) {
            Slot::Missing => None,
            Slot::Null => Some(None),
            Slot::Present(value) => check(self, field, value).map(Some),
        }
    }

    fn text(&mut self, field: &str, value: &Value, max: usize) -> Option<String> {
        let Value::String(s) = value else {
            self.fail(field, format!("The {} field must be a string.", label(field)));
            return None;
        };
        let s = s.trim();
        if s.chars().count() > max {
            self.fail(
                field,
                format!("The {} field must not be greater than {} characters.", label(field), max),
            );
            return None;
        }
        Some(s.to_string())
    }

    fn title(&mut self, field: &str, value: &Value) -> Option<String> {
        self.text(field, value, TITLE_MAX)
    }

    fn column(&mut self, field: &str, value: &Value) -> Option<String> {
        self.text(field, value, COLUMN_MAX)
    }

    fn long_text(&mut self, field: &str, value: &Value) -> Option<String> {
        self.text(field, value, usize::MAX)
    }

    fn url(&mut self, field: &str, value: &Value) -> Option<String> {
        let parsed = match value {
            Value::String(s) => Url::parse(s.trim()).ok().filter(Url::has_host).map(|_| s.trim()),
            _ => None,
        };
        match parsed {
            Some(s) if s.chars().count() <= COLUMN_MAX => Some(s.to_string()),
            Some(_) => {
                self.fail(
                    field,
                    format!("The {} field must not be greater than {} characters.", label(field), COLUMN_MAX),
                );
                None
            }
            None => {
                self.fail(field, format!("The {} field must be a valid URL.", label(field)));
                None
            }
        }
    }

    fn date(&mut self, field: &str, value: &Value) -> Option<DateTime<Utc>> {
        let parsed = match value {
            Value::String(s) => parse_date(s.trim()),
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, format!("The {} field must be a valid date.", label(field)));
        }
        parsed
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (optionally with `T`), or a bare
/// date. Values without an offset are taken as UTC. The UTC year must fall
/// in [`YEAR_RANGE`].
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    parse_any_date(s).filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

fn parse_any_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl NewArticle {
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors> {
        let mut r = FieldReader::new(fields);
        let article = NewArticle {
            title: r.required("title", FieldReader::title),
            description: r.required("description", FieldReader::long_text),
            content: r.required("content", FieldReader::long_text),
            image_url: r.nullable("image_url", FieldReader::url),
            published_at: r.required("published_at", FieldReader::date),
            source: r.required("source", FieldReader::column),
            category: r.required("category", FieldReader::column),
            author: r.nullable("author", FieldReader::column),
            url: r.required("url", FieldReader::url),
        };
        r.finish()?;
        Ok(article)
    }
}

impl ArticlePatch {
    pub fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors> {
        let mut r = FieldReader::new(fields);
        let patch = ArticlePatch {
            title: r.sometimes("title", FieldReader::title),
            description: r.sometimes("description", FieldReader::long_text),
            content: r.sometimes("content", FieldReader::long_text),
            image_url: r.sometimes_nullable("image_url", FieldReader::url),
            published_at: r.sometimes("published_at", FieldReader::date),
            source: r.sometimes("source", FieldReader::column),
            category: r.sometimes("category", FieldReader::column),
            author: r.sometimes_nullable("author", FieldReader::column),
            url: r.sometimes("url", FieldReader::url),
        };
        r.finish()?;
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn valid() -> Value {
        json!({
            "title": "Moon base construction begins",
            "description": "An international agency starts building.",
            "content": "Long body text.",
            "image_url": "https://images.example.com/moon.jpg",
            "published_at": "2025-09-01T05:00:00Z",
            "source": "Science Daily",
            "category": "science",
            "author": "K. Takahashi",
            "url": "https://example.com/moon-base"
        })
    }

    #[test]
    fn test_valid_creation() {
        let article = NewArticle::from_fields(&fields(valid())).unwrap();
        assert_eq!(article.title, "Moon base construction begins");
        assert_eq!(article.published_at, Utc.with_ymd_and_hms(2025, 9, 1, 5, 0, 0).unwrap());
        assert_eq!(article.author.as_deref(), Some("K. Takahashi"));
    }

    #[test]
    fn test_missing_title_is_required() {
        let mut body = fields(valid());
        body.remove("title");
        let errors = NewArticle::from_fields(&body).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["The title field is required."]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_collects_every_failure() {
        let body = fields(json!({
            "title": "x".repeat(256),
            "description": "",
            "content": 42,
            "published_at": "yesterday",
            "source": "S",
            "category": "c",
            "url": "not a url",
            "image_url": "also not"
        }));
        let errors = NewArticle::from_fields(&body).unwrap_err();
        for field in ["title", "description", "content", "published_at", "url", "image_url"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
        assert!(!errors.contains("source"));
        assert!(errors.summary().contains("more errors"));
    }

    #[test]
    fn test_blank_optionals_become_absent() {
        let mut body = fields(valid());
        body.insert("image_url".into(), json!(""));
        body.insert("author".into(), json!("   "));
        let article = NewArticle::from_fields(&body).unwrap();
        assert_eq!(article.image_url, None);
        assert_eq!(article.author, None);
    }

    #[test]
    fn test_title_length_counts_characters() {
        let mut body = fields(valid());
        body.insert("title".into(), json!("記".repeat(255)));
        assert!(NewArticle::from_fields(&body).is_ok());
    }

    #[test]
    fn test_patch_only_reads_present_fields() {
        let patch = ArticlePatch::from_fields(&fields(json!({ "title": "Updated" }))).unwrap();
        assert_eq!(patch.title.as_deref(), Some("Updated"));
        assert_eq!(patch.content, None);
        assert_eq!(patch.author, None);

        assert!(ArticlePatch::from_fields(&Fields::new()).unwrap().is_empty());
    }

    #[test]
    fn test_patch_refuses_to_null_required_fields() {
        let body = fields(json!({ "title": null, "url": "", "published_at": null }));
        let errors = ArticlePatch::from_fields(&body).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["The title field must be a string."]);
        assert_eq!(errors.get("url").unwrap(), ["The url field must be a valid URL."]);
        assert_eq!(errors.get("published_at").unwrap(), ["The published at field must be a valid date."]);
    }

    #[test]
    fn test_patch_clears_optionals() {
        let patch = ArticlePatch::from_fields(&fields(json!({ "author": null, "image_url": "" }))).unwrap();
        assert_eq!(patch.author, Some(None));
        assert_eq!(patch.image_url, Some(None));
    }

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2025-09-01"), Some(expected));
        assert_eq!(parse_date("2025-09-01 00:00:00"), Some(expected));
        assert_eq!(parse_date("2025-09-01T09:00:00+09:00"), Some(expected));
        assert_eq!(parse_date("01/09/2025"), None);
    }

    #[test]
    fn test_date_year_must_have_four_digits() {
        assert!(parse_date("9999-12-31 23:59:59").is_some());
        assert!(parse_date("0000-01-01").is_some());
        assert_eq!(parse_date("+10000-01-01 00:00:00"), None);
        assert_eq!(parse_date("-0001-01-01"), None);
        // Offset pushes the UTC instant into year 10000.
        assert_eq!(parse_date("9999-12-31T23:00:00-05:00"), None);

        let mut body = fields(valid());
        body.insert("published_at".into(), json!("+10000-01-01 00:00:00"));
        let errors = NewArticle::from_fields(&body).unwrap_err();
        assert_eq!(errors.get("published_at").unwrap(), ["The published at field must be a valid date."]);
    }

    #[test]
    fn test_errors_follow_rule_order() {
        let body = fields(json!({ "url": "nope", "title": 7, "published_at": "never" }));
        let errors = ArticlePatch::from_fields(&body).unwrap_err();
        let order: Vec<_> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(order, ["title", "published_at", "url"]);
        assert!(errors.summary().starts_with("The title field must be a string."));
    }
}
