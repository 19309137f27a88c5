use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use nd_core::{Article, ArticleId, ArticlePatch, ArticleStore, Error, NewArticle, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::StorageBackend;

const DEFAULT_URL: &str = "sqlite:news.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        content TEXT NOT NULL,
        image_url TEXT,
        published_at TEXT NOT NULL,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        author TEXT,
        url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS news_published_at_index ON news (published_at)",
    "CREATE INDEX IF NOT EXISTS news_category_index ON news (category)",
    "CREATE INDEX IF NOT EXISTS news_source_index ON news (source)",
    "CREATE INDEX IF NOT EXISTS news_category_published_at_index ON news (category, published_at)",
];

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Database(format!("Failed to {}: {}", context, e))
}

// Fixed width, so text order matches time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column).map_err(db_error("read timestamp"))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse {} '{}': {}", column, raw, e)))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        id: ArticleId(row.try_get("id").map_err(db_error("read id"))?),
        title: row.try_get("title").map_err(db_error("read title"))?,
        description: row.try_get("description").map_err(db_error("read description"))?,
        content: row.try_get("content").map_err(db_error("read content"))?,
        image_url: row.try_get("image_url").map_err(db_error("read image_url"))?,
        published_at: parse_timestamp(row, "published_at")?,
        source: row.try_get("source").map_err(db_error("read source"))?,
        category: row.try_get("category").map_err(db_error("read category"))?,
        author: row.try_get("author").map_err(db_error("read author"))?,
        url: row.try_get("url").map_err(db_error("read url"))?,
        created_at: parse_timestamp(row, "created_at")?,
        updated_at: parse_timestamp(row, "updated_at")?,
    })
}

async fn update_locked(
    conn: &mut SqliteConnection,
    id: ArticleId,
    patch: &ArticlePatch,
    now: DateTime<Utc>,
) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM news WHERE id = ?")
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("get article"))?;
    let Some(row) = row else {
        return Ok(None);
    };

    let mut article = row_to_article(&row)?;
    patch.apply(&mut article, now);

    sqlx::query(
        r#"
        UPDATE news SET
        title = ?, description = ?, content = ?, image_url = ?, published_at = ?,
        source = ?, category = ?, author = ?, url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.content)
    .bind(article.image_url.as_deref())
    .bind(format_timestamp(article.published_at))
    .bind(&article.source)
    .bind(&article.category)
    .bind(article.author.as_deref())
    .bind(&article.url)
    .bind(format_timestamp(article.updated_at))
    .bind(id.0)
    .execute(&mut *conn)
    .await
    .map_err(db_error("update article"))?;

    Ok(Some(article))
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be reachable at the configured database URL"
    }

    async fn connect(url: Option<&str>) -> Result<Self> {
        Self::new_with_url(url.unwrap_or(DEFAULT_URL)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create database directory: {}", e)))?;
        }
        Self::new_with_url(&format!("sqlite:{}", db_path.display())).await
    }

    pub async fn new_with_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_error("parse database url"))?
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        // Each in-memory connection would be its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_error("connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!("Connected to {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn insert(&self, article: NewArticle, now: DateTime<Utc>) -> Result<Article> {
        let result = sqlx::query(
            r#"
            INSERT INTO news
            (title, description, content, image_url, published_at, source, category, author, url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(article.image_url.as_deref())
        .bind(format_timestamp(article.published_at))
        .bind(&article.source)
        .bind(&article.category)
        .bind(article.author.as_deref())
        .bind(&article.url)
        .bind(format_timestamp(now))
        .bind(format_timestamp(now))
        .execute(&*self.pool)
        .await
        .map_err(db_error("store article"))?;

        Ok(Article::from_new(ArticleId(result.last_insert_rowid()), article, now))
    }

    async fn get(&self, id: ArticleId) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM news WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("get article"))?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn update(&self, id: ArticleId, patch: &ArticlePatch, now: DateTime<Utc>) -> Result<Option<Article>> {
        let pool = self.pool.clone();
        let patch = patch.clone();
        // Detached so a dropped caller cannot leave an open transaction on a pooled connection.
        tokio::spawn(async move {
            let mut conn = pool.acquire().await.map_err(db_error("acquire connection"))?;
            // Take the write lock before reading so concurrent updates queue on the busy timeout.
            sqlx::query("BEGIN IMMEDIATE")
                .execute(&mut *conn)
                .await
                .map_err(db_error("begin update"))?;

            let outcome = update_locked(&mut conn, id, &patch, now).await;
            let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
            sqlx::query(finish)
                .execute(&mut *conn)
                .await
                .map_err(db_error("finish update"))?;
            outcome
        })
        .await
        .map_err(|e| Error::Storage(format!("Update task failed: {}", e)))?
    }

    async fn delete(&self, id: ArticleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(id.0)
            .execute(&*self.pool)
            .await
            .map_err(db_error("delete article"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("count articles"))?;
        Ok(total as u64)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<Article>, u64)> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("count articles"))?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM news
            ORDER BY published_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit as i64)
        .bind(offset.min(i64::MAX as u64) as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("list articles"))?;

        tx.commit().await.map_err(db_error("commit list"))?;

        let articles = rows.iter().map(row_to_article).collect::<Result<Vec<_>>>()?;
        Ok((articles, total as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            description: "Summary".to_string(),
            content: "Body".to_string(),
            image_url: Some("https://example.com/a.jpg".to_string()),
            published_at: Utc.with_ymd_and_hms(2025, 9, 1, 6, 0, 0).unwrap(),
            source: "test".to_string(),
            category: "business".to_string(),
            author: None,
            url: "https://example.com/a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        let stored = storage.insert(new_article("Test Article"), Utc::now()).await.unwrap();
        let fetched = storage.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(storage.count().await.unwrap(), 1);

        assert!(storage.delete(stored.id).await.unwrap());
        assert!(storage.get(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("news.db");

        let id = {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            storage.insert(new_article("Persisted"), Utc::now()).await.unwrap().id
        };

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let article = storage.get(id).await.unwrap().unwrap();
        assert_eq!(article.title, "Persisted");
    }

    #[tokio::test]
    async fn test_year_boundaries_round_trip() {
        let storage = SQLiteStorage::new_with_url("sqlite::memory:").await.unwrap();
        let mut earliest = new_article("earliest");
        earliest.published_at = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        let mut latest = new_article("latest");
        latest.published_at = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();

        let earliest = storage.insert(earliest, Utc::now()).await.unwrap();
        let latest = storage.insert(latest, Utc::now()).await.unwrap();
        assert_eq!(storage.get(earliest.id).await.unwrap().unwrap(), earliest);
        assert_eq!(storage.get(latest.id).await.unwrap().unwrap(), latest);

        let (articles, _) = storage.list(0, 10).await.unwrap();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["latest", "earliest"]);
    }

    #[tokio::test]
    async fn test_in_memory_url() {
        let storage = SQLiteStorage::new_with_url("sqlite::memory:").await.unwrap();
        storage.insert(new_article("a"), Utc::now()).await.unwrap();
        let (articles, total) = storage.list(0, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(articles.len(), 1);
    }
}
