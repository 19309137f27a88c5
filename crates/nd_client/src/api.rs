use async_trait::async_trait;
use nd_core::{Article, ArticleId, Fields, Page, ValidationErrors};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

use crate::error::ClientError;
use crate::transcode::ArticleSubmission;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// The `/news` resource as seen from a client.
#[async_trait]
pub trait NewsApi: Send + Sync {
    async fn list(&self, page: u64) -> Result<Page<Article>, ClientError>;

    async fn get(&self, id: ArticleId) -> Result<Article, ClientError>;

    async fn create(&self, article: &ArticleSubmission) -> Result<Article, ClientError>;

    /// Partial update: only the keys present in `fields` are sent.
    async fn update(&self, id: ArticleId, fields: &Fields) -> Result<Article, ClientError>;

    async fn delete(&self, id: ArticleId) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct ValidationBody {
    errors: ValidationErrors,
}

pub struct HttpNewsApi {
    client: Client,
    base_url: String,
}

impl HttpNewsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn news_url(&self) -> String {
        format!("{}/news", self.base_url)
    }

    fn article_url(&self, id: ArticleId) -> String {
        format!("{}/news/{}", self.base_url, id)
    }

    /// Turns non-success statuses into typed errors.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let bytes = response.bytes().await?;
                let body: ValidationBody = serde_json::from_slice(&bytes)
                    .map_err(|e| ClientError::Decode(format!("validation body: {}", e)))?;
                Err(ClientError::Validation(body.errors))
            }
            _ => Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl fmt::Debug for HttpNewsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNewsApi")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl NewsApi for HttpNewsApi {
    async fn list(&self, page: u64) -> Result<Page<Article>, ClientError> {
        let response = self
            .client
            .get(self.news_url())
            .query(&[("page", page)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get(&self, id: ArticleId) -> Result<Article, ClientError> {
        let response = self.client.get(self.article_url(id)).send().await?;
        Self::decode(response).await
    }

    async fn create(&self, article: &ArticleSubmission) -> Result<Article, ClientError> {
        let response = self.client.post(self.news_url()).json(article).send().await?;
        Self::decode(response).await
    }

    async fn update(&self, id: ArticleId, fields: &Fields) -> Result<Article, ClientError> {
        let response = self.client.put(self.article_url(id)).json(fields).send().await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: ArticleId) -> Result<(), ClientError> {
        let response = self.client.delete(self.article_url(id)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let api = HttpNewsApi::new("http://localhost:8000/api/");
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.news_url(), "http://localhost:8000/api/news");
        assert_eq!(api.article_url(ArticleId(5)), "http://localhost:8000/api/news/5");
    }
}
