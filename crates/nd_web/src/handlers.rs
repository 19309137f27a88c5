use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nd_core::{Article, ArticleId, Fields, Page};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<String>,
}

/// Missing, non-numeric and zero pages all read as the first page.
fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn article_id(raw: &str) -> ApiResult<ArticleId> {
    raw.parse().map_err(|_| ApiError::UnknownRoute)
}

pub async fn list_articles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Article>>> {
    let page = state.service.list(page_number(params.page.as_deref())).await?;
    Ok(Json(page))
}

pub async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<Fields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = payload?;
    let article = state.service.create(&fields).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    let article = state.service.get(article_id(&id)?).await?;
    Ok(Json(article))
}

pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Fields>, JsonRejection>,
) -> ApiResult<Json<Article>> {
    let id = article_id(&id)?;
    let Json(fields) = payload?;
    let article = state.service.update(id, &fields).await?;
    Ok(Json(article))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete(article_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_app;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use axum::Router;
    use nd_storage::InMemoryStorage;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        create_app(AppState::new(Arc::new(InMemoryStorage::new())))
    }

    fn body(title: Option<&str>, published_at: &str) -> Value {
        let mut value = json!({
            "description": "Investment in AI and fintech is accelerating.",
            "content": "Venture capital investment grew 30% year over year.",
            "image_url": null,
            "published_at": published_at,
            "source": "Business Today",
            "category": "business",
            "author": "H. Sato",
            "url": "https://example.com/startup-investment"
        });
        if let Some(title) = title {
            value["title"] = json!(title);
        }
        value
    }

    async fn send(app: &Router, method: Method, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match payload {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("0")), 1);
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some("3")), 3);
    }

    #[tokio::test]
    async fn test_crud_round_trip() {
        let app = app();

        let (status, created) = send(&app, Method::POST, "/api/news", Some(body(Some("Startups"), "2025-09-01T06:30:00Z"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["image_url"], Value::Null);
        assert!(created["created_at"].is_string());

        let (status, fetched) = send(&app, Method::GET, &format!("/api/news/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/news/{}", id),
            Some(json!({ "title": "Startup investment trends" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Startup investment trends");
        assert_eq!(updated["author"], "H. Sato");

        let (status, body) = send(&app, Method::DELETE, &format!("/api/news/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, Method::DELETE, &format!("/api/news/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], format!("Article {} not found", id));
    }

    #[tokio::test]
    async fn test_missing_title_is_unprocessable() {
        let app = app();

        let (status, body) = send(&app, Method::POST, "/api/news", Some(body(None, "2025-09-01T06:30:00Z"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["title"], json!(["The title field is required."]));
        assert_eq!(body["message"], "The title field is required.");

        let (_, page) = send(&app, Method::GET, "/api/news", None).await;
        assert_eq!(page["total"], 0);
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let app = app();
        for i in 0..13 {
            let at = format!("2025-09-01T{:02}:00:00Z", i);
            let (status, _) = send(&app, Method::POST, "/api/news", Some(body(Some(&format!("n{}", i)), &at))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, first) = send(&app, Method::GET, "/api/news", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"].as_array().unwrap().len(), 10);
        assert_eq!(first["current_page"], 1);
        assert_eq!(first["total"], 13);
        assert_eq!(first["per_page"], 10);
        assert_eq!(first["last_page"], 2);
        assert_eq!(first["data"][0]["title"], "n12");

        let (_, second) = send(&app, Method::GET, "/api/news?page=2", None).await;
        assert_eq!(second["data"].as_array().unwrap().len(), 3);
        assert_eq!(second["current_page"], 2);

        let (status, beyond) = send(&app, Method::GET, "/api/news?page=9", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(beyond["data"].as_array().unwrap().is_empty());
        assert_eq!(beyond["from"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/api/news/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::GET, "/api/news/not-a-number", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The missing record is reported before the invalid body.
        let (status, _) = send(&app, Method::PUT, "/api/news/42", Some(json!({ "url": "nope" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/news")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, "/api/news", Some(json!(["an", "array"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
