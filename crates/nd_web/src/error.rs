use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nd_core::ValidationErrors;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] nd_core::Error),

    #[error("Malformed request body: {0}")]
    BadRequest(String),

    #[error("Resource not found")]
    UnknownRoute,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// 422 body: a headline message plus every failing field.
#[derive(Serialize)]
pub struct ValidationResponse<'a> {
    pub message: String,
    pub errors: &'a ValidationErrors,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(err = %self, "Request error");

        let (status, message) = match self {
            ApiError::Core(nd_core::Error::Validation(errors)) => {
                let body = ValidationResponse {
                    message: errors.summary(),
                    errors: &errors,
                };
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            ApiError::Core(err @ nd_core::Error::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::UnknownRoute => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Core(err) => {
                warn!(err = %err, "Unexpected request error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
