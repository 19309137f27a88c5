use nd_core::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Could not reach the news server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Article not found")]
    NotFound,

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Malformed response: {0}")]
    Decode(String),
}
