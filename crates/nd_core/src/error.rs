use thiserror::Error;

use crate::types::ArticleId;
use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Article {0} not found")]
    NotFound(ArticleId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}
