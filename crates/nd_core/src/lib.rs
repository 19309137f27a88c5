pub mod error;
pub mod service;
pub mod storage;
pub mod types;
pub mod validation;

pub use error::Error;
pub use service::ArticleService;
pub use storage::ArticleStore;
pub use types::{Article, ArticleId, ArticlePatch, NewArticle, Page, PER_PAGE};
pub use validation::{Fields, ValidationErrors};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use super::{Article, ArticleId, ArticleService, ArticleStore, Error, Fields, Result};
}
