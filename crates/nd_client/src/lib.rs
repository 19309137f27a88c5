pub mod api;
pub mod catalog;
pub mod error;
pub mod listing;
pub mod transcode;

pub use api::{HttpNewsApi, NewsApi, DEFAULT_API_URL};
pub use error::ClientError;
pub use listing::{CategoryFilter, ListingView, Notice, Origin, Visible};
pub use transcode::{ArticleSubmission, DisplayArticle, DisplayPatch};

pub mod prelude {
    pub use super::{
        CategoryFilter, ClientError, DisplayArticle, HttpNewsApi, ListingView, NewsApi, Visible,
    };
}
