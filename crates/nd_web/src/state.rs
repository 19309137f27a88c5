use nd_core::{ArticleService, ArticleStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: ArticleService,
}

impl AppState {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self {
            service: ArticleService::new(store),
        }
    }
}
