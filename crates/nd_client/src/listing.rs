use nd_core::{Article, Page};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::api::NewsApi;
use crate::catalog::fallback_articles;
use crate::error::ClientError;
use crate::transcode::DisplayArticle;

/// Where the working set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Fallback,
}

/// Non-blocking message shown next to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No response came back; the bundled articles are shown instead.
    ServerUnreachable(String),
    /// The server answered, but not with a usable page.
    ServerError(String),
}

impl Notice {
    pub fn from_error(err: &ClientError) -> Self {
        match err {
            ClientError::Transport(_) => Notice::ServerUnreachable(err.to_string()),
            _ => Notice::ServerError(err.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ServerUnreachable(reason) => {
                write!(f, "Could not reach the news server, showing sample articles ({})", reason)
            }
            Notice::ServerError(reason) => {
                write!(f, "The news server failed, showing sample articles ({})", reason)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Case-sensitive exact match on `category`.
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, article: &DisplayArticle) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => article.category == *category,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => CategoryFilter::All,
            other => CategoryFilter::Only(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
    Loading,
    Ready {
        articles: Vec<DisplayArticle>,
        origin: Origin,
        notice: Option<Notice>,
    },
}

/// What the list area shows for the current state and filter.
#[derive(Debug, PartialEq, Eq)]
pub enum Visible<'a> {
    Loading,
    Articles(Vec<&'a DisplayArticle>),
    /// Ready, but nothing in the selected category.
    Empty,
}

/// Category-filtered article list backed by a single fetch of the first page.
///
/// The view is `Loading` until that fetch resolves, then `Ready` for good.
/// Filtering happens over the in-memory working set and never fetches.
/// Dropping the future returned by [`ListingView::activate`] abandons the
/// fetch without touching any view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    state: ListingState,
    filter: CategoryFilter,
}

impl Default for ListingView {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingView {
    pub fn new() -> Self {
        Self {
            state: ListingState::Loading,
            filter: CategoryFilter::All,
        }
    }

    /// Create a view and resolve it with exactly one request for page 1.
    pub async fn activate<A: NewsApi + ?Sized>(api: &A) -> Self {
        let mut view = Self::new();
        let outcome = api.list(1).await;
        view.resolve(outcome);
        view
    }

    /// Apply the outcome of the first-page fetch. Only the first outcome
    /// counts; later ones are ignored and `false` is returned.
    pub fn resolve(&mut self, outcome: Result<Page<Article>, ClientError>) -> bool {
        if self.state != ListingState::Loading {
            return false;
        }
        self.state = match outcome {
            Ok(page) if !page.is_empty() => {
                debug!("Adopted {} of {} remote articles", page.data.len(), page.total);
                ListingState::Ready {
                    articles: page.data.iter().map(DisplayArticle::from).collect(),
                    origin: Origin::Remote,
                    notice: None,
                }
            }
            Ok(_) => {
                debug!("Server has no articles, using the bundled set");
                ListingState::Ready {
                    articles: fallback_articles(),
                    origin: Origin::Fallback,
                    notice: None,
                }
            }
            Err(err) => {
                warn!("⚠️ Failed to fetch articles, using the bundled set: {}", err);
                ListingState::Ready {
                    articles: fallback_articles(),
                    origin: Origin::Fallback,
                    notice: Some(Notice::from_error(&err)),
                }
            }
        };
        true
    }

    /// Change the category filter. Inert while loading.
    pub fn select_category(&mut self, filter: CategoryFilter) -> bool {
        if self.is_loading() {
            return false;
        }
        self.filter = filter;
        true
    }

    pub fn visible(&self) -> Visible<'_> {
        match &self.state {
            ListingState::Loading => Visible::Loading,
            ListingState::Ready { articles, .. } => {
                let matching: Vec<_> = articles.iter().filter(|a| self.filter.matches(a)).collect();
                if matching.is_empty() {
                    Visible::Empty
                } else {
                    Visible::Articles(matching)
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == ListingState::Loading
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn origin(&self) -> Option<Origin> {
        match &self.state {
            ListingState::Loading => None,
            ListingState::Ready { origin, .. } => Some(*origin),
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match &self.state {
            ListingState::Loading => None,
            ListingState::Ready { notice, .. } => notice.as_ref(),
        }
    }

    pub fn working_set(&self) -> &[DisplayArticle] {
        match &self.state {
            ListingState::Loading => &[],
            ListingState::Ready { articles, .. } => articles,
        }
    }

    /// Find an article in the working set by its display id.
    pub fn find(&self, id: &str) -> Option<&DisplayArticle> {
        self.working_set().iter().find(|a| a.id == id)
    }
}
