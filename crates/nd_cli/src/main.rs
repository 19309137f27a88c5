use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use nd_client::catalog::fallback_articles;
use nd_client::{
    ArticleSubmission, CategoryFilter, ClientError, DisplayArticle, DisplayPatch, HttpNewsApi,
    ListingView, NewsApi, DEFAULT_API_URL,
};
use nd_core::validation::parse_date;
use nd_core::{Article, ArticleId, ArticleService, ArticleStore};
use nd_storage::StorageKind;
use nd_web::{AppState, ServerConfig, DEFAULT_BIND};
use std::net::SocketAddr;
use tracing::info;

mod logging;
mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "News catalog server and client", long_about = None)]
pub struct Cli {
    /// Base URL of the news API, used by the client commands
    #[arg(long, env = "ND_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "ND_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
        /// Storage backend: memory or sqlite
        #[arg(long, env = "ND_STORAGE", default_value = "memory")]
        storage: StorageKind,
        #[arg(long, env = "ND_DATABASE_URL", default_value = "sqlite:news.db")]
        database_url: String,
        /// Insert the bundled sample articles when the store is empty
        #[arg(long)]
        seed: bool,
    },
    /// Show the article list, optionally filtered by category
    List {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },
    /// Show one article
    Show { id: ArticleId },
    /// Create an article
    Create(CreateArgs),
    /// Change some fields of an article. An empty --image-url or --author clears it.
    Update {
        id: ArticleId,
        #[command(flatten)]
        fields: UpdateArgs,
    },
    /// Delete an article
    Delete { id: ArticleId },
    /// Post the bundled sample articles to the server
    Seed,
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    content: String,
    #[arg(long, default_value = "")]
    image_url: String,
    /// RFC 3339 timestamp or YYYY-MM-DD; defaults to now
    #[arg(long)]
    published_at: Option<String>,
    #[arg(long)]
    source: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    url: String,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    published_at: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    url: Option<String>,
}

fn published_at(raw: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    parse_date(raw).with_context(|| format!("Invalid --published-at: {}", raw))
}

impl CreateArgs {
    fn into_display(self) -> anyhow::Result<DisplayArticle> {
        let published_at = match self.published_at.as_deref() {
            Some(raw) => published_at(raw)?,
            None => chrono::Utc::now(),
        };
        Ok(DisplayArticle {
            id: String::new(),
            title: self.title,
            description: self.description,
            content: self.content,
            image_url: self.image_url,
            published_at,
            source: self.source,
            category: self.category,
            author: self.author,
            url: self.url,
        })
    }
}

impl UpdateArgs {
    fn into_patch(self) -> anyhow::Result<DisplayPatch> {
        Ok(DisplayPatch {
            title: self.title,
            description: self.description,
            content: self.content,
            image_url: self.image_url,
            published_at: self.published_at.as_deref().map(published_at).transpose()?,
            source: self.source,
            category: self.category,
            author: self.author,
            url: self.url,
        })
    }
}

/// Print per-field messages for validation failures, pass everything else on.
fn report(err: ClientError) -> anyhow::Error {
    if let ClientError::Validation(errors) = &err {
        eprintln!("The article was rejected:");
        eprint!("{}", render::validation_errors(errors));
    }
    err.into()
}

async fn serve(bind: SocketAddr, storage: StorageKind, database_url: &str, seed: bool) -> anyhow::Result<()> {
    let store = nd_storage::create_storage(storage, Some(database_url)).await?;
    let state = AppState::new(store.clone());

    if seed && store.count().await? == 0 {
        seed_service(&state.service).await?;
    }

    nd_web::serve(&ServerConfig { bind }, state).await
}

async fn seed_service(service: &ArticleService) -> anyhow::Result<()> {
    let articles = fallback_articles();
    for article in &articles {
        service.create(&ArticleSubmission::from(article).to_fields()).await?;
    }
    info!("🌱 Seeded {} sample articles", articles.len());
    Ok(())
}

/// Detail text for `nd show`. Only a failed request falls back to the
/// bundled articles, and then the notice is printed with it.
fn show_text(id: ArticleId, outcome: Result<Article, ClientError>) -> anyhow::Result<String> {
    let err = match outcome {
        Ok(article) => return Ok(render::detail(&DisplayArticle::from(&article))),
        Err(ClientError::NotFound) => bail!("Article {} not found", id),
        Err(err) => err,
    };

    let mut view = ListingView::new();
    view.resolve(Err(err));
    match (view.notice(), view.find(&id.to_string())) {
        (Some(notice), Some(article)) => Ok(format!("⚠️  {}\n\n{}", notice, render::detail(article))),
        _ => bail!("Article {} not found", id),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let api = HttpNewsApi::new(cli.api_url.clone());

    match cli.command {
        Commands::Serve { bind, storage, database_url, seed } => {
            serve(bind, storage, &database_url, seed).await?;
        }
        Commands::List { category } => {
            let mut view = ListingView::activate(&api).await;
            view.select_category(category);
            print!("{}", render::listing(&view));
        }
        Commands::Show { id } => print!("{}", show_text(id, api.get(id).await)?),
        Commands::Create(args) => {
            let display = args.into_display()?;
            let article = api.create(&ArticleSubmission::from(&display)).await.map_err(report)?;
            println!("Created article {}", article.id);
        }
        Commands::Update { id, fields } => {
            let patch = fields.into_patch()?;
            let article = api.update(id, &patch.to_fields()).await.map_err(report)?;
            println!("Updated article {}", article.id);
        }
        Commands::Delete { id } => {
            api.delete(id).await.map_err(report)?;
            println!("Deleted article {}", id);
        }
        Commands::Seed => {
            let articles = fallback_articles();
            for article in &articles {
                let created = api.create(&ArticleSubmission::from(article)).await.map_err(report)?;
                println!("Created article {}: {}", created.id, created.title);
            }
        }
    }

    Ok(())
}
