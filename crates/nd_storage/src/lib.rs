use async_trait::async_trait;
use nd_core::{ArticleStore, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStore + Sized + 'static {
    fn get_error_message() -> &'static str;
    async fn connect(url: Option<&str>) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown storage backend: {0}")]
pub struct UnknownStorage(String);

impl FromStr for StorageKind {
    type Err = UnknownStorage;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(Self::Sqlite),
            other => Err(UnknownStorage(other.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            #[cfg(feature = "sqlite")]
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

async fn connect<T: StorageBackend>(url: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    let storage = T::connect(url).await.map_err(|e| {
        nd_core::Error::Storage(format!("{} ({})", T::get_error_message(), e))
    })?;
    Ok(Arc::new(storage))
}

/// Open the configured backend. `url` is only consulted by backends that need one.
pub async fn create_storage(kind: StorageKind, url: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    let storage = match kind {
        StorageKind::Memory => connect::<InMemoryStorage>(url).await?,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => connect::<SQLiteStorage>(url).await?,
    };
    info!("🏦 Storage backend initialized (using {})", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::{create_storage, StorageBackend, StorageKind};
    pub use super::backends::*;
}
