use async_trait::async_trait;
use mise_core::{Error, RecordStorage, Result};
use std::path::Path;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn open(path: &Path) -> Result<Self> where Self: Sized;
}

/// Open the backend named by `kind` ("memory" or "sqlite").
pub async fn create_storage(kind: &str, path: &Path) -> Result<Arc<dyn RecordStorage>> {
    match kind.to_lowercase().as_str() {
        "memory" => {
            let storage = InMemoryStorage::open(path).await?;
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = SQLiteStorage::open(path).await.map_err(|e| {
                tracing::error!(error = %e, hint = SQLiteStorage::get_error_message(), "SQLite storage unavailable");
                e
            })?;
            Ok(Arc::new(storage))
        }
        other => Err(Error::Storage(format!("Unsupported storage backend: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}
