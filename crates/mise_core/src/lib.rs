pub mod config;
pub mod credentials;
pub mod error;
pub mod query;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials, NYT_API_KEY};
pub use error::Error;
pub use storage::RecordStorage;
pub use types::{acquisition_time, Article, Recipe, RecordKind, StorageStats};
pub use query::{ArticleFilter, RecipeFilter, DEFAULT_LIMIT, FILTER_WINDOW};

pub type Result<T> = std::result::Result<T, Error>;
