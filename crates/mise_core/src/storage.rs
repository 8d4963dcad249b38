use async_trait::async_trait;
use crate::types::{Article, Recipe, StorageStats};
use crate::Result;

#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Insert a recipe, or replace the stored one with the same URL
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<()>;

    /// Insert an article, or replace the stored one with the same URL
    async fn upsert_article(&self, article: &Article) -> Result<()>;

    /// Most recently scraped recipes first, at most `limit`
    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>>;

    /// Most recently scraped articles first, at most `limit`
    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>>;

    /// Record counts and latest scrape time per kind
    async fn stats(&self) -> Result<StorageStats>;
}
