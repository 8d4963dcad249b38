use async_trait::async_trait;
use mise_core::{Article, Recipe, RecordStorage, Result, StorageStats};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

/// Records keyed by URL, so a second upsert of the same URL replaces the first.
#[derive(Default)]
pub struct MemoryStore {
    recipes: HashMap<String, Recipe>,
    articles: HashMap<String, Article>,
}

impl MemoryStore {
    pub fn upsert_recipe(&mut self, recipe: &Recipe) {
        self.recipes.insert(recipe.url.clone(), recipe.clone());
    }

    pub fn upsert_article(&mut self, article: &Article) {
        self.articles.insert(article.url.clone(), article.clone());
    }

    pub fn list_recipes(&self, limit: usize) -> Vec<Recipe> {
        let mut recipes = self.recipes.values().cloned().collect::<Vec<_>>();
        recipes.sort_by(|a, b| b.scraped_date.cmp(&a.scraped_date).then_with(|| a.url.cmp(&b.url)));
        recipes.truncate(limit);
        recipes
    }

    pub fn list_articles(&self, limit: usize) -> Vec<Article> {
        let mut articles = self.articles.values().cloned().collect::<Vec<_>>();
        articles.sort_by(|a, b| b.scraped_date.cmp(&a.scraped_date).then_with(|| a.url.cmp(&b.url)));
        articles.truncate(limit);
        articles
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            total_recipes: self.recipes.len() as u64,
            total_news: self.articles.len() as u64,
            latest_recipe_scrape: self.recipes.values().map(|r| r.scraped_date).max(),
            latest_news_scrape: self.articles.values().map(|a| a.scraped_date).max(),
        }
    }
}

pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_path: &Path) -> Result<Self> where Self: Sized {
        Ok(Self::new())
    }
}

#[async_trait]
impl RecordStorage for InMemoryStorage {
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<()> {
        let mut store = self.store.write().await;
        store.upsert_recipe(recipe);
        Ok(())
    }

    async fn upsert_article(&self, article: &Article) -> Result<()> {
        let mut store = self.store.write().await;
        store.upsert_article(article);
        Ok(())
    }

    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        let store = self.store.read().await;
        Ok(store.list_recipes(limit))
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles(limit))
    }

    async fn stats(&self) -> Result<StorageStats> {
        let store = self.store.read().await;
        Ok(store.stats())
    }
}
