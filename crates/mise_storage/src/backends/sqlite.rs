use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mise_core::{Article, Error, Recipe, RecordStorage, Result, StorageStats};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        ingredients TEXT NOT NULL,
        instructions TEXT NOT NULL,
        cooking_time TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        cuisine TEXT NOT NULL,
        tags TEXT NOT NULL,
        image_url TEXT NOT NULL,
        author TEXT NOT NULL,
        published_date TEXT NOT NULL,
        scraped_date TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cooking_news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        summary TEXT NOT NULL,
        content TEXT NOT NULL,
        author TEXT NOT NULL,
        published_date TEXT NOT NULL,
        category TEXT NOT NULL,
        image_url TEXT NOT NULL,
        scraped_date TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_recipes_scraped_date ON recipes (scraped_date)",
    "CREATE INDEX IF NOT EXISTS idx_cooking_news_scraped_date ON cooking_news (scraped_date)",
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured database_path (default ./cooking_data.db)"
    }

    async fn open(path: &Path) -> Result<Self> {
        Self::new_with_path(path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        tracing::info!(path = %db_path.display(), "SQLite storage ready");

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Fixed-width RFC 3339 so that text ordering in SQL matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date {:?}: {}", value, e)))
}

fn column(row: &SqliteRow, name: &str) -> Result<String> {
    row.try_get::<String, _>(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe> {
    let tags: Vec<String> = serde_json::from_str(&column(row, "tags")?)?;
    Ok(Recipe {
        url: column(row, "url")?,
        title: column(row, "title")?,
        description: column(row, "description")?,
        ingredients: column(row, "ingredients")?,
        instructions: column(row, "instructions")?,
        cooking_time: column(row, "cooking_time")?,
        difficulty: column(row, "difficulty")?,
        cuisine: column(row, "cuisine")?,
        tags,
        image_url: column(row, "image_url")?,
        author: column(row, "author")?,
        published_date: column(row, "published_date")?,
        scraped_date: parse_timestamp(&column(row, "scraped_date")?)?,
    })
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    Ok(Article {
        url: column(row, "url")?,
        title: column(row, "title")?,
        summary: column(row, "summary")?,
        content: column(row, "content")?,
        author: column(row, "author")?,
        published_date: column(row, "published_date")?,
        category: column(row, "category")?,
        image_url: column(row, "image_url")?,
        scraped_date: parse_timestamp(&column(row, "scraped_date")?)?,
    })
}

#[async_trait]
impl RecordStorage for SQLiteStorage {
    async fn upsert_recipe(&self, recipe: &Recipe) -> Result<()> {
        let tags = serde_json::to_string(&recipe.tags)?;

        sqlx::query(
            r#"
            INSERT INTO recipes
            (url, title, description, ingredients, instructions, cooking_time,
             difficulty, cuisine, tags, image_url, author, published_date, scraped_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                ingredients = excluded.ingredients,
                instructions = excluded.instructions,
                cooking_time = excluded.cooking_time,
                difficulty = excluded.difficulty,
                cuisine = excluded.cuisine,
                tags = excluded.tags,
                image_url = excluded.image_url,
                author = excluded.author,
                published_date = excluded.published_date,
                scraped_date = excluded.scraped_date
            "#,
        )
        .bind(&recipe.url)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.cooking_time)
        .bind(&recipe.difficulty)
        .bind(&recipe.cuisine)
        .bind(tags)
        .bind(&recipe.image_url)
        .bind(&recipe.author)
        .bind(&recipe.published_date)
        .bind(format_timestamp(&recipe.scraped_date))
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to store recipe {}: {}", recipe.url, e)))?;

        Ok(())
    }

    async fn upsert_article(&self, article: &Article) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cooking_news
            (url, title, summary, content, author, published_date, category, image_url, scraped_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                content = excluded.content,
                author = excluded.author,
                published_date = excluded.published_date,
                category = excluded.category,
                image_url = excluded.image_url,
                scraped_date = excluded.scraped_date
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(&article.author)
        .bind(&article.published_date)
        .bind(&article.category)
        .bind(&article.image_url)
        .bind(format_timestamp(&article.scraped_date))
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to store article {}: {}", article.url, e)))?;

        Ok(())
    }

    async fn list_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM recipes
            ORDER BY scraped_date DESC, url ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list recipes: {}", e)))?;

        rows.iter().map(recipe_from_row).collect()
    }

    async fn list_articles(&self, limit: usize) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM cooking_news
            ORDER BY scraped_date DESC, url ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list articles: {}", e)))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn stats(&self) -> Result<StorageStats> {
        let recipes = sqlx::query("SELECT COUNT(*) AS total, MAX(scraped_date) AS latest FROM recipes")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count recipes: {}", e)))?;
        let news = sqlx::query("SELECT COUNT(*) AS total, MAX(scraped_date) AS latest FROM cooking_news")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;

        let latest = |row: &SqliteRow| -> Result<Option<DateTime<Utc>>> {
            row.try_get::<Option<String>, _>("latest")
                .map_err(|e| Error::Database(e.to_string()))?
                .as_deref()
                .map(parse_timestamp)
                .transpose()
        };
        let total = |row: &SqliteRow| -> Result<u64> {
            row.try_get::<i64, _>("total")
                .map(|n| n as u64)
                .map_err(|e| Error::Database(e.to_string()))
        };

        Ok(StorageStats {
            total_recipes: total(&recipes)?,
            total_news: total(&news)?,
            latest_recipe_scrape: latest(&recipes)?,
            latest_news_scrape: latest(&news)?,
        })
    }
}
