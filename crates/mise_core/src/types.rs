use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recipe card as stored. `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Empty until a detail-page pass fills it.
    pub ingredients: String,
    /// Empty until a detail-page pass fills it.
    pub instructions: String,
    pub cooking_time: String,
    pub difficulty: String,
    pub cuisine: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub author: String,
    pub published_date: String,
    pub scraped_date: DateTime<Utc>,
}

/// A news article or cooking guide as stored. `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub published_date: String,
    pub category: String,
    pub image_url: String,
    pub scraped_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "recipes")]
    Recipe,
    #[serde(rename = "news")]
    Article,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Recipe => "recipes",
            RecordKind::Article => "news",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recipe" | "recipes" => Ok(RecordKind::Recipe),
            "article" | "articles" | "news" => Ok(RecordKind::Article),
            other => Err(format!("Unknown record kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_recipes: u64,
    pub total_news: u64,
    pub latest_recipe_scrape: Option<DateTime<Utc>>,
    pub latest_news_scrape: Option<DateTime<Utc>>,
}

/// Timestamp for a record produced now.
///
/// Truncated to microseconds, the precision every storage backend keeps,
/// so a stored record reads back equal to the one that was written.
pub fn acquisition_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
