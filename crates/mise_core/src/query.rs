//! Read-side filters over stored records.
//!
//! Every filter is a case-insensitive substring match. Filters that are
//! unset or blank match everything; set filters are combined with AND.

use serde::Deserialize;
use crate::types::{Article, Recipe};

/// How many stored records the read side pulls before filtering.
pub const FILTER_WINDOW: usize = 1000;
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub search: Option<String>,
    pub cuisine: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        matches_any(&self.search, &[&recipe.title, &recipe.description])
            && matches_any(&self.cuisine, &[&recipe.cuisine])
            && matches_any(&self.difficulty, &[&recipe.difficulty])
    }

    pub fn apply(&self, recipes: Vec<Recipe>, limit: usize) -> Vec<Recipe> {
        recipes.into_iter().filter(|r| self.matches(r)).take(limit).collect()
    }
}

impl ArticleFilter {
    pub fn matches(&self, article: &Article) -> bool {
        matches_any(&self.search, &[&article.title, &article.summary])
            && matches_any(&self.category, &[&article.category])
    }

    pub fn apply(&self, articles: Vec<Article>, limit: usize) -> Vec<Article> {
        articles.into_iter().filter(|a| self.matches(a)).take(limit).collect()
    }
}

fn matches_any(needle: &Option<String>, fields: &[&str]) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            fields.iter().any(|field| field.to_lowercase().contains(&needle))
        }
    }
}
