use crate::nyt::ApiDocument;
use chrono::{DateTime, Utc};
use mise_core::{Article, Recipe};
use url::Url;

pub const UNTITLED_RECIPE: &str = "Untitled Recipe";
pub const UNTITLED_ARTICLE: &str = "Untitled Article";
pub const GUIDE_CATEGORY: &str = "General";
pub const API_CATEGORY: &str = "cooking";

/// Fields read from a recipe card. Anything the selectors missed is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecipe {
    pub title: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub cooking_time: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
}

/// Fields read from a guide or news container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
}

/// Absolute form of `href`, resolved against `base` when relative.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// Build a `Recipe` from a card. Cards without a usable URL are dropped.
pub fn recipe_from_card(raw: RawRecipe, base: &Url, scraped_date: DateTime<Utc>) -> Option<Recipe> {
    let url = resolve_url(base, raw.url.as_deref()?)?;

    Some(Recipe {
        url,
        title: raw.title.unwrap_or_else(|| UNTITLED_RECIPE.to_string()),
        description: raw.description.unwrap_or_default(),
        ingredients: String::new(),
        instructions: String::new(),
        cooking_time: raw.cooking_time.unwrap_or_default(),
        difficulty: String::new(),
        cuisine: String::new(),
        tags: raw.tags,
        image_url: raw
            .image_url
            .and_then(|src| resolve_url(base, &src))
            .unwrap_or_default(),
        author: raw.author.unwrap_or_default(),
        published_date: String::new(),
        scraped_date,
    })
}

/// Build an `Article` from a guide container. The listing only carries a
/// summary, so it doubles as the content.
pub fn article_from_guide(raw: RawArticle, base: &Url, scraped_date: DateTime<Utc>) -> Option<Article> {
    let url = resolve_url(base, raw.url.as_deref()?)?;
    let summary = raw.summary.unwrap_or_default();

    Some(Article {
        url,
        title: raw.title.unwrap_or_else(|| UNTITLED_ARTICLE.to_string()),
        content: summary.clone(),
        summary,
        author: raw.author.unwrap_or_default(),
        published_date: String::new(),
        category: raw.category.unwrap_or_else(|| GUIDE_CATEGORY.to_string()),
        image_url: raw
            .image_url
            .and_then(|src| resolve_url(base, &src))
            .unwrap_or_default(),
        scraped_date,
    })
}

/// Build an `Article` from a search or archive document. Documents without
/// a `web_url` are dropped.
pub fn article_from_document(doc: &ApiDocument, scraped_date: DateTime<Utc>) -> Option<Article> {
    let url = doc.web_url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;

    let author = doc
        .byline
        .as_ref()
        .map(|byline| {
            byline
                .person
                .iter()
                .map(|p| p.display_name())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    Some(Article {
        url: url.to_string(),
        title: doc.headline_text().to_string(),
        summary: doc.snippet_text().to_string(),
        content: doc.lead_paragraph.clone().unwrap_or_default(),
        author,
        published_date: doc.pub_date.clone().unwrap_or_default(),
        category: API_CATEGORY.to_string(),
        image_url: String::new(),
        scraped_date,
    })
}
