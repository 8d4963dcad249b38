use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mise_core::{ArticleFilter, RecipeFilter, DEFAULT_LIMIT, FILTER_WINDOW};
use mise_scrapers::{AcquireOptions, PassTicket};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use crate::AppState;

/// Any failure below the handler, reported as `500 {success: false, error}`.
pub struct ApiError(mise_core::Error);

impl From<mise_core::Error> for ApiError {
    fn from(e: mise_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");
        let body = json!({ "success": false, "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

/// Optional body of the trigger routes. Missing fields keep the preset's value.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    pub max_pages: Option<u32>,
    pub max_articles: Option<usize>,
    pub include_archive: Option<bool>,
    pub include_rss: Option<bool>,
}

impl TriggerRequest {
    fn apply(self, mut options: AcquireOptions) -> AcquireOptions {
        if let Some(max_pages) = self.max_pages {
            options.max_pages = max_pages;
        }
        if let Some(max_articles) = self.max_articles {
            options.max_articles = max_articles;
        }
        // The toggles only narrow API sources that the preset already enables.
        if let Some(include_archive) = self.include_archive {
            options.include_archive &= include_archive;
        }
        if let Some(include_rss) = self.include_rss {
            options.include_rss &= include_rss;
        }
        options
    }
}

fn accepted(ticket: PassTicket, message: &str) -> Response {
    let body = json!({
        "success": true,
        "message": message,
        "pass_id": ticket.pass_id,
    });
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

fn submit(state: &AppState, options: AcquireOptions, message: &str) -> ApiResult {
    let ticket = state.queue.submit(options)?;
    Ok(accepted(ticket, message))
}

fn request_body(body: Option<Json<TriggerRequest>>) -> TriggerRequest {
    body.map(|Json(request)| request).unwrap_or_default()
}

pub async fn scrape_web(
    State(state): State<Arc<AppState>>,
    body: Option<Json<TriggerRequest>>,
) -> ApiResult {
    let options = request_body(body).apply(AcquireOptions::web_only());
    submit(&state, options, "Page scraping started in background")
}

pub async fn scrape_api(
    State(state): State<Arc<AppState>>,
    body: Option<Json<TriggerRequest>>,
) -> ApiResult {
    let options = request_body(body).apply(AcquireOptions::api_only());
    submit(&state, options, "NYT API acquisition started in background")
}

pub async fn scrape_all(
    State(state): State<Arc<AppState>>,
    body: Option<Json<TriggerRequest>>,
) -> ApiResult {
    let options = request_body(body).apply(AcquireOptions::all());
    submit(&state, options, "Acquisition from all sources started in background")
}

pub async fn acquire(
    State(state): State<Arc<AppState>>,
    Json(options): Json<AcquireOptions>,
) -> ApiResult {
    submit(&state, options, "Acquisition started in background")
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub cuisine: Option<String>,
    pub difficulty: Option<String>,
}

pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecipeQuery>,
) -> ApiResult {
    let filter = RecipeFilter {
        search: query.search,
        cuisine: query.cuisine,
        difficulty: query.difficulty,
    };
    let recipes = state.storage.list_recipes(FILTER_WINDOW).await?;
    let recipes = filter.apply(recipes, query.limit.unwrap_or(DEFAULT_LIMIT));

    let body = json!({ "success": true, "count": recipes.len(), "recipes": recipes });
    Ok(Json(body).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub category: Option<String>,
}

pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> ApiResult {
    let filter = ArticleFilter {
        search: query.search,
        category: query.category,
    };
    let news = state.storage.list_articles(FILTER_WINDOW).await?;
    let news = filter.apply(news, query.limit.unwrap_or(DEFAULT_LIMIT));

    let body = json!({ "success": true, "count": news.len(), "news": news });
    Ok(Json(body).into_response())
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state.storage.stats().await?;
    let body: Value = json!({ "success": true, "stats": stats });
    Ok(Json(body).into_response())
}
