use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/recipes", get(handlers::list_recipes))
        .route("/api/news", get(handlers::list_news))
        .route("/api/stats", get(handlers::stats))
        .route("/api/scrape", post(handlers::scrape_web))
        .route("/api/scrape-nyt-api", post(handlers::scrape_api))
        .route("/api/scrape-all", post(handlers::scrape_all))
        .route("/api/acquire", post(handlers::acquire))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> mise_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "Serving web API");
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use mise_core::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use mise_core::{acquisition_time, Article, Recipe, RecordStorage, Settings, StaticCredentials, StorageStats};
    use mise_scrapers::browser::HtmlSessionFactory;
    use mise_scrapers::http::HttpClient;
    use mise_scrapers::{AcquisitionManager, PassQueue};
    use mise_storage::InMemoryStorage;
    use serde_json::Value;
    use tower::ServiceExt;

    fn recipe(url: &str, title: &str, description: &str) -> Recipe {
        Recipe {
            url: url.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            ingredients: String::new(),
            instructions: String::new(),
            cooking_time: String::new(),
            difficulty: String::new(),
            cuisine: String::new(),
            tags: vec![],
            image_url: String::new(),
            author: String::new(),
            published_date: String::new(),
            scraped_date: acquisition_time(),
        }
    }

    fn article(url: &str, title: &str, category: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            summary: String::new(),
            content: String::new(),
            author: String::new(),
            published_date: String::new(),
            category: category.to_string(),
            image_url: String::new(),
            scraped_date: acquisition_time(),
        }
    }

    fn app_with(storage: Arc<dyn RecordStorage>) -> Router {
        let settings = Settings {
            site_base_url: "http://127.0.0.1:9".to_string(),
            api_base_url: "http://127.0.0.1:9/svc".to_string(),
            rss_base_url: "http://127.0.0.1:9/rss".to_string(),
            request_timeout_secs: 1,
            ..Settings::default()
        };
        let http = HttpClient::from_settings(&settings).unwrap();
        let manager = AcquisitionManager::with_credentials(
            &settings,
            storage.clone(),
            Arc::new(StaticCredentials::new()),
            Arc::new(HtmlSessionFactory::new(http)),
        )
        .unwrap();
        let (queue, _worker) = PassQueue::start(Arc::new(manager));
        create_app(AppState::new(storage, queue))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_recipes_with_search_filter() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.upsert_recipe(&recipe("https://c.example.com/1", "Lemon Chicken", "")).await.unwrap();
        storage.upsert_recipe(&recipe("https://c.example.com/2", "Tofu Stir-Fry", "with lemon zest")).await.unwrap();
        storage.upsert_recipe(&recipe("https://c.example.com/3", "Beef Stew", "hearty")).await.unwrap();

        let (status, body) = send(app_with(storage), get("/api/recipes?search=LEMON")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        let titles = body["recipes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert!(titles.contains(&"Lemon Chicken".to_string()));
        assert!(titles.contains(&"Tofu Stir-Fry".to_string()));
    }

    #[tokio::test]
    async fn test_list_recipes_limit_and_empty_filters() {
        let storage = Arc::new(InMemoryStorage::new());
        for i in 0..5 {
            let mut r = recipe(&format!("https://c.example.com/{}", i), &format!("Recipe {}", i), "");
            r.scraped_date = r.scraped_date - Duration::minutes(i);
            storage.upsert_recipe(&r).await.unwrap();
        }

        let (_, body) = send(app_with(storage), get("/api/recipes?limit=2&cuisine=&difficulty=")).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["recipes"][0]["title"], "Recipe 0");
    }

    #[tokio::test]
    async fn test_list_news_by_category() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.upsert_article(&article("https://n.example.com/1", "Guide", "General")).await.unwrap();
        storage.upsert_article(&article("https://n.example.com/2", "Search hit", "cooking")).await.unwrap();

        let (status, body) = send(app_with(storage), get("/api/news?category=Cook")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["news"][0]["title"], "Search hit");
    }

    #[tokio::test]
    async fn test_stats_envelope() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.upsert_recipe(&recipe("https://c.example.com/1", "Soup", "")).await.unwrap();

        let (status, body) = send(app_with(storage), get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["stats"]["total_recipes"], 1);
        assert_eq!(body["stats"]["total_news"], 0);
        assert!(body["stats"]["latest_recipe_scrape"].is_string());
        assert!(body["stats"]["latest_news_scrape"].is_null());
    }

    #[tokio::test]
    async fn test_trigger_returns_pass_id() {
        let app = app_with(Arc::new(InMemoryStorage::new()));

        let (status, body) = send(app.clone(), post_json("/api/scrape-all", r#"{"max_pages": 1}"#)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["success"], true);
        assert!(body["pass_id"].as_str().map(|id| id.len() == 36).unwrap_or(false));

        let request = Request::builder().method("POST").uri("/api/scrape").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_acquire_with_explicit_options() {
        let app = app_with(Arc::new(InMemoryStorage::new()));
        let body = r#"{"include_search": false, "include_archive": false, "include_rss": false, "include_web": false}"#;
        let (status, body) = send(app, post_json("/api/acquire", body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["success"], true);
    }

    struct BrokenStorage;

    #[async_trait::async_trait]
    impl RecordStorage for BrokenStorage {
        async fn upsert_recipe(&self, _recipe: &Recipe) -> mise_core::Result<()> {
            Err(mise_core::Error::Database("unavailable".to_string()))
        }

        async fn upsert_article(&self, _article: &Article) -> mise_core::Result<()> {
            Err(mise_core::Error::Database("unavailable".to_string()))
        }

        async fn list_recipes(&self, _limit: usize) -> mise_core::Result<Vec<Recipe>> {
            Err(mise_core::Error::Database("unavailable".to_string()))
        }

        async fn list_articles(&self, _limit: usize) -> mise_core::Result<Vec<Article>> {
            Err(mise_core::Error::Database("unavailable".to_string()))
        }

        async fn stats(&self) -> mise_core::Result<StorageStats> {
            Err(mise_core::Error::Database("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_storage_error_is_500_envelope() {
        let app = app_with(Arc::new(BrokenStorage));
        for uri in ["/api/recipes", "/api/news", "/api/stats"] {
            let (status, body) = send(app.clone(), get(uri)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("unavailable"));
        }
    }
}
