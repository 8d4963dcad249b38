use crate::browser::{BrowserSession, PageElement, SessionFactory};
use crate::error::SourceError;
use crate::normalize::{article_from_guide, recipe_from_card, RawArticle, RawRecipe};
use crate::rate_limit::Politeness;
use crate::selectors::{FieldChain, Strategy};
use mise_core::{acquisition_time, Article, Recipe};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Where recipe cards and their fields live on a listing page.
#[derive(Debug, Clone)]
pub struct RecipeCardLayout {
    pub container: String,
    pub title: FieldChain,
    pub url: FieldChain,
    pub image_url: FieldChain,
    pub description: FieldChain,
    pub cooking_time: FieldChain,
    pub author: FieldChain,
    pub tags: FieldChain,
}

impl Default for RecipeCardLayout {
    fn default() -> Self {
        Self {
            container: "[data-testid='recipe-card']".to_string(),
            title: FieldChain::texts(&["[data-testid='recipe-title']", "h3", "h4"]),
            url: FieldChain::new(vec![Strategy::attr("a", "href")]),
            image_url: FieldChain::new(vec![Strategy::attr("img", "src"), Strategy::attr("img", "data-src")]),
            description: FieldChain::texts(&["[data-testid='recipe-description']", "p"]),
            cooking_time: FieldChain::texts(&["[data-testid='cooking-time']", ".cooking-time"]),
            author: FieldChain::texts(&["[data-testid='author']", ".author"]),
            tags: FieldChain::texts(&["[data-testid='tag']", ".tag", ".category"]),
        }
    }
}

/// Where guide and news containers live on the guides page.
#[derive(Debug, Clone)]
pub struct GuideLayout {
    /// Tried in order; the first selector with any match is used
    pub containers: Vec<String>,
    pub title: FieldChain,
    pub url: FieldChain,
    pub summary: FieldChain,
    pub image_url: FieldChain,
    pub category: FieldChain,
    pub author: FieldChain,
}

impl Default for GuideLayout {
    fn default() -> Self {
        Self {
            containers: vec![
                "article".to_string(),
                "[data-testid='article']".to_string(),
                ".article".to_string(),
            ],
            title: FieldChain::texts(&["[data-testid='article-title']", "h2", "h3"]),
            url: FieldChain::new(vec![Strategy::attr("a", "href")]),
            summary: FieldChain::texts(&["[data-testid='summary']", "p"]),
            image_url: FieldChain::new(vec![Strategy::attr("img", "src")]),
            category: FieldChain::texts(&["[data-testid='category']", ".category"]),
            author: FieldChain::texts(&["[data-testid='author']", ".author"]),
        }
    }
}

/// Scrapes recipe listings and guides from the cooking site through a
/// browser session.
pub struct PageExtractor {
    sessions: Arc<dyn SessionFactory>,
    base_url: Url,
    politeness: Politeness,
    recipes: RecipeCardLayout,
    guides: GuideLayout,
}

impl PageExtractor {
    pub fn new(sessions: Arc<dyn SessionFactory>, base_url: &str, politeness: Politeness) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::InvalidRequest(format!("Invalid site base URL '{}': {}", base_url, e)))?;

        Ok(Self {
            sessions,
            base_url,
            politeness,
            recipes: RecipeCardLayout::default(),
            guides: GuideLayout::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `/recipes` for the first page, `/recipes?page=N` after that.
    pub fn recipe_page_url(&self, page: u32) -> String {
        let root = self.base_url.as_str().trim_end_matches('/');
        if page <= 1 {
            format!("{}/recipes", root)
        } else {
            format!("{}/recipes?page={}", root, page)
        }
    }

    pub fn guides_url(&self) -> String {
        format!("{}/guides", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Raw cards from one listing page. Any page-level failure is logged
    /// and yields an empty page.
    pub async fn scrape_recipe_page(&self, session: &mut dyn BrowserSession, page: u32) -> Vec<RawRecipe> {
        let url = self.recipe_page_url(page);

        if let Err(e) = session.navigate(&url).await {
            warn!(page, url = %url, error = %e, "Failed to load recipe listing");
            return Vec::new();
        }
        sleep(self.politeness.page_settle).await;

        if let Err(e) = session
            .wait_for_selector(&self.recipes.container, self.politeness.element_timeout)
            .await
        {
            warn!(page, error = %e, "No recipe cards on page");
            return Vec::new();
        }

        let cards = match session.find_all(&self.recipes.container).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!(page, error = %e, "Failed to collect recipe cards");
                return Vec::new();
            }
        };

        let mut raw = Vec::with_capacity(cards.len());
        for card in &cards {
            raw.push(self.read_recipe_card(card.as_ref()).await);
        }
        debug!(page, cards = raw.len(), "Read recipe cards");
        raw
    }

    async fn read_recipe_card(&self, card: &dyn PageElement) -> RawRecipe {
        let layout = &self.recipes;
        RawRecipe {
            title: layout.title.first(card).await,
            url: layout.url.first(card).await,
            image_url: layout.image_url.first(card).await,
            description: layout.description.first(card).await,
            cooking_time: layout.cooking_time.first(card).await,
            author: layout.author.first(card).await,
            tags: layout.tags.all(card).await,
        }
    }

    async fn read_guide(&self, container: &dyn PageElement) -> RawArticle {
        let layout = &self.guides;
        RawArticle {
            title: layout.title.first(container).await,
            url: layout.url.first(container).await,
            summary: layout.summary.first(container).await,
            image_url: layout.image_url.first(container).await,
            category: layout.category.first(container).await,
            author: layout.author.first(container).await,
        }
    }

    /// Recipes from listing pages `1..=max_pages`, one session for the run.
    #[instrument(skip(self))]
    pub async fn scrape_recipes(&self, max_pages: u32) -> Result<Vec<Recipe>, SourceError> {
        let mut session = self.sessions.open().await?;
        let mut recipes = Vec::new();

        for page in 1..=max_pages {
            if page > 1 {
                sleep(self.politeness.page_delay).await;
            }
            let cards = self.scrape_recipe_page(session.as_mut(), page).await;
            let found = cards.len();
            let before = recipes.len();
            recipes.extend(
                cards
                    .into_iter()
                    .filter_map(|raw| recipe_from_card(raw, &self.base_url, acquisition_time())),
            );
            let kept = recipes.len() - before;
            if kept < found {
                debug!(page, dropped = found - kept, "Dropped cards without a URL");
            }
            info!(page, recipes = kept, "Scraped recipe page");
        }

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        Ok(recipes)
    }

    /// At most `max_articles` guides from the guides page.
    #[instrument(skip(self))]
    pub async fn scrape_guides(&self, max_articles: usize) -> Result<Vec<Article>, SourceError> {
        let mut session = self.sessions.open().await?;
        let articles = self.collect_guides(session.as_mut(), max_articles).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        info!(articles = articles.len(), "Scraped guides");
        Ok(articles)
    }

    async fn collect_guides(&self, session: &mut dyn BrowserSession, max_articles: usize) -> Vec<Article> {
        let url = self.guides_url();
        if let Err(e) = session.navigate(&url).await {
            warn!(url = %url, error = %e, "Failed to load guides page");
            return Vec::new();
        }
        sleep(self.politeness.page_settle).await;

        let mut containers = Vec::new();
        for selector in &self.guides.containers {
            match session.find_all(selector).await {
                Ok(found) if !found.is_empty() => {
                    containers = found;
                    break;
                }
                Ok(_) => {}
                Err(e) => debug!(selector = %selector, error = %e, "Container lookup failed"),
            }
        }

        let mut articles = Vec::new();
        for container in containers.iter().take(max_articles) {
            let raw = self.read_guide(container.as_ref()).await;
            if let Some(article) = article_from_guide(raw, &self.base_url, acquisition_time()) {
                articles.push(article);
            }
        }
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::HtmlSessionFactory;
    use crate::http::HttpClient;
    use crate::normalize::{UNTITLED_ARTICLE, UNTITLED_RECIPE};
    use std::time::Duration;

    const PAGE_ONE: &str = r#"
        <html><body>
          <div data-testid="recipe-card">
            <a href="/recipes/1-chicken"><img src="/img/chicken.jpg"></a>
            <h3 data-testid="recipe-title">Sheet-Pan Chicken</h3>
            <p>Crispy and quick.</p>
            <span data-testid="cooking-time">45 minutes</span>
            <span class="author">Melissa Clark</span>
            <span class="tag">Easy</span><span class="tag">Weeknight</span>
          </div>
          <div data-testid="recipe-card">
            <a href="https://cooking.example.com/recipes/2-untitled"></a>
          </div>
          <div data-testid="recipe-card">
            <h3>No Link Here</h3>
          </div>
        </body></html>
    "#;

    const PAGE_TWO: &str = r#"
        <html><body>
          <div data-testid="recipe-card">
            <a href="/recipes/3-soup"><img data-src="/img/soup.jpg"></a>
            <h4>Miso Soup</h4>
          </div>
        </body></html>
    "#;

    const GUIDES: &str = r#"
        <html><body>
          <article><a href="/guides/1-roasting"><h2>How to Roast</h2></a><p>Heat the oven.</p><span class="category">Techniques</span></article>
          <article><a href="/guides/2-baking"></a></article>
          <article><h2>No link</h2></article>
          <article><a href="/guides/4-grilling"><h2>Grilling</h2></a></article>
        </body></html>
    "#;

    fn extractor(server_url: &str) -> PageExtractor {
        let http = HttpClient::new("mise-test", Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        let sessions = Arc::new(HtmlSessionFactory::new(http));
        PageExtractor::new(sessions, server_url, Politeness::immediate()).unwrap()
    }

    #[test]
    fn test_recipe_page_urls() {
        let extractor = extractor("https://cooking.example.com/");
        assert_eq!(extractor.recipe_page_url(1), "https://cooking.example.com/recipes");
        assert_eq!(extractor.recipe_page_url(3), "https://cooking.example.com/recipes?page=3");
        assert_eq!(extractor.guides_url(), "https://cooking.example.com/guides");
    }

    #[tokio::test]
    async fn test_scrape_recipes_across_pages() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/recipes").with_body(PAGE_ONE).create_async().await;
        server.mock("GET", "/recipes?page=2").with_body(PAGE_TWO).create_async().await;

        let extractor = extractor(&server.url());
        let recipes = extractor.scrape_recipes(2).await.unwrap();

        assert_eq!(recipes.len(), 3);
        let chicken = &recipes[0];
        assert_eq!(chicken.title, "Sheet-Pan Chicken");
        assert_eq!(chicken.url, format!("{}/recipes/1-chicken", server.url()));
        assert_eq!(chicken.image_url, format!("{}/img/chicken.jpg", server.url()));
        assert_eq!(chicken.description, "Crispy and quick.");
        assert_eq!(chicken.cooking_time, "45 minutes");
        assert_eq!(chicken.author, "Melissa Clark");
        assert_eq!(chicken.tags, vec!["Easy", "Weeknight"]);

        assert_eq!(recipes[1].title, UNTITLED_RECIPE);
        assert_eq!(recipes[1].url, "https://cooking.example.com/recipes/2-untitled");

        assert_eq!(recipes[2].title, "Miso Soup");
        assert_eq!(recipes[2].image_url, format!("{}/img/soup.jpg", server.url()));
    }

    #[tokio::test]
    async fn test_failed_page_is_empty_and_loop_continues() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/recipes").with_status(500).create_async().await;
        server.mock("GET", "/recipes?page=2").with_body(PAGE_TWO).create_async().await;

        let recipes = extractor(&server.url()).scrape_recipes(2).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Miso Soup");
    }

    #[tokio::test]
    async fn test_page_without_cards_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/recipes").with_body("<html><body><p>Sign in</p></body></html>").create_async().await;

        let extractor = extractor(&server.url());
        let mut session = HtmlSessionFactory::new(HttpClient::new("mise-test", Duration::from_secs(5)).unwrap())
            .open()
            .await
            .unwrap();
        assert!(extractor.scrape_recipe_page(session.as_mut(), 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_guides_respects_max_articles() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/guides").with_body(GUIDES).create_async().await;

        let extractor = extractor(&server.url());
        let guides = extractor.scrape_guides(3).await.unwrap();

        // The third container has no link and is dropped; the fourth is past the cap.
        assert_eq!(guides.len(), 2);
        assert_eq!(guides[0].title, "How to Roast");
        assert_eq!(guides[0].summary, "Heat the oven.");
        assert_eq!(guides[0].category, "Techniques");
        assert_eq!(guides[1].title, UNTITLED_ARTICLE);
        assert_eq!(guides[1].category, "General");
    }

    struct BlankSession;

    #[async_trait::async_trait]
    impl BrowserSession for BlankSession {
        async fn navigate(&mut self, _url: &str) -> Result<(), SourceError> {
            Ok(())
        }

        async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<(), SourceError> {
            Err(SourceError::Timeout(format!("no match for {}", selector)))
        }

        async fn find_all(&self, _selector: &str) -> Result<Vec<crate::browser::Element>, SourceError> {
            Ok(Vec::new())
        }

        async fn close(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    struct BlankSessions;

    #[async_trait::async_trait]
    impl SessionFactory for BlankSessions {
        async fn open(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
            Ok(Box::new(BlankSession))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_runs_between_pages() {
        let politeness = Politeness {
            page_delay: Duration::from_secs(2),
            api_delay: Duration::ZERO,
            page_settle: Duration::from_secs(3),
            element_timeout: Duration::from_secs(1),
        };
        let extractor = PageExtractor::new(Arc::new(BlankSessions), "https://cooking.example.com", politeness).unwrap();

        let start = tokio::time::Instant::now();
        assert!(extractor.scrape_recipes(2).await.unwrap().is_empty());
        // settle + delay + settle
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9), "{:?}", elapsed);

        let start = tokio::time::Instant::now();
        extractor.scrape_recipes(1).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4), "{:?}", elapsed);
    }
}
