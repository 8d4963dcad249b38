use crate::archive::{filter_cooking, ArchiveClient};
use crate::browser::{HtmlSessionFactory, SessionFactory};
use crate::error::SourceError;
use crate::feed::{RssClient, DEFAULT_SECTION};
use crate::http::HttpClient;
use crate::logging::Logger;
use crate::normalize::article_from_document;
use crate::page::PageExtractor;
use crate::rate_limit::Politeness;
use crate::search_api::SearchClient;
use chrono::{DateTime, Datelike, Utc};
use mise_core::{acquisition_time, Article, CredentialSource, EnvCredentials, Recipe, RecordStorage, Settings, NYT_API_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const DEFAULT_MAX_PAGES: u32 = 3;
pub const DEFAULT_MAX_ARTICLES: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePeriod {
    pub year: i32,
    pub month: u32,
}

impl ArchivePeriod {
    pub fn current() -> Self {
        let now = Utc::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

/// Which sources one pass consults, and how much of each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireOptions {
    pub max_pages: u32,
    pub max_articles: usize,
    pub include_search: bool,
    pub include_archive: bool,
    pub include_rss: bool,
    pub include_web: bool,
    /// Archive month; the current month when unset
    pub archive_period: Option<ArchivePeriod>,
    pub rss_section: String,
    /// Also pull dated news from the last N days during the search step
    pub recent_days: Option<u32>,
}

impl AcquireOptions {
    /// Every source enabled.
    pub fn all() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_articles: DEFAULT_MAX_ARTICLES,
            include_search: true,
            include_archive: true,
            include_rss: true,
            include_web: true,
            archive_period: None,
            rss_section: DEFAULT_SECTION.to_string(),
            recent_days: None,
        }
    }

    /// Page scraping of recipes and guides only.
    pub fn web_only() -> Self {
        Self {
            include_search: false,
            include_archive: false,
            include_rss: false,
            ..Self::all()
        }
    }

    /// Search, archive and feed, no page scraping.
    pub fn api_only() -> Self {
        Self {
            include_web: false,
            ..Self::all()
        }
    }

    pub fn none() -> Self {
        Self {
            include_search: false,
            include_archive: false,
            include_rss: false,
            include_web: false,
            ..Self::all()
        }
    }
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Report keys, in the order sources run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ApiArticles,
    ArchiveArticles,
    RssNews,
    WebRecipes,
    WebNews,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ApiArticles => "api_articles",
            SourceKind::ArchiveArticles => "archive_articles",
            SourceKind::RssNews => "rss_news",
            SourceKind::WebRecipes => "web_recipes",
            SourceKind::WebNews => "web_news",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Completed { items: usize },
    FeedFetched { bytes: usize },
    Skipped { reason: String },
    Failed { error: String },
}

impl SourceOutcome {
    fn from_error(error: SourceError) -> Self {
        if error.is_not_configured() {
            SourceOutcome::Skipped { reason: error.to_string() }
        } else {
            SourceOutcome::Failed { error: error.to_string() }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per enabled source
    pub outcomes: BTreeMap<SourceKind, SourceOutcome>,
    pub persist_failures: usize,
}

impl AcquisitionReport {
    fn begin() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            outcomes: BTreeMap::new(),
            persist_failures: 0,
        }
    }

    /// Records persisted across completed sources.
    pub fn total_items(&self) -> usize {
        self.outcomes
            .values()
            .map(|outcome| match outcome {
                SourceOutcome::Completed { items } => *items,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, kind: SourceKind) -> Option<&SourceOutcome> {
        self.outcomes.get(&kind)
    }
}

/// Runs one acquisition pass over every enabled source and writes what it
/// finds to storage. A failing source never stops the others.
pub struct AcquisitionManager {
    storage: Arc<dyn RecordStorage>,
    search: SearchClient,
    archive: ArchiveClient,
    rss: RssClient,
    pages: PageExtractor,
    logger: Logger,
}

impl AcquisitionManager {
    pub fn new(
        storage: Arc<dyn RecordStorage>,
        search: SearchClient,
        archive: ArchiveClient,
        rss: RssClient,
        pages: PageExtractor,
    ) -> Self {
        Self {
            storage,
            search,
            archive,
            rss,
            pages,
            logger: Logger::new(),
        }
    }

    /// Wire every source from `settings`. Credentials come from the
    /// environment variable named by `credential_var`.
    pub fn from_settings(settings: &Settings, storage: Arc<dyn RecordStorage>) -> mise_core::Result<Self> {
        let http = HttpClient::from_settings(settings)?;
        let credentials: Arc<dyn CredentialSource> =
            Arc::new(EnvCredentials::new().with_alias(NYT_API_KEY, &settings.credential_var));
        let sessions = session_factory(settings, http.clone());
        Self::assemble(settings, storage, credentials, sessions, http)
    }

    pub fn with_credentials(
        settings: &Settings,
        storage: Arc<dyn RecordStorage>,
        credentials: Arc<dyn CredentialSource>,
        sessions: Arc<dyn SessionFactory>,
    ) -> mise_core::Result<Self> {
        let http = HttpClient::from_settings(settings)?;
        Self::assemble(settings, storage, credentials, sessions, http)
    }

    /// Every client shares `http` and its connection pool.
    fn assemble(
        settings: &Settings,
        storage: Arc<dyn RecordStorage>,
        credentials: Arc<dyn CredentialSource>,
        sessions: Arc<dyn SessionFactory>,
        http: HttpClient,
    ) -> mise_core::Result<Self> {
        let politeness = Politeness::from_settings(settings);

        let search = SearchClient::new(http.clone(), credentials.clone(), &settings.api_base_url, politeness.api_delay);
        let archive = ArchiveClient::new(http.clone(), credentials, &settings.api_base_url);
        let rss = RssClient::new(http, &settings.rss_base_url);
        let pages = PageExtractor::new(sessions, &settings.site_base_url, politeness)?;

        Ok(Self::new(storage, search, archive, rss, pages))
    }

    pub fn storage(&self) -> Arc<dyn RecordStorage> {
        self.storage.clone()
    }

    /// Search API, archive, feed, recipe pages, guides; in that order.
    #[instrument(skip_all)]
    pub async fn acquire_all(&self, options: &AcquireOptions) -> AcquisitionReport {
        let mut report = AcquisitionReport::begin();

        if options.include_search {
            let outcome = self.acquire_search(options, &mut report.persist_failures).await;
            report.outcomes.insert(SourceKind::ApiArticles, outcome);
        }
        if options.include_archive {
            let period = options.archive_period.unwrap_or_else(ArchivePeriod::current);
            let outcome = self.acquire_archive(period, &mut report.persist_failures).await;
            report.outcomes.insert(SourceKind::ArchiveArticles, outcome);
        }
        if options.include_rss {
            let outcome = self.acquire_feed(&options.rss_section).await;
            report.outcomes.insert(SourceKind::RssNews, outcome);
        }
        if options.include_web {
            let outcome = self.acquire_web_recipes(options.max_pages, &mut report.persist_failures).await;
            report.outcomes.insert(SourceKind::WebRecipes, outcome);

            let outcome = self.acquire_web_news(options.max_articles, &mut report.persist_failures).await;
            report.outcomes.insert(SourceKind::WebNews, outcome);
        }

        report.finished_at = Utc::now();
        info!(
            items = report.total_items(),
            sources = report.outcomes.len(),
            persist_failures = report.persist_failures,
            "Acquisition pass finished"
        );
        report
    }

    async fn acquire_search(&self, options: &AcquireOptions, failures: &mut usize) -> SourceOutcome {
        let log = self.logger.clone().with_new_prefixes("[search]");

        let mut docs = match self.search.search_cooking_content(options.max_pages).await {
            Ok(docs) => docs,
            Err(e) => {
                log.warn(&format!("source unavailable: {}", e));
                return SourceOutcome::from_error(e);
            }
        };

        if let Some(days) = options.recent_days {
            match self.search.recent_cooking_news(days).await {
                Ok(recent) => docs.extend(recent),
                Err(e) => log.warn(&format!("recent news unavailable: {}", e)),
            }
        }

        let articles = docs
            .iter()
            .filter_map(|doc| article_from_document(doc, acquisition_time()))
            .collect::<Vec<_>>();
        let items = self.persist_articles(&articles, failures).await;
        log.info(&format!("saved {} of {} documents", items, docs.len()));
        SourceOutcome::Completed { items }
    }

    async fn acquire_archive(&self, period: ArchivePeriod, failures: &mut usize) -> SourceOutcome {
        let log = self
            .logger
            .clone()
            .with_new_prefixes("[archive]")
            .with_prefix(format!("[{}/{}]", period.year, period.month));

        let docs = match self.archive.archive(period.year, period.month).await {
            Ok(docs) => docs,
            Err(e) => {
                log.warn(&format!("source unavailable: {}", e));
                return SourceOutcome::from_error(e);
            }
        };

        let total = docs.len();
        let articles = filter_cooking(docs)
            .iter()
            .filter_map(|doc| article_from_document(doc, acquisition_time()))
            .collect::<Vec<_>>();
        let items = self.persist_articles(&articles, failures).await;
        log.info(&format!("saved {} cooking articles out of {}", items, total));
        SourceOutcome::Completed { items }
    }

    async fn acquire_feed(&self, section: &str) -> SourceOutcome {
        let log = self.logger.clone().with_new_prefixes("[rss]");
        match self.rss.fetch_feed(section).await {
            Ok(payload) => {
                log.info(&format!("fetched {} bytes from '{}'", payload.bytes, payload.section));
                SourceOutcome::FeedFetched { bytes: payload.bytes }
            }
            Err(e) => {
                log.warn(&format!("feed unavailable: {}", e));
                SourceOutcome::from_error(e)
            }
        }
    }

    async fn acquire_web_recipes(&self, max_pages: u32, failures: &mut usize) -> SourceOutcome {
        let log = self.logger.clone().with_new_prefixes("[web recipes]");
        match self.pages.scrape_recipes(max_pages).await {
            Ok(recipes) => {
                let items = self.persist_recipes(&recipes, failures).await;
                log.info(&format!("saved {} recipes", items));
                SourceOutcome::Completed { items }
            }
            Err(e) => {
                log.error(&format!("scrape failed: {}", e));
                SourceOutcome::from_error(e)
            }
        }
    }

    async fn acquire_web_news(&self, max_articles: usize, failures: &mut usize) -> SourceOutcome {
        let log = self.logger.clone().with_new_prefixes("[web news]");
        match self.pages.scrape_guides(max_articles).await {
            Ok(articles) => {
                let items = self.persist_articles(&articles, failures).await;
                log.info(&format!("saved {} guides", items));
                SourceOutcome::Completed { items }
            }
            Err(e) => {
                log.error(&format!("scrape failed: {}", e));
                SourceOutcome::from_error(e)
            }
        }
    }

    async fn persist_recipes(&self, recipes: &[Recipe], failures: &mut usize) -> usize {
        let mut saved = 0;
        for recipe in recipes {
            match self.storage.upsert_recipe(recipe).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    *failures += 1;
                    warn!(url = %recipe.url, error = %e, "Failed to save recipe");
                }
            }
        }
        saved
    }

    async fn persist_articles(&self, articles: &[Article], failures: &mut usize) -> usize {
        let mut saved = 0;
        for article in articles {
            match self.storage.upsert_article(article).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    *failures += 1;
                    warn!(url = %article.url, error = %e, "Failed to save article");
                }
            }
        }
        saved
    }
}

/// Static HTML sessions by default; WebDriver when built with the
/// `webdriver` feature and an endpoint is configured.
pub fn session_factory(settings: &Settings, http: HttpClient) -> Arc<dyn SessionFactory> {
    #[cfg(feature = "webdriver")]
    {
        if let Some(url) = settings.webdriver_url.as_deref() {
            return Arc::new(crate::browser::WebDriverSessionFactory::new(url));
        }
    }
    #[cfg(not(feature = "webdriver"))]
    {
        if settings.webdriver_url.is_some() {
            warn!("webdriver_url is set but the webdriver feature is not enabled; using static HTML sessions");
        }
    }
    Arc::new(HtmlSessionFactory::new(http))
}
