use crate::error::SourceError;
use crate::http::HttpClient;
use crate::nyt::{api_key, ApiDocument, DocsEnvelope};
use crate::rate_limit::RateLimiter;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use mise_core::CredentialSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const COOKING_QUERY: &str = "cooking OR recipe OR food";
pub const NEWS_QUERY: &str = "cooking news OR food news OR restaurant";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Relevance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Relevance => "relevance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Zero-based
    pub page: u32,
    pub sort: SortOrder,
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            begin_date: None,
            end_date: None,
            page: 0,
            sort: SortOrder::Newest,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn between(mut self, begin: NaiveDate, end: NaiveDate) -> Self {
        self.begin_date = Some(begin);
        self.end_date = Some(end);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub page: u32,
    pub docs: Vec<ApiDocument>,
}

/// Dates as the search endpoint expects them.
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `[now - days_back, now]` as calendar dates.
pub fn date_window(now: DateTime<Utc>, days_back: u32) -> (NaiveDate, NaiveDate) {
    let end = now.date_naive();
    let begin = (now - ChronoDuration::days(i64::from(days_back))).date_naive();
    (begin, end)
}

/// Client for the article search endpoint.
pub struct SearchClient {
    http: HttpClient,
    credentials: Arc<dyn CredentialSource>,
    api_base: String,
    limiter: RateLimiter,
}

impl SearchClient {
    pub fn new(http: HttpClient, credentials: Arc<dyn CredentialSource>, api_base: &str, api_delay: Duration) -> Self {
        Self {
            http,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(api_delay),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/search/v2/articlesearch.json", self.api_base)
    }

    /// One page of results. A missing key fails before any network I/O.
    /// Consecutive calls are spaced by the API delay.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError> {
        let key = api_key(&self.credentials)?;
        self.limiter.wait().await;

        let mut params = vec![
            ("api-key", key),
            ("q", query.query.clone()),
            ("page", query.page.to_string()),
            ("sort", query.sort.as_str().to_string()),
        ];
        if let Some(begin) = query.begin_date {
            params.push(("begin_date", format_api_date(begin)));
        }
        if let Some(end) = query.end_date {
            params.push(("end_date", format_api_date(end)));
        }

        let envelope: DocsEnvelope = self.http.get_json(&self.endpoint(), &params).await?;
        let docs = envelope.into_docs();
        debug!(page = query.page, docs = docs.len(), "Search page fetched");

        Ok(SearchPage { page: query.page, docs })
    }

    /// Newest cooking content across pages `0..max_pages`.
    ///
    /// Stops at the first empty page. An error on the first page is
    /// returned; a later error ends pagination with what was collected.
    #[instrument(skip(self))]
    pub async fn search_cooking_content(&self, max_pages: u32) -> Result<Vec<ApiDocument>, SourceError> {
        let mut docs = Vec::new();

        for page in 0..max_pages {
            let query = SearchQuery::new(COOKING_QUERY).page(page);
            match self.search(&query).await {
                Ok(result) if result.docs.is_empty() => {
                    debug!(page, "Empty page, stopping");
                    break;
                }
                Ok(result) => docs.extend(result.docs),
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Search failed, keeping earlier pages");
                    break;
                }
            }
        }

        info!(docs = docs.len(), "Search finished");
        Ok(docs)
    }

    /// Cooking and restaurant news from the last `days_back` days.
    #[instrument(skip(self))]
    pub async fn recent_cooking_news(&self, days_back: u32) -> Result<Vec<ApiDocument>, SourceError> {
        let (begin, end) = date_window(Utc::now(), days_back);
        let query = SearchQuery::new(NEWS_QUERY).between(begin, end);
        Ok(self.search(&query).await?.docs)
    }
}
