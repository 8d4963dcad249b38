use crate::error::SourceError;
use crate::http::HttpClient;
use serde::Serialize;
use tracing::{info, instrument};

pub const DEFAULT_SECTION: &str = "food";

/// Raw feed document. The body is kept opaque; items are not parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPayload {
    pub section: String,
    pub content: String,
    pub bytes: usize,
}

pub struct RssClient {
    http: HttpClient,
    rss_base: String,
}

impl RssClient {
    pub fn new(http: HttpClient, rss_base: &str) -> Self {
        Self {
            http,
            rss_base: rss_base.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_feed(&self, section: &str) -> Result<FeedPayload, SourceError> {
        let section = if section.trim().is_empty() { DEFAULT_SECTION } else { section.trim() };
        let url = format!("{}/{}.xml", self.rss_base, section);

        let content = self.http.get_text(&url, &[]).await?;
        info!(bytes = content.len(), "Feed fetched");

        Ok(FeedPayload {
            section: section.to_string(),
            bytes: content.len(),
            content,
        })
    }
}
