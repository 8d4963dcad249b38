use crate::error::SourceError;
use crate::http::HttpClient;
use crate::nyt::{api_key, ApiDocument, DocsEnvelope};
use mise_core::CredentialSource;
use std::sync::Arc;
use tracing::{info, instrument};

/// A document is cooking-related when its headline or snippet mentions one of these.
pub const COOKING_KEYWORDS: [&str; 6] = ["cooking", "recipe", "food", "chef", "restaurant", "dining"];

pub fn is_cooking_related(doc: &ApiDocument) -> bool {
    let headline = doc.headline_text().to_lowercase();
    let snippet = doc.snippet_text().to_lowercase();
    COOKING_KEYWORDS
        .iter()
        .any(|keyword| headline.contains(keyword) || snippet.contains(keyword))
}

pub fn filter_cooking(docs: Vec<ApiDocument>) -> Vec<ApiDocument> {
    docs.into_iter().filter(is_cooking_related).collect()
}

/// Client for the monthly archive endpoint.
pub struct ArchiveClient {
    http: HttpClient,
    credentials: Arc<dyn CredentialSource>,
    api_base: String,
}

impl ArchiveClient {
    pub fn new(http: HttpClient, credentials: Arc<dyn CredentialSource>, api_base: &str) -> Self {
        Self {
            http,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Every document published in `year`/`month`, unfiltered.
    #[instrument(skip(self))]
    pub async fn archive(&self, year: i32, month: u32) -> Result<Vec<ApiDocument>, SourceError> {
        if !(1..=12).contains(&month) {
            return Err(SourceError::InvalidRequest(format!("month must be 1-12, got {}", month)));
        }
        let key = api_key(&self.credentials)?;

        let url = format!("{}/archive/v1/{}/{}.json", self.api_base, year, month);
        let envelope: DocsEnvelope = self.http.get_json(&url, &[("api-key", key)]).await?;
        let docs = envelope.into_docs();

        info!(docs = docs.len(), "Archive fetched");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nyt::Headline;
    use mise_core::StaticCredentials;
    use mockito::Matcher;
    use std::time::Duration;

    fn doc(headline: &str, snippet: &str) -> ApiDocument {
        ApiDocument {
            web_url: Some(format!("https://www.example.com/{}", headline.len())),
            headline: Some(Headline { main: Some(headline.to_string()) }),
            snippet: Some(snippet.to_string()),
            ..Default::default()
        }
    }

    fn client(server_url: &str) -> ArchiveClient {
        let http = HttpClient::new("mise-test", Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        let credentials = StaticCredentials::new().with(mise_core::NYT_API_KEY, "test-key-0123456789");
        ArchiveClient::new(http, Arc::new(credentials), server_url)
    }

    #[test]
    fn test_filter_cooking_keywords() {
        let docs = vec![
            doc("Senate Passes Budget", "Lawmakers voted late on Tuesday."),
            doc("A Weeknight Dinner", "This recipe comes together in 20 minutes."),
            doc("The CHEF Who Changed Brooklyn", ""),
            doc("Markets Rally", "Stocks rose."),
        ];

        let kept = filter_cooking(docs);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].headline_text(), "A Weeknight Dinner");
        assert_eq!(kept[1].headline_text(), "The CHEF Who Changed Brooklyn");
    }

    #[tokio::test]
    async fn test_invalid_month_rejected_before_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let client = client(&server.url());
        for month in [0, 13] {
            let err = client.archive(2024, month).await.unwrap_err();
            assert!(matches!(err, SourceError::InvalidRequest(_)));
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_archive_fetches_month() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/archive/v1/2024/9.json")
            .match_query(Matcher::UrlEncoded("api-key".into(), "test-key-0123456789".into()))
            .with_body(r#"{"response": {"docs": [{"web_url": "https://www.example.com/x", "snippet": "Markets"}]}}"#)
            .create_async()
            .await;

        let docs = client(&server.url()).archive(2024, 9).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(filter_cooking(docs).is_empty());
        mock.assert_async().await;
    }
}
