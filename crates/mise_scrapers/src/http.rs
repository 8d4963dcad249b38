use crate::error::SourceError;
use mise_core::Settings;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Shared HTTP client: explicit timeout, configured User-Agent, and one
/// retry on transient failures.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SourceError> {
        Self::new(&settings.user_agent, settings.request_timeout())
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// GET `url` with `query` appended and return the body as text.
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        match self.send_once(url, query).await {
            Ok(body) => Ok(body),
            Err(e) if e.is_transient() => {
                warn!(url, error = %e, "Transient failure, retrying once");
                sleep(self.retry_delay).await;
                self.send_once(url, query).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, SourceError> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode(format!("{}: {}", url, e)))
    }

    async fn send_once(&self, url: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        debug!(url, "GET");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The query may carry the API key, so only the bare url is reported.
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
