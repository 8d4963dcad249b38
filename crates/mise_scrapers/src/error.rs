use thiserror::Error;

/// Failure of a single source client call. Every adapter returns these as
/// values; the orchestrator decides whether a source was skipped or failed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

impl SourceError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, SourceError::NotConfigured(_))
    }

    /// Failures worth a single retry: timeouts, connection errors,
    /// rate limiting and upstream 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Http(e) => e.is_timeout() || e.is_connect(),
            SourceError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            SourceError::Timeout(_) => true,
            _ => false,
        }
    }
}

impl From<SourceError> for mise_core::Error {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Http(e) => mise_core::Error::Http(e),
            other => mise_core::Error::Scraping(other.to_string()),
        }
    }
}
