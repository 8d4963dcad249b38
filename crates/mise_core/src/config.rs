use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::credentials::NYT_API_KEY;
use crate::Result;

/// Runtime settings for acquisition, storage and the web surface.
///
/// Loaded from an optional `mise.toml` and then from `MISE_*` environment
/// variables (`MISE_DATABASE_PATH`, `MISE_PAGE_DELAY_SECS`, ...). Every
/// field has a default, so an empty environment yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Storage backend: "sqlite" or "memory"
    pub storage: String,
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub site_base_url: String,
    pub api_base_url: String,
    pub rss_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub page_settle_secs: u64,
    pub page_delay_secs: u64,
    pub api_delay_secs: u64,
    /// Environment variable holding the NYT API key
    pub credential_var: String,
    /// WebDriver endpoint, used when built with the `webdriver` feature
    pub webdriver_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: "sqlite".to_string(),
            database_path: PathBuf::from("cooking_data.db"),
            bind_addr: "127.0.0.1:8080".to_string(),
            site_base_url: "https://cooking.nytimes.com".to_string(),
            api_base_url: "https://api.nytimes.com/svc".to_string(),
            rss_base_url: "https://rss.nytimes.com/services/xml/rss/nyt".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            request_timeout_secs: 30,
            element_timeout_secs: 10,
            page_settle_secs: 3,
            page_delay_secs: 2,
            api_delay_secs: 1,
            credential_var: NYT_API_KEY.to_string(),
            webdriver_url: None,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise `mise.toml`
    /// in the working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("mise").required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("MISE").try_parsing(true))
            .build()?
            .try_deserialize::<Settings>()?;

        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_secs(self.page_settle_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    pub fn api_delay(&self) -> Duration {
        Duration::from_secs(self.api_delay_secs)
    }
}
