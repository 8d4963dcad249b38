use super::{BrowserSession, Element, PageElement, SessionFactory};
use crate::error::SourceError;
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn browser_error(e: WebDriverError) -> SourceError {
    SourceError::Browser(e.to_string())
}

struct WebDriverElement {
    inner: WebElement,
}

#[async_trait]
impl PageElement for WebDriverElement {
    async fn text(&self) -> Result<String, SourceError> {
        let text = self.inner.text().await.map_err(browser_error)?;
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, SourceError> {
        self.inner.attr(name).await.map_err(browser_error)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        let found = self.inner.find_all(By::Css(selector)).await.map_err(browser_error)?;
        Ok(found
            .into_iter()
            .map(|inner| Box::new(WebDriverElement { inner }) as Element)
            .collect())
    }
}

/// Headless Chrome driven over the WebDriver protocol.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
}

impl WebDriverSession {
    pub async fn connect(server_url: &str) -> Result<Self, SourceError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option(
            "args",
            vec![
                "--headless=new",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
            ],
        )
        .map_err(browser_error)?;

        let driver = WebDriver::new(server_url, caps).await.map_err(browser_error)?;
        debug!(server_url, "Connected to WebDriver");
        Ok(Self { driver: Some(driver) })
    }

    fn driver(&self) -> Result<&WebDriver, SourceError> {
        self.driver
            .as_ref()
            .ok_or_else(|| SourceError::Browser("Session already closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        self.driver()?.goto(url).await.map_err(browser_error)
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), SourceError> {
        self.driver()?
            .query(By::Css(selector))
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
            .map(|_| ())
            .map_err(|_| SourceError::Timeout(selector.to_string()))
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        let found = self.driver()?.find_all(By::Css(selector)).await.map_err(browser_error)?;
        Ok(found
            .into_iter()
            .map(|inner| Box::new(WebDriverElement { inner }) as Element)
            .collect())
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await.map_err(browser_error)?;
        }
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.driver.is_some() {
            warn!("WebDriver session dropped without close; the browser may linger");
        }
    }
}

pub struct WebDriverSessionFactory {
    server_url: String,
}

impl WebDriverSessionFactory {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl SessionFactory for WebDriverSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
        Ok(Box::new(WebDriverSession::connect(&self.server_url).await?))
    }
}
