//! Page sessions the extractor drives.
//!
//! `HtmlSession` evaluates selectors against the static document fetched
//! over HTTP. With the `webdriver` feature, `WebDriverSession` drives a
//! headless Chrome instead, for listings that render client side.

use crate::error::SourceError;
use async_trait::async_trait;
use std::time::Duration;

mod html;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use html::{HtmlElement, HtmlSession, HtmlSessionFactory};
#[cfg(feature = "webdriver")]
pub use webdriver::{WebDriverSession, WebDriverSessionFactory};

pub type Element = Box<dyn PageElement>;

#[async_trait]
pub trait PageElement: Send + Sync {
    /// Visible text, whitespace collapsed.
    async fn text(&self) -> Result<String, SourceError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, SourceError>;

    /// Descendants matching `selector`, in document order.
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError>;

    /// Resolve once `selector` matches, or fail with `SourceError::Timeout`
    /// after `timeout`.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), SourceError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError>;

    async fn close(&mut self) -> Result<(), SourceError>;
}

/// Opens a fresh session for each acquisition pass.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SourceError>;
}
