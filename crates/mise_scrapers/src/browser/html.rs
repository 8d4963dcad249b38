use super::{BrowserSession, Element, PageElement, SessionFactory};
use crate::error::SourceError;
use crate::http::HttpClient;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

fn parse_selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Browser(format!("Invalid selector '{}': {:?}", css, e)))
}

/// A matched element, detached from the parsed document so it can be held
/// across await points.
#[derive(Debug, Clone)]
pub struct HtmlElement {
    text: String,
    attributes: HashMap<String, String>,
    outer_html: String,
}

impl HtmlElement {
    fn capture(element: ElementRef<'_>) -> Self {
        let text = element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
        let attributes = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self {
            text,
            attributes,
            outer_html: element.html(),
        }
    }

    fn select_descendants(&self, selector: &Selector) -> Vec<HtmlElement> {
        let fragment = Html::parse_fragment(&self.outer_html);
        let Some(own) = fragment.root_element().children().find_map(ElementRef::wrap) else {
            return Vec::new();
        };
        own.select(selector).map(HtmlElement::capture).collect()
    }
}

#[async_trait]
impl PageElement for HtmlElement {
    async fn text(&self) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self.attributes.get(name).cloned())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .select_descendants(&selector)
            .into_iter()
            .map(|e| Box::new(e) as Element)
            .collect())
    }
}

/// Static-document session: fetches pages over HTTP and queries them with
/// CSS selectors. Nothing renders, so a selector either matches right away
/// or never does.
pub struct HtmlSession {
    http: HttpClient,
    current_url: Option<String>,
    document: Option<String>,
}

impl HtmlSession {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            current_url: None,
            document: None,
        }
    }

    /// Session over an already-loaded document.
    pub fn from_document(http: HttpClient, url: &str, document: &str) -> Self {
        Self {
            http,
            current_url: Some(url.to_string()),
            document: Some(document.to_string()),
        }
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    fn select(&self, selector: &Selector) -> Result<Vec<HtmlElement>, SourceError> {
        let document = self
            .document
            .as_deref()
            .ok_or_else(|| SourceError::Browser("No page loaded".to_string()))?;
        let html = Html::parse_document(document);
        Ok(html.select(selector).map(HtmlElement::capture).collect())
    }
}

#[async_trait]
impl BrowserSession for HtmlSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        self.document = None;
        let body = self.http.get_text(url, &[]).await?;
        debug!(url, bytes = body.len(), "Loaded page");
        self.current_url = Some(url.to_string());
        self.document = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<(), SourceError> {
        let parsed = parse_selector(selector)?;
        if self.select(&parsed)?.is_empty() {
            return Err(SourceError::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        let selector = parse_selector(selector)?;
        Ok(self
            .select(&selector)?
            .into_iter()
            .map(|e| Box::new(e) as Element)
            .collect())
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.document = None;
        self.current_url = None;
        Ok(())
    }
}

#[derive(Clone)]
pub struct HtmlSessionFactory {
    http: HttpClient,
}

impl HtmlSessionFactory {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SessionFactory for HtmlSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
        Ok(Box::new(HtmlSession::new(self.http.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div data-testid="recipe-card">
            <h3>  Sheet-Pan   Chicken </h3>
            <a href="/recipes/1-chicken">link</a>
            <span class="tag">Easy</span><span class="tag">Dinner</span>
          </div>
          <div data-testid="recipe-card"><h4>Soup</h4></div>
        </body></html>
    "#;

    fn session() -> HtmlSession {
        let http = HttpClient::new("mise-test", Duration::from_secs(1)).unwrap();
        HtmlSession::from_document(http, "https://cooking.example.com/recipes", PAGE)
    }

    #[tokio::test]
    async fn test_find_all_and_nested_lookup() {
        let session = session();
        let cards = session.find_all("[data-testid='recipe-card']").await.unwrap();
        assert_eq!(cards.len(), 2);

        let titles = cards[0].find_all("h3").await.unwrap();
        assert_eq!(titles[0].text().await.unwrap(), "Sheet-Pan Chicken");

        let links = cards[0].find_all("a").await.unwrap();
        assert_eq!(links[0].attribute("href").await.unwrap().as_deref(), Some("/recipes/1-chicken"));

        let tags = cards[0].find_all(".tag").await.unwrap();
        assert_eq!(tags.len(), 2);
        assert!(cards[1].find_all("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_lookup_excludes_self() {
        let session = session();
        let cards = session.find_all("div").await.unwrap();
        assert!(cards[0].find_all("div").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_missing_selector_times_out() {
        let mut session = session();
        assert!(session.wait_for_selector("h3", Duration::from_secs(1)).await.is_ok());
        let err = session.wait_for_selector("article", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_find_without_page_is_error() {
        let http = HttpClient::new("mise-test", Duration::from_secs(1)).unwrap();
        let session = HtmlSession::new(http);
        assert!(session.find_all("div").await.is_err());
    }
}
