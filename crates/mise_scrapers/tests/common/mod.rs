#![allow(dead_code)]

use async_trait::async_trait;
use mise_scrapers::browser::{BrowserSession, Element, PageElement, SessionFactory};
use mise_scrapers::SourceError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-process element: fixed text, attributes, and canned children per selector.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    text: String,
    attributes: HashMap<String, String>,
    children: HashMap<String, Vec<FakeElement>>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.entry(selector.to_string()).or_default().push(child);
        self
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self.attributes.get(name).cloned())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        Ok(self
            .children
            .get(selector)
            .map(|found| found.iter().cloned().map(|e| Box::new(e) as Element).collect())
            .unwrap_or_default())
    }
}

/// Page url -> selector -> elements.
pub type FakeSite = HashMap<String, HashMap<String, Vec<FakeElement>>>;

pub struct FakeSession {
    site: Arc<FakeSite>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SourceError> {
        if !self.site.contains_key(url) {
            return Err(SourceError::Status { status: 404, url: url.to_string() });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> Result<(), SourceError> {
        if self.find_all(selector).await?.is_empty() {
            return Err(SourceError::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, SourceError> {
        let page = self
            .current
            .as_ref()
            .and_then(|url| self.site.get(url))
            .ok_or_else(|| SourceError::Browser("No page loaded".to_string()))?;
        Ok(page
            .get(selector)
            .map(|found| found.iter().cloned().map(|e| Box::new(e) as Element).collect())
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeSessionFactory {
    site: Arc<FakeSite>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeSessionFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            current: None,
            closed: self.closed.clone(),
        }))
    }
}

pub const SITE: &str = "https://cooking.example.com";

pub fn recipe_card(title: Option<&str>, href: Option<&str>) -> FakeElement {
    let mut card = FakeElement::new();
    if let Some(title) = title {
        card = card.with_child("[data-testid='recipe-title']", FakeElement::new().with_text(title));
    }
    if let Some(href) = href {
        card = card.with_child("a", FakeElement::new().with_attr("href", href));
    }
    card
}

pub fn guide(title: &str, href: &str) -> FakeElement {
    FakeElement::new()
        .with_child("h2", FakeElement::new().with_text(title))
        .with_child("a", FakeElement::new().with_attr("href", href))
        .with_child("p", FakeElement::new().with_text("A short guide."))
}

/// One recipe listing page plus a guides page.
pub fn cooking_site(cards: Vec<FakeElement>, guides: Vec<FakeElement>) -> FakeSite {
    let mut site = FakeSite::new();
    site.insert(
        format!("{}/recipes", SITE),
        HashMap::from([("[data-testid='recipe-card']".to_string(), cards)]),
    );
    site.insert(
        format!("{}/guides", SITE),
        HashMap::from([("article".to_string(), guides)]),
    );
    site
}
