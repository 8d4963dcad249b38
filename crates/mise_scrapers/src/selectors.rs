use crate::browser::PageElement;
use tracing::debug;

/// One way of reading a field out of an item container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Text of the first element matching the selector
    Text(String),
    /// Attribute of the first element matching the selector
    Attr(String, String),
}

impl Strategy {
    pub fn text(css: &str) -> Self {
        Strategy::Text(css.to_string())
    }

    pub fn attr(css: &str, attribute: &str) -> Self {
        Strategy::Attr(css.to_string(), attribute.to_string())
    }

    fn css(&self) -> &str {
        match self {
            Strategy::Text(css) | Strategy::Attr(css, _) => css,
        }
    }

    /// Non-empty values of every matching element, in document order.
    /// A lookup error counts as no match.
    async fn values(&self, scope: &dyn PageElement) -> Vec<String> {
        let elements = match scope.find_all(self.css()).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!(selector = self.css(), error = %e, "Selector lookup failed");
                return Vec::new();
            }
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            let value = match self {
                Strategy::Text(_) => element.text().await.ok(),
                Strategy::Attr(_, attribute) => element.attribute(attribute).await.ok().flatten(),
            };
            if let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                values.push(value);
            }
        }
        values
    }
}

/// Ordered fallbacks for one field. The first strategy that yields a value wins.
#[derive(Debug, Clone, Default)]
pub struct FieldChain(Vec<Strategy>);

impl FieldChain {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self(strategies)
    }

    /// Chain of text strategies over `selectors`.
    pub fn texts(selectors: &[&str]) -> Self {
        Self(selectors.iter().map(|css| Strategy::text(css)).collect())
    }

    /// First value found, or `None` when no strategy matches.
    pub async fn first(&self, scope: &dyn PageElement) -> Option<String> {
        for strategy in &self.0 {
            if let Some(value) = strategy.values(scope).await.into_iter().next() {
                return Some(value);
            }
        }
        None
    }

    /// All values of the first strategy that matches anything.
    pub async fn all(&self, scope: &dyn PageElement) -> Vec<String> {
        for strategy in &self.0 {
            let values = strategy.values(scope).await;
            if !values.is_empty() {
                return values;
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserSession, HtmlSession};
    use crate::http::HttpClient;
    use std::time::Duration;

    async fn card(body: &str) -> Box<dyn PageElement> {
        let http = HttpClient::new("mise-test", Duration::from_secs(1)).unwrap();
        let page = format!("<html><body><div class=\"card\">{}</div></body></html>", body);
        let session = HtmlSession::from_document(http, "https://cooking.example.com", &page);
        session.find_all(".card").await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_first_strategy_with_value_wins() {
        let card = card("<h4>Fallback</h4><h3>Primary</h3>").await;
        let chain = FieldChain::texts(&["[data-testid='recipe-title']", "h3", "h4"]);
        assert_eq!(chain.first(card.as_ref()).await.as_deref(), Some("Primary"));
    }

    #[tokio::test]
    async fn test_empty_text_falls_through() {
        let card = card("<h3>   </h3><h4>Soup</h4>").await;
        let chain = FieldChain::texts(&["h3", "h4"]);
        assert_eq!(chain.first(card.as_ref()).await.as_deref(), Some("Soup"));
    }

    #[tokio::test]
    async fn test_attribute_chain() {
        let card = card(r#"<img data-src="/lazy.jpg">"#).await;
        let chain = FieldChain::new(vec![Strategy::attr("img", "src"), Strategy::attr("img", "data-src")]);
        assert_eq!(chain.first(card.as_ref()).await.as_deref(), Some("/lazy.jpg"));
    }

    #[tokio::test]
    async fn test_all_uses_first_matching_strategy() {
        let card = card(r#"<span class="tag">Easy</span><span class="tag"> </span><span class="tag">Quick</span><span class="category">Dinner</span>"#).await;
        let chain = FieldChain::texts(&["[data-testid='tag']", ".tag", ".category"]);
        assert_eq!(chain.all(card.as_ref()).await, vec!["Easy", "Quick"]);
    }

    #[tokio::test]
    async fn test_no_match_is_none() {
        let card = card("<p>nothing here</p>").await;
        assert!(FieldChain::texts(&["h3"]).first(card.as_ref()).await.is_none());
        assert!(FieldChain::texts(&["h3"]).all(card.as_ref()).await.is_empty());
    }
}
