//! Wire types shared by the NYT search and archive endpoints, plus the
//! credential lookup both adapters go through.

use crate::error::SourceError;
use mise_core::{CredentialSource, NYT_API_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    #[serde(default)]
    pub main: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

impl Person {
    /// `name` when present, otherwise "firstname lastname".
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Byline {
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub person: Vec<Person>,
}

/// One article as returned by the search and archive endpoints. Every
/// field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub headline: Option<Headline>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub lead_paragraph: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub byline: Option<Byline>,
}

impl ApiDocument {
    pub fn headline_text(&self) -> &str {
        self.headline.as_ref().and_then(|h| h.main.as_deref()).unwrap_or("")
    }

    pub fn snippet_text(&self) -> &str {
        self.snippet.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DocsEnvelope {
    #[serde(default)]
    pub response: Option<DocsResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DocsResponse {
    #[serde(default)]
    pub docs: Vec<ApiDocument>,
}

impl DocsEnvelope {
    pub fn into_docs(self) -> Vec<ApiDocument> {
        self.response.map(|r| r.docs).unwrap_or_default()
    }
}

/// Resolve the API key, or report the source as not configured.
pub(crate) fn api_key(credentials: &Arc<dyn CredentialSource>) -> Result<String, SourceError> {
    credentials
        .get_credential(NYT_API_KEY)
        .ok_or_else(|| SourceError::NotConfigured(NYT_API_KEY.to_string()))
}
