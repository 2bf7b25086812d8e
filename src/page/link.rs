//! Links carried by components, content and the page itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JsonMap;
use crate::url::UrlBuilder;

pub const TYPE_LINK_INTERNAL: &str = "internal";
pub const TYPE_LINK_EXTERNAL: &str = "external";
pub const TYPE_LINK_RESOURCE: &str = "resource";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Internal,
    External,
    Resource,
    #[serde(other)]
    Unknown,
}

/// `{href, type}` link. A missing type means internal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: LinkType,
}

impl Link {
    pub fn new(href: impl Into<String>, kind: LinkType) -> Self {
        Self {
            href: Some(href.into()),
            kind,
        }
    }

    pub fn internal(href: impl Into<String>) -> Self {
        Self::new(href, LinkType::Internal)
    }

    /// Link stored under `name` in a `links` object.
    pub fn from_links(links: &JsonMap, name: &str) -> Option<Self> {
        links.get(name).and_then(Self::from_value)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Navigable URL.
    ///
    /// Internal links are mapped into the SPA's URL space; external and
    /// resource links are returned as-is; unknown types have no URL.
    pub fn resolve(&self, url_builder: &dyn UrlBuilder) -> Option<String> {
        let href = self.href.as_deref()?;
        match self.kind {
            LinkType::Internal => Some(url_builder.spa_url(href)),
            LinkType::External | LinkType::Resource => Some(href.to_string()),
            LinkType::Unknown => None,
        }
    }
}
