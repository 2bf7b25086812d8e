//! Page model API and SPA URL construction for both API generations.

use std::fmt;
use std::sync::Arc;

use super::{ParsedUrl, join_paths, merge_search_params, parse_url, strip_base_path};

/// Default page model API path under the CMS base URL (0.9).
const DEFAULT_API_PATH: &str = "/resourceapi";

/// Maps SPA routes to page model API URLs and CMS links to SPA URLs.
pub trait UrlBuilder: fmt::Debug + Send + Sync {
    /// Page model API URL for an SPA route (query parameters carried over).
    fn api_url(&self, path: &str) -> String;

    /// SPA URL for an internal CMS link.
    fn spa_url(&self, link: &str) -> String;
}

/// Options for one of the two builder generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlBuilderOptions {
    V09(UrlBuilderOptions09),
    V10(UrlBuilderOptions10),
}

impl UrlBuilderOptions {
    pub fn into_builder(self) -> Arc<dyn UrlBuilder> {
        match self {
            Self::V09(options) => Arc::new(UrlBuilder09::new(options)),
            Self::V10(options) => Arc::new(UrlBuilder10::new(options)),
        }
    }
}

// ============================================================================
// Page Model API 0.9 (also reverse-proxy setups)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBuilderOptions09 {
    /// Explicit page model API base; defaults to `{cms_base_url}/resourceapi`
    pub api_base_url: Option<String>,
    pub cms_base_url: Option<String>,
    /// SPA base URL, possibly carrying propagated credentials in its query
    pub spa_base_url: String,
}

#[derive(Debug, Clone)]
pub struct UrlBuilder09 {
    api_base: ParsedUrl,
    cms_base: ParsedUrl,
    spa_base: ParsedUrl,
}

impl UrlBuilder09 {
    pub fn new(options: UrlBuilderOptions09) -> Self {
        let cms_base_url = options.cms_base_url.unwrap_or_default();
        let api_base_url = options.api_base_url.unwrap_or_else(|| {
            format!("{}{DEFAULT_API_PATH}", cms_base_url.trim_end_matches('/'))
        });

        Self {
            api_base: parse_url(&api_base_url),
            cms_base: parse_url(&cms_base_url),
            spa_base: parse_url(&options.spa_base_url),
        }
    }
}

impl UrlBuilder for UrlBuilder09 {
    fn api_url(&self, path: &str) -> String {
        let route = parse_url(path);
        let route_path = strip_base_path(&route.pathname, &self.spa_base.pathname);

        ParsedUrl {
            origin: self.api_base.origin.clone(),
            pathname: join_paths(&self.api_base.pathname, route_path),
            search_params: merge_search_params(&[
                &self.api_base.search_params,
                &route.search_params,
            ]),
            hash: String::new(),
        }
        .to_string()
    }

    fn spa_url(&self, link: &str) -> String {
        let link = parse_url(link);
        let route = strip_base_path(&link.pathname, &self.cms_base.pathname);

        ParsedUrl {
            origin: self.spa_base.origin.clone(),
            pathname: join_paths(&self.spa_base.pathname, route),
            search_params: merge_search_params(&[&link.search_params, &self.spa_base.search_params]),
            hash: if link.hash.is_empty() {
                self.spa_base.hash.clone()
            } else {
                link.hash
            },
        }
        .to_string()
    }
}

// ============================================================================
// Page Model API 1.0
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBuilderOptions10 {
    /// Page model API endpoint
    pub endpoint: Option<String>,
    /// SPA base URL, possibly carrying propagated credentials in its query
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct UrlBuilder10 {
    endpoint: ParsedUrl,
    base: ParsedUrl,
}

impl UrlBuilder10 {
    pub fn new(options: UrlBuilderOptions10) -> Self {
        Self {
            endpoint: parse_url(options.endpoint.as_deref().unwrap_or_default()),
            base: parse_url(&options.base_url),
        }
    }
}

impl UrlBuilder for UrlBuilder10 {
    fn api_url(&self, path: &str) -> String {
        let route = parse_url(path);
        let route_path = strip_base_path(&route.pathname, &self.base.pathname);

        ParsedUrl {
            origin: self.endpoint.origin.clone(),
            pathname: join_paths(&self.endpoint.pathname, route_path),
            search_params: merge_search_params(&[
                &self.endpoint.search_params,
                &route.search_params,
            ]),
            hash: String::new(),
        }
        .to_string()
    }

    fn spa_url(&self, link: &str) -> String {
        let link = parse_url(link);

        ParsedUrl {
            origin: self.base.origin.clone(),
            pathname: join_paths(&self.base.pathname, &link.pathname),
            search_params: merge_search_params(&[&link.search_params, &self.base.search_params]),
            hash: if link.hash.is_empty() {
                self.base.hash.clone()
            } else {
                link.hash
            },
        }
        .to_string()
    }
}
