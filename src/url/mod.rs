//! URL utilities for request paths, base URLs and credential query parameters.
//!
//! - Absolute URLs are parsed with the `url` crate
//! - Relative URLs (SPA routes, base paths) are split manually so that an
//!   empty base path stays empty instead of becoming `/`
//! - Query parameters keep their order and may repeat

mod builder;

pub use builder::{UrlBuilder, UrlBuilder09, UrlBuilder10, UrlBuilderOptions, UrlBuilderOptions09, UrlBuilderOptions10};

use std::fmt;

use percent_encoding::percent_decode_str;
use url::{Url, form_urlencoded};

// ============================================================================
// SearchParams
// ============================================================================

/// Ordered, possibly repeated query parameters (decoded).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams(Vec<(String, String)>);

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Replace every value of `name` with a single one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.0.iter().position(|(key, _)| *key == name) {
            Some(idx) => {
                self.0[idx].1 = value.into();
                let mut seen = false;
                self.0.retain(|(key, _)| {
                    if *key != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.0.push((name, value.into())),
        }
    }

    /// Remove every value of `name`, returning the first one.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.0.retain(|(key, _)| key != name);
        first
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as `a=1&b=2` (no leading `?`).
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// ParsedUrl
// ============================================================================

/// A URL split into the parts the pipeline rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// `scheme://host[:port]`, empty for relative URLs
    pub origin: String,
    /// Path as written (absolute URLs: percent-encoded by `url`)
    pub pathname: String,
    pub search_params: SearchParams,
    /// Fragment including the leading `#`, or empty
    pub hash: String,
}

impl ParsedUrl {
    pub fn is_absolute(&self) -> bool {
        !self.origin.is_empty()
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin, self.pathname)?;
        if !self.search_params.is_empty() {
            write!(f, "?{}", self.search_params.to_query())?;
        }
        write!(f, "{}", self.hash)
    }
}

/// Parse an absolute or relative URL. Never fails.
pub fn parse_url(value: &str) -> ParsedUrl {
    let trimmed = value.trim();

    if let Ok(url) = Url::parse(trimmed)
        && url.has_host()
    {
        return ParsedUrl {
            origin: url.origin().ascii_serialization(),
            pathname: url.path().to_string(),
            search_params: SearchParams::parse(url.query().unwrap_or_default()),
            hash: url.fragment().map(|f| format!("#{f}")).unwrap_or_default(),
        };
    }

    let (rest, hash) = match trimmed.find('#') {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };
    let (pathname, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };

    ParsedUrl {
        origin: String::new(),
        pathname: pathname.to_string(),
        search_params: SearchParams::parse(query),
        hash: hash.to_string(),
    }
}

/// Origin of an absolute URL, `None` for relative or empty input.
pub fn parse_origin(value: &str) -> Option<String> {
    let parsed = parse_url(value);
    parsed.is_absolute().then_some(parsed.origin)
}

// ============================================================================
// Matching & Query Rewriting
// ============================================================================

/// Check whether `link` lies under `base` (origin, path prefix and base query).
///
/// An empty base matches everything.
pub fn is_matched(link: &str, base: &str) -> bool {
    let link = parse_url(link);
    let base = parse_url(base);

    let origin_matched =
        base.origin.is_empty() || link.origin.is_empty() || link.origin == base.origin;

    origin_matched
        && is_path_matched(&decode(&link.pathname), &decode(&base.pathname))
        && base
            .search_params
            .iter()
            .all(|(name, value)| link.search_params.get(name) == Some(value))
}

fn is_path_matched(path: &str, base: &str) -> bool {
    let base = base.trim_end_matches('/');
    base.is_empty() || path == base || path.starts_with(&format!("{base}/"))
}

fn decode(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Remove the named query parameters from `value`.
///
/// Returns the rewritten URL and the extracted parameters (in `names` order).
/// Empty names are ignored. Parameters that stay are kept as written.
pub fn extract_search_params(value: &str, names: &[&str]) -> (String, SearchParams) {
    let value = value.trim();
    let (rest, hash) = match value.find('#') {
        Some(idx) => value.split_at(idx),
        None => (value, ""),
    };
    let Some((base, query)) = rest.split_once('?') else {
        return (value.to_string(), SearchParams::new());
    };

    let mut found = SearchParams::new();
    let mut kept = Vec::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let decoded = form_urlencoded::parse(pair.as_bytes()).next();
        match decoded {
            Some((name, param)) if names.iter().any(|n| !n.is_empty() && *n == name) => {
                found.append(name, param);
            }
            _ => kept.push(pair),
        }
    }

    let mut extracted = SearchParams::new();
    for name in names.iter().filter(|name| !name.is_empty()) {
        if let Some(param) = found.get(name)
            && extracted.get(name).is_none()
        {
            extracted.append(*name, param);
        }
    }

    let mut path = base.to_string();
    if !kept.is_empty() {
        path.push('?');
        path.push_str(&kept.join("&"));
    }
    path.push_str(hash);
    (path, extracted)
}

/// Append query parameters to `value`, keeping its existing ones.
pub fn append_search_params(value: &str, params: &SearchParams) -> String {
    if params.is_empty() {
        return value.to_string();
    }
    let mut parsed = parse_url(value);
    for (name, param) in params.iter() {
        parsed.search_params.append(name, param);
    }
    parsed.to_string()
}

/// Merge parameter sets; later sets override earlier ones.
pub fn merge_search_params(sets: &[&SearchParams]) -> SearchParams {
    let mut merged = SearchParams::new();
    for set in sets {
        for (name, value) in set.iter() {
            merged.set(name, value);
        }
    }
    merged
}

// ============================================================================
// Path Helpers
// ============================================================================

/// Strip `base` from the front of `path` on a segment boundary.
pub(crate) fn strip_base_path<'a>(path: &'a str, base: &str) -> &'a str {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Join a base path and a route: `("/site", "news")` -> `/site/news`.
pub(crate) fn join_paths(base: &str, route: &str) -> String {
    let base = base.trim_end_matches('/');
    let route = route.trim_start_matches('/');
    match (base.is_empty(), route.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => base.to_string(),
        _ => format!("{base}/{route}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let url = parse_url("https://cms.example.com:8080/site/spa?a=1&b=2#top");
        assert_eq!(url.origin, "https://cms.example.com:8080");
        assert_eq!(url.pathname, "/site/spa");
        assert_eq!(url.search_params.get("a"), Some("1"));
        assert_eq!(url.search_params.get("b"), Some("2"));
        assert_eq!(url.hash, "#top");
    }

    #[test]
    fn test_parse_relative() {
        let url = parse_url("/news/today?token=x#frag");
        assert!(url.origin.is_empty());
        assert_eq!(url.pathname, "/news/today");
        assert_eq!(url.search_params.get("token"), Some("x"));
        assert_eq!(url.hash, "#frag");
    }

    #[test]
    fn test_parse_empty_stays_empty() {
        let url = parse_url("");
        assert_eq!(url, ParsedUrl::default());
        assert_eq!(url.to_string(), "");
    }

    #[test]
    fn test_parse_origin() {
        assert_eq!(
            parse_origin("http://localhost:8080/site/resourceapi"),
            Some("http://localhost:8080".to_string())
        );
        assert_eq!(parse_origin("/relative"), None);
        assert_eq!(parse_origin(""), None);
    }

    #[test]
    fn test_is_matched_prefix() {
        assert!(is_matched("/site/_cmsinternal/news", "/site/_cmsinternal"));
        assert!(is_matched("/site/_cmsinternal", "/site/_cmsinternal/"));
        assert!(!is_matched("/site/_cmsinternalx", "/site/_cmsinternal"));
        assert!(!is_matched("/news", "/site/_cmsinternal"));
    }

    #[test]
    fn test_is_matched_empty_base() {
        assert!(is_matched("/anything", ""));
    }

    #[test]
    fn test_is_matched_query() {
        assert!(is_matched("/spa?preview=1&x=2", "/spa?preview=1"));
        assert!(!is_matched("/spa?preview=0", "/spa?preview=1"));
    }

    #[test]
    fn test_is_matched_decodes() {
        assert!(is_matched("/caf%C3%A9/menu", "/café"));
    }

    #[test]
    fn test_extract_search_params() {
        let (path, params) =
            extract_search_params("/?token=abc123&server-id=s1", &["token", "server-id"]);
        assert_eq!(path, "/");
        assert_eq!(params.get("token"), Some("abc123"));
        assert_eq!(params.get("server-id"), Some("s1"));
    }

    #[test]
    fn test_extract_keeps_other_params() {
        let (path, params) = extract_search_params("/news?page=2&token=t", &["token", ""]);
        assert_eq!(path, "/news?page=2");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_extract_keeps_remaining_encoding() {
        let (path, params) =
            extract_search_params("/news?q=a%20b&token=t&_hn:ref=r1#top", &["token"]);
        assert_eq!(path, "/news?q=a%20b&_hn:ref=r1#top");
        assert_eq!(params.get("token"), Some("t"));
    }

    #[test]
    fn test_extract_first_value_wins() {
        let (path, params) = extract_search_params("/?token=a&token=b&x=1", &["token"]);
        assert_eq!(path, "/?x=1");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("token"), Some("a"));
    }

    #[test]
    fn test_append_search_params() {
        let mut params = SearchParams::new();
        params.append("token", "abc");
        assert_eq!(
            append_search_params("http://spa.example.com/base?x=1", &params),
            "http://spa.example.com/base?x=1&token=abc"
        );
        assert_eq!(append_search_params("", &params), "?token=abc");
        assert_eq!(append_search_params("/base", &SearchParams::new()), "/base");
    }

    #[test]
    fn test_merge_search_params_overrides() {
        let a = SearchParams::parse("a=1&b=2");
        let b = SearchParams::parse("b=3");
        let merged = merge_search_params(&[&a, &b]);
        assert_eq!(merged.to_query(), "a=1&b=3");
    }

    #[test]
    fn test_set_collapses_duplicates() {
        let mut params = SearchParams::parse("a=1&a=2&b=3");
        params.set("a", "9");
        assert_eq!(params.to_query(), "a=9&b=3");
    }

    #[test]
    fn test_strip_base_path() {
        assert_eq!(strip_base_path("/site/news", "/site"), "/news");
        assert_eq!(strip_base_path("/site", "/site/"), "");
        assert_eq!(strip_base_path("/sitemap", "/site"), "/sitemap");
        assert_eq!(strip_base_path("/news", ""), "/news");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/site/resourceapi", "/news"), "/site/resourceapi/news");
        assert_eq!(join_paths("/site/", ""), "/site");
        assert_eq!(join_paths("", ""), "/");
        assert_eq!(join_paths("", "news"), "/news");
    }
}
