//! Built page graph: the immutable snapshot a page handle serves.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{CONTENT_PREFIX, Component, Content, JsonMap, Link, ModelVersion, PAGE_PREFIX, PageDocument};
use crate::url::UrlBuilder;

pub struct PageGraph {
    pub(crate) document: Arc<PageDocument>,
    pub(crate) root: Arc<Component>,
    pub(crate) title: Option<String>,
    pub(crate) page_document: Option<Arc<Content>>,
    /// Content keyed by reference path
    pub(crate) content: FxHashMap<String, Arc<Content>>,
    /// Components keyed by id
    pub(crate) components: FxHashMap<String, Arc<Component>>,
    pub(crate) url_builder: Arc<dyn UrlBuilder>,
}

impl fmt::Debug for PageGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageGraph")
            .field("root", &self.root.id())
            .field("components", &self.components.len())
            .field("content", &self.content.len())
            .field("preview", &self.is_preview())
            .finish()
    }
}

impl PageGraph {
    pub fn root(&self) -> &Arc<Component> {
        &self.root
    }

    /// Component by child-name path from the root; the empty path is the root.
    pub fn get_component(&self, names: &[&str]) -> Option<&Arc<Component>> {
        if names.is_empty() {
            return Some(&self.root);
        }
        self.root.find(names)
    }

    pub fn get_component_by_id(&self, id: &str) -> Option<&Arc<Component>> {
        self.components.get(id)
    }

    /// Content by reference path; a bare id is tried under both prefixes.
    pub fn get_content(&self, reference: impl AsRef<str>) -> Option<Arc<Content>> {
        let reference = reference.as_ref();
        let found = if reference.starts_with('/') {
            self.content.get(reference)
        } else {
            self.content
                .get(&format!("{PAGE_PREFIX}{reference}"))
                .or_else(|| self.content.get(&format!("{CONTENT_PREFIX}{reference}")))
        };
        found.cloned()
    }

    /// Page-level document (1.0 models only).
    pub fn get_document(&self) -> Option<Arc<Content>> {
        self.page_document.clone()
    }

    pub fn is_preview(&self) -> bool {
        self.document.is_preview()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// `channel.info.props` of the page model.
    pub fn channel_parameters(&self) -> JsonMap {
        self.document
            .channel
            .as_ref()
            .and_then(|channel| channel.get("info"))
            .and_then(|info| info.get("props"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn version(&self) -> ModelVersion {
        self.document.version
    }

    pub fn document(&self) -> &Arc<PageDocument> {
        &self.document
    }

    /// Navigable URL of a link in this page's URL space.
    pub fn get_url(&self, link: &Link) -> Option<String> {
        link.resolve(self.url_builder.as_ref())
    }

    /// SPA URL for a raw internal path.
    pub fn spa_url(&self, path: &str) -> String {
        self.url_builder.spa_url(path)
    }

    /// All components, depth-first in child order.
    pub fn components(&self) -> Vec<&Arc<Component>> {
        fn walk<'a>(component: &'a Arc<Component>, out: &mut Vec<&'a Arc<Component>>) {
            out.push(component);
            for child in component.children() {
                walk(child, out);
            }
        }

        let mut out = Vec::with_capacity(self.components.len());
        walk(&self.root, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::build;
    use crate::url::{UrlBuilderOptions, UrlBuilderOptions10};
    use serde_json::json;

    fn graph() -> PageGraph {
        let document = PageDocument::from_value(json!({
            "root": { "$ref": "/page/r" },
            "meta": { "preview": true },
            "links": { "site": { "href": "/", "type": "internal" } },
            "channel": { "info": { "props": { "theme": "dark" } } },
            "document": { "$ref": "/page/home" },
            "page": {
                "r": { "id": "r", "type": "component", "children": [{ "$ref": "/page/m" }] },
                "m": { "id": "m", "type": "container", "name": "main", "children": [{ "$ref": "/page/i" }] },
                "i": { "id": "i", "type": "container-item", "name": "item" },
                "home": { "type": "document", "data": { "name": "home" } }
            }
        }))
        .unwrap();
        build(
            document,
            UrlBuilderOptions::V10(UrlBuilderOptions10 {
                endpoint: Some("http://cms/site/resourceapi".to_string()),
                base_url: "/app?token=t".to_string(),
            })
            .into_builder(),
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let graph = graph();
        assert!(graph.is_preview());
        assert_eq!(graph.version(), ModelVersion::V10);
        assert_eq!(graph.channel_parameters()["theme"], "dark");
        assert_eq!(graph.get_document().unwrap().name(), Some("home"));
        assert_eq!(graph.get_content("home").unwrap().name(), Some("home"));
        assert!(graph.get_content("nothing").is_none());
    }

    #[test]
    fn test_lookup_paths() {
        let graph = graph();
        assert_eq!(graph.get_component(&[]).unwrap().id(), "r");
        assert_eq!(graph.get_component(&["main", "item"]).unwrap().id(), "i");
        assert_eq!(graph.get_component_by_id("m").unwrap().name(), Some("main"));

        let ids: Vec<_> = graph.components().iter().map(|c| c.id()).collect();
        assert_eq!(ids, ["r", "m", "i"]);
    }

    #[test]
    fn test_get_url_propagates_token() {
        let graph = graph();
        assert_eq!(
            graph.get_url(&Link::internal("/news")).as_deref(),
            Some("/app/news?token=t")
        );
    }
}
