//! Page graph construction.
//!
//! Walks the component tree depth-first from the root reference, resolving
//! model references into content entities as it goes. Every content entity is
//! built once and shared: all references to the same path yield the same
//! `Arc<Content>`.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::component::is_hidden;
use super::content::is_content_type;
use super::{
    Component, ComponentKind, ContainerType, Content, JsonMap, MetaCollection, Model,
    PageDocument, PageGraph, Reference, TYPE_COMPONENT, TYPE_CONTAINER, TYPE_CONTAINER_ITEM,
};
use crate::url::UrlBuilder;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("page model is not a JSON object")]
    NotAnObject,

    #[error("page model has no root component")]
    MissingRoot,

    #[error("root reference `{0}` does not resolve to a component")]
    InvalidRoot(String),

    #[error("component without an id")]
    MissingId,

    #[error("duplicate component id `{0}`")]
    DuplicateId(String),

    #[error("malformed child component under `{0}`")]
    InvalidComponent(String),

    #[error("unmatched meta-comments on `{owner}`: {begin} begin, {end} end")]
    UnmatchedMeta {
        owner: String,
        begin: usize,
        end: usize,
    },

    #[error("malformed entity `{reference}`: {source}")]
    Malformed {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("component reference cycle through `{0}`")]
    Cycle(String),

    #[error("component tree nested too deep at `{0}`")]
    TooDeep(String),
}

/// Deepest component nesting a page may have.
pub const MAX_DEPTH: usize = 128;

#[derive(Deserialize)]
struct ComponentModel {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    ctype: Option<String>,
    #[serde(default)]
    xtype: Option<String>,
    #[serde(default)]
    children: Vec<Value>,
    #[serde(default)]
    models: JsonMap,
    #[serde(default)]
    meta: JsonMap,
    #[serde(default)]
    links: JsonMap,
}

/// Build a page graph from a normalized document.
pub fn build(
    document: PageDocument,
    url_builder: Arc<dyn UrlBuilder>,
) -> Result<PageGraph, BuilderError> {
    let document = Arc::new(document);

    let root_entity = document
        .resolve(&document.root)
        .ok_or_else(|| BuilderError::InvalidRoot(document.root.to_string()))?;
    let title = root_entity
        .get("meta")
        .and_then(|meta| meta.get("pageTitle"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut builder = GraphBuilder::new(&document, url_builder.as_ref());
    let root = builder.component(&document.root)?;
    builder.remaining_content()?;

    let page_document = match &document.document {
        Some(reference) => builder.content(reference)?,
        None => None,
    };

    Ok(PageGraph {
        root,
        title,
        page_document,
        content: builder.content,
        components: builder.components,
        url_builder,
        document,
    })
}

struct GraphBuilder<'a> {
    document: &'a PageDocument,
    url_builder: &'a dyn UrlBuilder,
    content: FxHashMap<String, Arc<Content>>,
    components: FxHashMap<String, Arc<Component>>,
    /// Component paths on the current DFS stack
    visiting: FxHashSet<String>,
}

impl<'a> GraphBuilder<'a> {
    fn new(document: &'a PageDocument, url_builder: &'a dyn UrlBuilder) -> Self {
        Self {
            document,
            url_builder,
            content: FxHashMap::default(),
            components: FxHashMap::default(),
            visiting: FxHashSet::default(),
        }
    }

    fn component(&mut self, reference: &Reference) -> Result<Arc<Component>, BuilderError> {
        let Some(entity) = self.document.resolve(reference) else {
            return Ok(Arc::new(Component::missing(reference.clone())));
        };
        if self.visiting.len() >= MAX_DEPTH {
            return Err(BuilderError::TooDeep(reference.to_string()));
        }
        if !self.visiting.insert(reference.as_str().to_string()) {
            return Err(BuilderError::Cycle(reference.to_string()));
        }

        let model: ComponentModel =
            serde_json::from_value(entity.clone()).map_err(|source| BuilderError::Malformed {
                reference: reference.to_string(),
                source,
            })?;
        let meta = MetaCollection::from_meta(reference.as_str(), &model.meta)?;

        let kind = match model.kind.as_str() {
            TYPE_CONTAINER => ComponentKind::Container {
                container_type: ContainerType::from_xtype(model.xtype.as_deref()),
                items: self.children(reference, &model.children)?,
            },
            TYPE_CONTAINER_ITEM => ComponentKind::ContainerItem {
                render_type: model.ctype.clone().or_else(|| model.label.clone()),
                hidden: is_hidden(&model.meta),
            },
            TYPE_COMPONENT => ComponentKind::Plain {
                children: self.children(reference, &model.children)?,
            },
            other => ComponentKind::Undefined {
                type_name: other.to_string(),
            },
        };

        let mut models = Vec::with_capacity(model.models.len());
        for (name, value) in model.models {
            let model = match Reference::from_value(&value) {
                Some(target) => match self.content(&target)? {
                    Some(content) => Model::Content(content),
                    None => Model::Missing(target),
                },
                None => Model::Value(value),
            };
            models.push((name, model));
        }

        let params = match model.meta.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => JsonMap::new(),
        };

        self.visiting.remove(reference.as_str());

        let component = Arc::new(Component {
            id: model.id.unwrap_or_else(|| reference.id().to_string()),
            reference: reference.clone(),
            name: model.name,
            label: model.label,
            kind,
            models,
            params,
            links: model.links,
            meta,
        });
        self.components
            .insert(component.id.clone(), Arc::clone(&component));

        Ok(component)
    }

    fn children(
        &mut self,
        owner: &Reference,
        children: &[Value],
    ) -> Result<Vec<Arc<Component>>, BuilderError> {
        children
            .iter()
            .map(|child| {
                let reference = Reference::from_value(child)
                    .ok_or_else(|| BuilderError::InvalidComponent(owner.to_string()))?;
                self.component(&reference)
            })
            .collect()
    }

    /// Shared content entity behind a reference, built on first use.
    fn content(&mut self, reference: &Reference) -> Result<Option<Arc<Content>>, BuilderError> {
        if let Some(content) = self.content.get(reference.as_str()) {
            return Ok(Some(Arc::clone(content)));
        }
        let Some(entity) = self.document.resolve(reference) else {
            return Ok(None);
        };

        let content = Arc::new(Content::from_entity(
            reference.clone(),
            entity,
            self.url_builder,
        )?);
        self.content
            .insert(reference.as_str().to_string(), Arc::clone(&content));
        Ok(Some(content))
    }

    /// Build content entities no component model points at (pagination
    /// items, the page document).
    fn remaining_content(&mut self) -> Result<(), BuilderError> {
        let document = self.document;
        for (path, entity) in &document.entities {
            let kind = entity.get("type").and_then(Value::as_str);
            if is_content_type(kind) && !self.content.contains_key(path) {
                self.content(&Reference::new(path.as_str()))?;
            }
        }
        Ok(())
    }
}
