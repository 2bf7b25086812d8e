//! Page model documents and their normalization.
//!
//! Two wire schemas exist:
//!
//! ```text
//! 0.9: { page: {id, type, components: [...], _meta, _links}, content: {id: {...}}, _meta, _links }
//! 1.0: { root: {$ref: "/page/<id>"}, page: {id: {...}}, meta, links, channel, document? }
//! ```
//!
//! Both are normalized into one flat [`PageDocument`]: entities keyed by
//! reference path, `_meta`/`_links` renamed to `meta`/`links`, nested 0.9
//! components replaced by `children` references and 0.9 content wrapped as
//! `{type, data, links, meta}`.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{BuilderError, JsonMap};

/// Reference path prefix of component entities.
pub const PAGE_PREFIX: &str = "/page/";
/// Reference path prefix of 0.9 content entities.
pub const CONTENT_PREFIX: &str = "/content/";

// ============================================================================
// Reference
// ============================================================================

/// `{"$ref": "/page/<id>"}` pointer into the entity table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    path: String,
}

impl Reference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn component(id: &str) -> Self {
        Self::new(format!("{PAGE_PREFIX}{id}"))
    }

    pub fn content(id: &str) -> Self {
        Self::new(format!("{CONTENT_PREFIX}{id}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Reference embedded in a JSON value, if it is one.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_object()?
            .get("$ref")?
            .as_str()
            .map(Self::new)
    }

    pub fn to_value(&self) -> Value {
        json!({ "$ref": self.path })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for Reference {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

// ============================================================================
// PageDocument
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVersion {
    V09,
    V10,
}

/// Normalized page model.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub version: ModelVersion,
    pub root: Reference,
    /// Entities keyed by reference path
    pub entities: FxHashMap<String, Value>,
    pub links: JsonMap,
    pub meta: JsonMap,
    pub channel: Option<Value>,
    /// Page-level document (1.0)
    pub document: Option<Reference>,
}

impl PageDocument {
    /// Normalize a raw page model of either version.
    pub fn from_value(value: Value) -> Result<Self, BuilderError> {
        let Value::Object(model) = value else {
            return Err(BuilderError::NotAnObject);
        };

        if let Some(root) = model.get("root").and_then(Reference::from_value) {
            return Ok(Self::from_v10(model, root));
        }

        match model.get("page") {
            Some(Value::Object(page)) if page.get("type").is_some_and(Value::is_string) => {
                Self::from_v09(model)
            }
            _ => Err(BuilderError::MissingRoot),
        }
    }

    fn from_v10(mut model: JsonMap, root: Reference) -> Self {
        let entities = match model.remove("page") {
            Some(Value::Object(page)) => page
                .into_iter()
                .map(|(id, mut entity)| {
                    normalize_keys(&mut entity);
                    (Reference::component(&id).path, entity)
                })
                .collect(),
            _ => FxHashMap::default(),
        };

        Self {
            version: ModelVersion::V10,
            root,
            entities,
            links: take_map(&mut model, &["links", "_links"]),
            meta: take_map(&mut model, &["meta", "_meta"]),
            channel: model.remove("channel"),
            document: model.get("document").and_then(Reference::from_value),
        }
    }

    fn from_v09(mut model: JsonMap) -> Result<Self, BuilderError> {
        let Some(Value::Object(page)) = model.remove("page") else {
            return Err(BuilderError::MissingRoot);
        };

        let mut entities = FxHashMap::default();
        let root = flatten_component(page, &mut entities)?;

        if let Some(Value::Object(content)) = model.remove("content") {
            for (id, entity) in content {
                entities.insert(Reference::content(&id).path, wrap_content(entity));
            }
        }

        Ok(Self {
            version: ModelVersion::V09,
            root,
            entities,
            links: take_map(&mut model, &["_links", "links"]),
            meta: take_map(&mut model, &["_meta", "meta"]),
            channel: model.remove("channel"),
            document: None,
        })
    }

    /// Entity behind a reference.
    pub fn resolve(&self, reference: &Reference) -> Option<&Value> {
        self.entities.get(reference.as_str())
    }

    /// Preview flag of the page model or its root component.
    pub fn is_preview(&self) -> bool {
        let flag = |preview: Option<&Value>| preview.and_then(Value::as_bool).unwrap_or(false);
        let root_preview = self
            .resolve(&self.root)
            .and_then(|root| root.get("meta"))
            .and_then(|meta| meta.get("preview"));

        flag(self.meta.get("preview")) || flag(root_preview)
    }

    /// Copy of this document with a re-fetched component subtree merged in.
    ///
    /// Entities of `partial` replace entities with the same path; the partial
    /// root is stored under `target` so that parents keep pointing at it.
    pub fn merged_with(&self, partial: PageDocument, target: &Reference) -> Self {
        let mut merged = self.clone();
        let root_entity = partial.resolve(&partial.root).cloned();
        let same_root = partial.root == *target;

        merged.entities.extend(partial.entities);
        if let Some(entity) = root_entity
            && !same_root
        {
            merged.entities.insert(target.path.clone(), entity);
        }

        merged
    }
}

// ============================================================================
// Normalization helpers
// ============================================================================

/// Remove the first present key as an object.
fn take_map(model: &mut JsonMap, keys: &[&str]) -> JsonMap {
    keys.iter()
        .find_map(|key| match model.remove(*key) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

/// Rename `_meta` / `_links` to `meta` / `links`.
fn normalize_keys(entity: &mut Value) {
    let Value::Object(map) = entity else {
        return;
    };
    for (from, to) in [("_meta", "meta"), ("_links", "links")] {
        if let Some(value) = map.remove(from) {
            map.entry(to).or_insert(value);
        }
    }
}

/// Flatten a nested 0.9 component into the entity table.
fn flatten_component(
    mut component: JsonMap,
    entities: &mut FxHashMap<String, Value>,
) -> Result<Reference, BuilderError> {
    let id = component
        .get("id")
        .and_then(Value::as_str)
        .ok_or(BuilderError::MissingId)?
        .to_string();

    let nested = match component.remove("components") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let mut children = Vec::with_capacity(nested.len());
    for child in nested {
        let Value::Object(child) = child else {
            return Err(BuilderError::InvalidComponent(id));
        };
        children.push(flatten_component(child, entities)?.to_value());
    }
    component.insert("children".to_string(), Value::Array(children));

    let mut entity = Value::Object(component);
    normalize_keys(&mut entity);
    if let Some(Value::Object(links)) = entity.get_mut("links")
        && let Some(rendering) = links.remove("componentRendering")
    {
        links.entry("self").or_insert(rendering);
    }

    let reference = Reference::component(&id);
    if entities.insert(reference.path.clone(), entity).is_some() {
        return Err(BuilderError::DuplicateId(id));
    }
    Ok(reference)
}

/// Wrap a 0.9 content item as `{type, data, links, meta}`.
fn wrap_content(entity: Value) -> Value {
    let Value::Object(mut data) = entity else {
        return entity;
    };
    let links = data.remove("_links").unwrap_or_else(|| json!({}));
    let meta = data.remove("_meta").unwrap_or_else(|| json!({}));
    let kind = data.remove("type").unwrap_or_else(|| json!("document"));

    json!({ "type": kind, "data": data, "links": links, "meta": meta })
}
