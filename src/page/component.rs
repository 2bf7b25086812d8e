//! Built components: containers, container items and plain components.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use serde_json::Value;

use super::{Content, JsonMap, Link, MetaCollection, Reference};

pub const TYPE_COMPONENT: &str = "component";
pub const TYPE_CONTAINER: &str = "container";
pub const TYPE_CONTAINER_ITEM: &str = "container-item";

pub const TYPE_CONTAINER_BOX: &str = "hst.vbox";
pub const TYPE_CONTAINER_INLINE: &str = "hst.span";
pub const TYPE_CONTAINER_NO_MARKUP: &str = "hst.nomarkup";
pub const TYPE_CONTAINER_ORDERED_LIST: &str = "hst.orderedlist";
pub const TYPE_CONTAINER_UNORDERED_LIST: &str = "hst.unorderedlist";

/// Mapping key renderers fall back to for unmapped container items.
pub const TYPE_CONTAINER_ITEM_UNDEFINED: &str = "ContainerItemUndefined";
/// Mapping key renderers fall back to for unknown component types.
pub const TYPE_COMPONENT_UNDEFINED: &str = "ComponentUndefined";

/// Parameter set by the targeting module on hidden container items.
const PARAMETER_HIDE: &str = "com.onehippo.cms7.targeting.TargetingParameterUtil.hide";

/// Container markup variant (`xtype` in the model).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContainerType {
    #[default]
    Box,
    Inline,
    NoMarkup,
    OrderedList,
    UnorderedList,
    Other(String),
}

impl ContainerType {
    pub fn from_xtype(xtype: Option<&str>) -> Self {
        match xtype.map(str::to_ascii_lowercase).as_deref() {
            None | Some(TYPE_CONTAINER_BOX) => Self::Box,
            Some(TYPE_CONTAINER_INLINE) => Self::Inline,
            Some(TYPE_CONTAINER_NO_MARKUP) => Self::NoMarkup,
            Some(TYPE_CONTAINER_ORDERED_LIST) => Self::OrderedList,
            Some(TYPE_CONTAINER_UNORDERED_LIST) => Self::UnorderedList,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Box => TYPE_CONTAINER_BOX,
            Self::Inline => TYPE_CONTAINER_INLINE,
            Self::NoMarkup => TYPE_CONTAINER_NO_MARKUP,
            Self::OrderedList => TYPE_CONTAINER_ORDERED_LIST,
            Self::UnorderedList => TYPE_CONTAINER_UNORDERED_LIST,
            Self::Other(xtype) => xtype,
        }
    }
}

#[derive(Debug)]
pub enum ComponentKind {
    Container {
        container_type: ContainerType,
        items: Vec<Arc<Component>>,
    },
    ContainerItem {
        /// Renderer lookup key (`ctype`, else `label`)
        render_type: Option<String>,
        hidden: bool,
    },
    Plain {
        children: Vec<Arc<Component>>,
    },
    /// Unknown `type`, or a child reference with no entity behind it
    Undefined {
        type_name: String,
    },
}

/// A model value of a component.
#[derive(Debug, Clone)]
pub enum Model {
    /// Reference resolved to a shared content entity
    Content(Arc<Content>),
    /// Reference with no entity behind it
    Missing(Reference),
    Value(Value),
}

impl Model {
    pub fn as_content(&self) -> Option<&Arc<Content>> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Component {
    pub(crate) reference: Reference,
    pub(crate) id: String,
    pub(crate) name: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) kind: ComponentKind,
    /// Models in wire order
    pub(crate) models: Vec<(String, Model)>,
    pub(crate) params: JsonMap,
    pub(crate) links: JsonMap,
    pub(crate) meta: MetaCollection,
}

impl Component {
    /// Placeholder for a child reference that resolves to nothing.
    pub(crate) fn missing(reference: Reference) -> Self {
        Self {
            id: reference.id().to_string(),
            reference,
            name: None,
            label: None,
            kind: ComponentKind::Undefined {
                type_name: String::new(),
            },
            models: Vec::new(),
            params: JsonMap::new(),
            links: JsonMap::new(),
            meta: MetaCollection::default(),
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn params(&self) -> &JsonMap {
        &self.params
    }

    pub fn links(&self) -> &JsonMap {
        &self.links
    }

    pub fn meta(&self) -> &MetaCollection {
        &self.meta
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &Model)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models
            .iter()
            .find_map(|(key, model)| (key == name).then_some(model))
    }

    /// Content behind a model reference; `None` when absent or unresolved.
    pub fn content(&self, name: &str) -> Option<&Arc<Content>> {
        self.model(name).and_then(Model::as_content)
    }

    /// Ordered children (container items for containers).
    pub fn children(&self) -> &[Arc<Component>] {
        match &self.kind {
            ComponentKind::Container { items, .. } => items,
            ComponentKind::Plain { children } => children,
            _ => &[],
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.kind, ComponentKind::ContainerItem { hidden: true, .. })
    }

    /// URL for re-fetching this component's model (`links.self`).
    pub fn model_url(&self) -> Option<&str> {
        self.links
            .get("self")
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
    }

    pub fn link(&self, name: &str) -> Option<Link> {
        Link::from_links(&self.links, name)
    }

    /// Key a renderer mapping is consulted with.
    pub fn render_key(&self) -> &str {
        match &self.kind {
            ComponentKind::Container { container_type, .. } => container_type.as_str(),
            ComponentKind::ContainerItem { render_type, .. } => render_type
                .as_deref()
                .unwrap_or(TYPE_CONTAINER_ITEM_UNDEFINED),
            ComponentKind::Plain { .. } => self.name.as_deref().unwrap_or(TYPE_COMPONENT),
            ComponentKind::Undefined { .. } => TYPE_COMPONENT_UNDEFINED,
        }
    }

    /// Renderer for this component, with the undefined fallback keys.
    pub fn lookup<'m, R, S: BuildHasher>(&self, mapping: &'m HashMap<String, R, S>) -> Option<&'m R> {
        let fallback = match self.kind {
            ComponentKind::ContainerItem { .. } => TYPE_CONTAINER_ITEM_UNDEFINED,
            _ => TYPE_COMPONENT_UNDEFINED,
        };
        mapping
            .get(self.render_key())
            .or_else(|| mapping.get(fallback))
    }

    /// Descendant by child names, e.g. `["main", "banner"]`.
    pub fn find(&self, names: &[&str]) -> Option<&Arc<Component>> {
        let (first, rest) = names.split_first()?;
        let child = self
            .children()
            .iter()
            .find(|child| child.name.as_deref() == Some(*first))?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.find(rest)
        }
    }
}

/// Whether the targeting module hid a container item.
pub(crate) fn is_hidden(meta: &JsonMap) -> bool {
    if meta.get("hidden").and_then(Value::as_bool).unwrap_or(false) {
        return true;
    }
    meta.get("params")
        .and_then(|params| params.get(PARAMETER_HIDE))
        .and_then(Value::as_str)
        == Some("on")
}
