//! Page model: normalized documents and the component/content graph.

mod builder;
mod component;
mod content;
mod graph;
mod link;
mod meta;
mod model;

pub use builder::{BuilderError, MAX_DEPTH, build};
pub use component::{
    Component, ComponentKind, ContainerType, Model, TYPE_COMPONENT, TYPE_COMPONENT_UNDEFINED,
    TYPE_CONTAINER, TYPE_CONTAINER_BOX, TYPE_CONTAINER_INLINE, TYPE_CONTAINER_ITEM,
    TYPE_CONTAINER_ITEM_UNDEFINED, TYPE_CONTAINER_NO_MARKUP, TYPE_CONTAINER_ORDERED_LIST,
    TYPE_CONTAINER_UNORDERED_LIST,
};
pub use content::{
    Content, ContentKind, Image, ImageSet, Menu, MenuItem, Pagination, PaginationPage,
    TYPE_DOCUMENT, TYPE_IMAGE_SET, TYPE_LINK, TYPE_MENU, TYPE_PAGINATION,
};
pub use graph::PageGraph;
pub use link::{Link, LinkType, TYPE_LINK_EXTERNAL, TYPE_LINK_INTERNAL, TYPE_LINK_RESOURCE};
pub use meta::{META_POSITION_BEGIN, META_POSITION_END, MetaCollection, MetaComment, MetaPosition};
pub use model::{CONTENT_PREFIX, ModelVersion, PAGE_PREFIX, PageDocument, Reference};

/// A JSON object map for model fields.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
