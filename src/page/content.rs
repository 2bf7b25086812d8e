//! Content entities: documents, image sets, menus and pagination.

use serde::Deserialize;
use serde_json::Value;

use super::{BuilderError, JsonMap, Link, MetaCollection, Reference};
use crate::url::UrlBuilder;

pub const TYPE_DOCUMENT: &str = "document";
pub const TYPE_IMAGE_SET: &str = "imageset";
pub const TYPE_MENU: &str = "menu";
pub const TYPE_PAGINATION: &str = "pagination";
pub const TYPE_LINK: &str = "link";

/// Entity types that are content rather than components.
pub(crate) fn is_content_type(kind: Option<&str>) -> bool {
    !matches!(
        kind,
        Some(super::TYPE_COMPONENT | super::TYPE_CONTAINER | super::TYPE_CONTAINER_ITEM)
    )
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    Document,
    ImageSet(ImageSet),
    Menu(Menu),
    Pagination(Pagination),
    /// Standalone link entity
    Link(Link),
    /// Type string not known to this crate; the raw data stays available
    Unknown(String),
}

/// A built content entity, shared between all components referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    reference: Reference,
    id: String,
    name: Option<String>,
    display_name: Option<String>,
    locale: Option<String>,
    kind: ContentKind,
    url: Option<String>,
    meta: MetaCollection,
    data: JsonMap,
}

#[derive(Deserialize)]
struct ContentModel {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: JsonMap,
    #[serde(default)]
    links: JsonMap,
    #[serde(default)]
    meta: JsonMap,
}

impl Content {
    pub(crate) fn from_entity(
        reference: Reference,
        entity: &Value,
        url_builder: &dyn UrlBuilder,
    ) -> Result<Self, BuilderError> {
        let model: ContentModel =
            serde_json::from_value(entity.clone()).map_err(|source| BuilderError::Malformed {
                reference: reference.to_string(),
                source,
            })?;
        let meta = MetaCollection::from_meta(reference.as_str(), &model.meta)?;

        let kind = match model.kind.as_deref() {
            None | Some(TYPE_DOCUMENT) => ContentKind::Document,
            Some(TYPE_IMAGE_SET) => ContentKind::ImageSet(ImageSet::from_data(&model.data, url_builder)),
            Some(TYPE_MENU) => ContentKind::Menu(Menu::from_data(&model.data, url_builder)),
            Some(TYPE_PAGINATION) => {
                // pagination fields live at the entity's top level
                let fields = entity.as_object().cloned().unwrap_or_default();
                ContentKind::Pagination(Pagination::from_fields(&fields, url_builder))
            }
            Some(TYPE_LINK) => ContentKind::Link(
                Link::from_links(&model.links, "site")
                    .or_else(|| Link::from_value(&Value::Object(model.data.clone())))
                    .unwrap_or_default(),
            ),
            Some(other) => ContentKind::Unknown(other.to_string()),
        };

        let text = |field: &str| model.data.get(field).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            id: text("id").unwrap_or_else(|| reference.id().to_string()),
            name: text("name"),
            display_name: text("displayName"),
            locale: text("localeString"),
            url: Link::from_links(&model.links, "site").and_then(|link| link.resolve(url_builder)),
            reference,
            kind,
            meta,
            data: model.data,
        })
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

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn kind(&self) -> &ContentKind {
        &self.kind
    }

    /// SPA URL of the content's site link.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn meta(&self) -> &MetaCollection {
        &self.meta
    }

    /// Raw document fields.
    pub fn data(&self) -> &JsonMap {
        &self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, ContentKind::Document)
    }
}

// ============================================================================
// Typed content
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub url: Option<String>,
}

impl Image {
    fn from_value(value: &Value, url_builder: &dyn UrlBuilder) -> Option<Self> {
        let image = value.as_object()?;
        let text = |field: &str| image.get(field).and_then(Value::as_str).map(str::to_string);
        let links = image.get("links").and_then(Value::as_object);

        Some(Self {
            name: text("name"),
            display_name: text("displayName"),
            mime_type: text("mimeType"),
            width: image.get("width").and_then(Value::as_u64),
            height: image.get("height").and_then(Value::as_u64),
            url: links
                .and_then(|links| Link::from_links(links, "site"))
                .and_then(|link| link.resolve(url_builder)),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    pub description: Option<String>,
    pub original: Option<Image>,
    pub thumbnail: Option<Image>,
}

impl ImageSet {
    fn from_data(data: &JsonMap, url_builder: &dyn UrlBuilder) -> Self {
        let image = |field: &str| data.get(field).and_then(|v| Image::from_value(v, url_builder));
        Self {
            description: data.get("description").and_then(Value::as_str).map(str::to_string),
            original: image("original"),
            thumbnail: image("thumbnail"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    pub selected: bool,
    pub expanded: bool,
    pub url: Option<String>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn from_value(value: &Value, url_builder: &dyn UrlBuilder) -> Option<Self> {
        let item = value.as_object()?;
        let flag = |field: &str| item.get(field).and_then(Value::as_bool).unwrap_or(false);

        Some(Self {
            name: item.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            selected: flag("selected"),
            expanded: flag("expanded"),
            url: item
                .get("links")
                .and_then(Value::as_object)
                .and_then(|links| Link::from_links(links, "site"))
                .and_then(|link| link.resolve(url_builder)),
            children: menu_items(item.get("childMenuItems"), url_builder),
        })
    }
}

fn menu_items(value: Option<&Value>, url_builder: &dyn UrlBuilder) -> Vec<MenuItem> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| MenuItem::from_value(item, url_builder))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    pub name: Option<String>,
    pub items: Vec<MenuItem>,
}

impl Menu {
    fn from_data(data: &JsonMap, url_builder: &dyn UrlBuilder) -> Self {
        Self {
            name: data.get("name").and_then(Value::as_str).map(str::to_string),
            items: menu_items(data.get("siteMenuItems"), url_builder),
        }
    }

    /// The selected item, searched depth-first.
    pub fn selected(&self) -> Option<&MenuItem> {
        fn find(items: &[MenuItem]) -> Option<&MenuItem> {
            items.iter().find_map(|item| {
                find(&item.children).or_else(|| item.selected.then_some(item))
            })
        }
        find(&self.items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationPage {
    pub number: u64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub enabled: bool,
    pub offset: u64,
    pub size: u64,
    pub total: u64,
    pub current: Option<PaginationPage>,
    pub first: Option<PaginationPage>,
    pub last: Option<PaginationPage>,
    pub next: Option<PaginationPage>,
    pub previous: Option<PaginationPage>,
    pub pages: Vec<PaginationPage>,
    /// Listed documents, resolvable through the page
    pub items: Vec<Reference>,
}

impl Pagination {
    fn from_fields(fields: &JsonMap, url_builder: &dyn UrlBuilder) -> Self {
        let page = |value: &Value| -> Option<PaginationPage> {
            let page = value.as_object()?;
            Some(PaginationPage {
                number: page.get("number").and_then(Value::as_u64).unwrap_or_default(),
                url: page
                    .get("links")
                    .and_then(Value::as_object)
                    .and_then(|links| Link::from_links(links, "site"))
                    .and_then(|link| link.resolve(url_builder)),
            })
        };
        let number = |field: &str| fields.get(field).and_then(Value::as_u64).unwrap_or_default();

        Self {
            enabled: fields.get("enabled").and_then(Value::as_bool).unwrap_or(false),
            offset: number("offset"),
            size: number("size"),
            total: number("total"),
            current: fields.get("current").and_then(page),
            first: fields.get("first").and_then(page),
            last: fields.get("last").and_then(page),
            next: fields.get("next").and_then(page),
            previous: fields.get("previous").and_then(page),
            pages: fields
                .get("pages")
                .and_then(Value::as_array)
                .map(|pages| pages.iter().filter_map(page).collect())
                .unwrap_or_default(),
            items: fields
                .get("items")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Reference::from_value).collect())
                .unwrap_or_default(),
        }
    }
}
