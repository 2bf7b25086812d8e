//! Authoring meta-comments attached to components and content.
//!
//! In preview the page model carries `meta.beginNodeSpan` / `meta.endNodeSpan`
//! arrays whose `comment` entries are emitted around the rendered markup so the
//! authoring tool can locate it. Begin and end entries pair up as nested
//! brackets: the first begin closes with the last end.

use serde::Deserialize;
use serde_json::Value;

use super::{BuilderError, JsonMap};

pub const META_POSITION_BEGIN: &str = "begin";
pub const META_POSITION_END: &str = "end";

const TYPE_META_COMMENT: &str = "comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaPosition {
    Begin,
    End,
}

impl MetaPosition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => META_POSITION_BEGIN,
            Self::End => META_POSITION_END,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaComment {
    data: String,
    position: MetaPosition,
}

impl MetaComment {
    pub fn new(data: impl Into<String>, position: MetaPosition) -> Self {
        Self {
            data: data.into(),
            position,
        }
    }

    #[inline]
    pub fn data(&self) -> &str {
        &self.data
    }

    #[inline]
    pub fn position(&self) -> MetaPosition {
        self.position
    }
}

#[derive(Deserialize)]
struct MetaModel {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: String,
}

/// Meta-comments of one entity, begin and end kept separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaCollection {
    begin: Vec<MetaComment>,
    end: Vec<MetaComment>,
}

impl MetaCollection {
    /// Read `beginNodeSpan` / `endNodeSpan` of an entity's meta object.
    ///
    /// Fails when the entries are malformed or the two sides differ in count.
    pub fn from_meta(owner: &str, meta: &JsonMap) -> Result<Self, BuilderError> {
        let begin = Self::read(owner, meta.get("beginNodeSpan"), MetaPosition::Begin)?;
        let end = Self::read(owner, meta.get("endNodeSpan"), MetaPosition::End)?;

        if begin.len() != end.len() {
            return Err(BuilderError::UnmatchedMeta {
                owner: owner.to_string(),
                begin: begin.len(),
                end: end.len(),
            });
        }

        Ok(Self { begin, end })
    }

    fn read(
        owner: &str,
        span: Option<&Value>,
        position: MetaPosition,
    ) -> Result<Vec<MetaComment>, BuilderError> {
        let Some(span) = span.filter(|s| !s.is_null()) else {
            return Ok(Vec::new());
        };

        let items: Vec<MetaModel> =
            serde_json::from_value(span.clone()).map_err(|source| BuilderError::Malformed {
                reference: owner.to_string(),
                source,
            })?;

        Ok(items
            .into_iter()
            .filter(|item| item.kind == TYPE_META_COMMENT)
            .map(|item| MetaComment::new(item.data, position))
            .collect())
    }

    pub fn begin(&self) -> &[MetaComment] {
        &self.begin
    }

    pub fn end(&self) -> &[MetaComment] {
        &self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin.is_empty()
    }

    /// Begin/end pairs, outermost first.
    pub fn pairs(&self) -> impl Iterator<Item = (&MetaComment, &MetaComment)> {
        self.begin.iter().zip(self.end.iter().rev())
    }
}
