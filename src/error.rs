//! Top-level error type of the page pipeline.

use thiserror::Error;

use crate::api::FetchError;
use crate::config::ConfigError;
use crate::page::BuilderError;

/// Errors surfaced by initialization and page updates.
///
/// Initialization errors bind no scope. Update errors leave the page's
/// current graph in place.
#[derive(Debug, Error)]
pub enum SpaError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to fetch the page model")]
    Fetch(#[from] FetchError),

    #[error("failed to build the page")]
    Build(#[from] BuilderError),

    #[error("page has been destroyed")]
    Destroyed,

    #[error("no component with id `{0}`")]
    UnknownComponent(String),

    #[error("component `{0}` has no model URL")]
    MissingComponentUrl(String),
}

pub type Result<T> = std::result::Result<T, SpaError>;
