//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
///
/// Raised before any network call; no page state exists when one surfaces.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config file parsing error")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config file format `{0}` (expected .toml or .json)")]
    UnknownFormat(PathBuf),

    #[error("reverse-proxy `options` need a `live` environment with a page model base URL")]
    MissingLiveOptions,

    #[error("unsupported page model API version `{0}`")]
    UnsupportedApiVersion(String),

    #[error("invalid URL in `{field}`: `{value}`")]
    InvalidUrl { field: &'static str, value: String },
}
