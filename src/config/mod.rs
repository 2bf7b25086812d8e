//! Integration configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── classify   # Protocol tag from the configuration shape
//! ├── error      # ConfigError
//! └── mod.rs     # Configuration (this file)
//! ```
//!
//! # Shapes
//!
//! One struct carries the union of the three supported setups; which fields
//! are present decides the protocol (see [`classify`]).
//!
//! | Setup         | Distinguishing fields                            |
//! |---------------|--------------------------------------------------|
//! | reverse proxy | `options.live` / `options.preview`               |
//! | token 0.9     | `cmsBaseUrl`, `apiBaseUrl`, `spaBaseUrl`         |
//! | token 1.0     | `endpoint`, `endpointQueryParameter`, `baseUrl`  |

mod classify;
mod error;

pub use classify::{Protocol, classify};
pub use error::ConfigError;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logger::{Level, write_line};

/// Request path used when neither `path` nor `request.path` is set.
pub const DEFAULT_PATH: &str = "/";

// ============================================================================
// root configuration
// ============================================================================

/// Configuration of the SPA integration with the CMS.
///
/// Immutable once handed to initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// Current SPA route, may carry credential query parameters
    pub path: Option<String>,
    /// Incoming request (server-side rendering)
    pub request: Option<RequestConfig>,
    /// Enable verbose diagnostic logging
    pub debug: bool,

    /// Query parameter carrying the authorization token (default `token`)
    pub authorization_query_parameter: Option<String>,
    /// Query parameter carrying the server affinity id (default `server-id`)
    pub server_id_query_parameter: Option<String>,
    /// Query parameter carrying the page model endpoint (1.0 only, no default)
    pub endpoint_query_parameter: Option<String>,

    /// Reverse-proxy environments
    pub options: Option<ProxyOptions>,

    pub api_base_url: Option<String>,
    pub cms_base_url: Option<String>,
    pub spa_base_url: Option<String>,
    pub endpoint: Option<String>,
    pub base_url: Option<String>,
    pub origin: Option<String>,
    /// Explicit page model API version (`0.9` or `1.0`)
    pub api_version: Option<String>,
}

/// Incoming request data forwarded to the page model API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestConfig {
    pub path: Option<String>,
    /// Headers forwarded as-is (e.g. `Cookie`)
    pub headers: BTreeMap<String, String>,
    /// Client address, forwarded as `X-Forwarded-For`
    pub remote_address: Option<String>,
}

/// Live and preview environments of a reverse-proxy setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyOptions {
    pub live: Option<EnvironmentOptions>,
    pub preview: Option<EnvironmentOptions>,
}

/// Base URLs of one reverse-proxy environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentOptions {
    #[serde(alias = "apiBaseUrl")]
    pub page_model_base_url: Option<String>,
    pub cms_base_url: Option<String>,
    #[serde(alias = "spaBasePath")]
    pub spa_base_url: Option<String>,
}

impl EnvironmentOptions {
    /// Check if the environment can address the page model API.
    pub fn has_base_url(&self) -> bool {
        is_set(&self.page_model_base_url) || is_set(&self.cms_base_url)
    }
}

pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Configuration {
    /// Effective request path: `path`, then `request.path`, then `/`.
    pub fn request_path(&self) -> &str {
        self.path
            .as_deref()
            .or_else(|| self.request.as_ref().and_then(|r| r.path.as_deref()))
            .unwrap_or(DEFAULT_PATH)
    }

    /// Copy of this configuration for another route.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..self.clone()
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::parse_toml_with_ignored(content)?.0)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::parse_json_with_ignored(content)?.0)
    }

    /// Load configuration from a `.toml` or `.json` file.
    ///
    /// Unknown fields are reported as warnings and otherwise ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::parse_toml_with_ignored(&content)?,
            Some("json") => Self::parse_json_with_ignored(&content)?,
            _ => return Err(ConfigError::UnknownFormat(path.to_path_buf())),
        };

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_toml_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Parse JSON content, collecting any unknown fields.
    fn parse_json_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let mut deserializer = serde_json::Deserializer::from_str(content);
        let config = serde_ignored::deserialize(&mut deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        deserializer.end()?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        write_line(
            Level::Warn,
            "config",
            &format!("ignoring unknown fields in {display_path}: {}", fields.join(", ")),
        );
    }
}

// ============================================================================
// tests
// ============================================================================
