//! Protocol classification.
//!
//! Precedence (first match wins):
//! 1. `options` without token/endpoint fields -> reverse proxy
//! 2. `endpoint`, `endpointQueryParameter` or `apiVersion = "1.0"` -> token 1.0
//! 3. anything else -> token 0.9

use std::fmt;

use super::{ConfigError, Configuration, is_set};

/// Page model API version strings.
pub const API_VERSION_09: &str = "0.9";
pub const API_VERSION_10: &str = "1.0";

/// Wire protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Reverse-proxy setup (deprecated)
    Proxy,
    /// Token-based setup, page model API 0.9
    Jwt09,
    /// Token-based setup, page model API 1.0
    Jwt10,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Jwt09 => "jwt-0.9",
            Self::Jwt10 => "jwt-1.0",
        }
    }

    /// Page model API version spoken by this variant.
    pub fn api_version(self) -> &'static str {
        match self {
            Self::Proxy | Self::Jwt09 => API_VERSION_09,
            Self::Jwt10 => API_VERSION_10,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determine the protocol variant of a configuration.
///
/// Pure: the same configuration always yields the same result.
pub fn classify(config: &Configuration) -> Result<Protocol, ConfigError> {
    let api_version = config.api_version.as_deref().map(str::trim);
    if let Some(version) = api_version
        && version != API_VERSION_09
        && version != API_VERSION_10
    {
        return Err(ConfigError::UnsupportedApiVersion(version.to_string()));
    }

    let has_endpoint = is_set(&config.endpoint) || is_set(&config.endpoint_query_parameter);
    let has_token_fields = has_endpoint
        || is_set(&config.api_base_url)
        || is_set(&config.cms_base_url)
        || api_version.is_some();

    if let Some(options) = &config.options
        && !has_token_fields
    {
        return match &options.live {
            Some(live) if live.has_base_url() => Ok(Protocol::Proxy),
            _ => Err(ConfigError::MissingLiveOptions),
        };
    }

    if has_endpoint || api_version == Some(API_VERSION_10) {
        return Ok(Protocol::Jwt10);
    }

    Ok(Protocol::Jwt09)
}
