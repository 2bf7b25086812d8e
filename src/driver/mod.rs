//! Protocol drivers.
//!
//! Each driver turns a [`Configuration`] into [`EffectiveOptions`] for one
//! protocol variant. The fetch/build/teardown skeleton is shared and lives in
//! [`crate::spa`]; drivers only own the option-derivation rules.
//!
//! ```text
//! Configuration --classify--> Protocol --driver--> EffectiveOptions --> Scope
//! ```

mod jwt09;
mod jwt10;
mod proxy;

pub use jwt09::Jwt09Driver;
pub use jwt10::Jwt10Driver;
pub use proxy::ProxyDriver;

use crate::api::ApiOptions;
use crate::config::{ConfigError, Configuration, Protocol};
use crate::logger::Logger;
use crate::spa::BridgeOptions;
use crate::url::{SearchParams, UrlBuilderOptions, extract_search_params, parse_origin};

pub const DEFAULT_AUTHORIZATION_PARAMETER: &str = "token";
pub const DEFAULT_SERVER_ID_PARAMETER: &str = "server-id";

/// Protocol-specific request parameters derived for one initialization.
///
/// Built once per `initialize` call and consumed when the scope's services
/// are constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub protocol: Protocol,
    /// Request path with credential parameters removed
    pub path: String,
    pub api: ApiOptions,
    pub url: UrlBuilderOptions,
    /// CMS location for the authoring side channel, when the variant has one
    pub cms_url: Option<String>,
}

impl EffectiveOptions {
    pub fn authorization_token(&self) -> Option<&str> {
        self.api.authorization_token.as_deref()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.api.server_id.as_deref()
    }

    pub fn origin(&self) -> Option<&str> {
        self.api.origin.as_deref()
    }

    /// Authoring bridge options, `None` when the variant supplies no CMS URL.
    pub fn bridge_options(&self) -> Option<BridgeOptions> {
        self.cms_url.as_ref().map(|cms_url| BridgeOptions {
            origin: self.api.origin.clone(),
            cms_url: cms_url.clone(),
        })
    }
}

/// Derives effective options for one protocol variant.
pub trait ProtocolDriver: Send + Sync {
    fn protocol(&self) -> Protocol;

    fn prepare(
        &self,
        configuration: &Configuration,
        logger: &Logger,
    ) -> Result<EffectiveOptions, ConfigError>;
}

/// Driver for a classified protocol.
pub fn for_protocol(protocol: Protocol) -> &'static dyn ProtocolDriver {
    match protocol {
        Protocol::Proxy => &ProxyDriver,
        Protocol::Jwt09 => &Jwt09Driver,
        Protocol::Jwt10 => &Jwt10Driver,
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Credentials pulled out of the request path.
struct Credentials {
    path: String,
    params: SearchParams,
    authorization_token: Option<String>,
    server_id: Option<String>,
    endpoint: Option<String>,
}

/// Extract token, server id and (1.0) endpoint parameters from the request path.
fn extract_credentials(configuration: &Configuration, endpoint_parameter: &str) -> Credentials {
    let authorization_parameter = configuration
        .authorization_query_parameter
        .as_deref()
        .unwrap_or(DEFAULT_AUTHORIZATION_PARAMETER);
    let server_id_parameter = configuration
        .server_id_query_parameter
        .as_deref()
        .unwrap_or(DEFAULT_SERVER_ID_PARAMETER);

    let (path, params) = extract_search_params(
        configuration.request_path(),
        &[authorization_parameter, server_id_parameter, endpoint_parameter],
    );

    let get = |name: &str| {
        (!name.is_empty())
            .then(|| params.get(name))
            .flatten()
            .map(str::to_string)
    };

    Credentials {
        authorization_token: get(authorization_parameter),
        server_id: get(server_id_parameter),
        endpoint: get(endpoint_parameter),
        path,
        params,
    }
}

/// Origin of a configured absolute URL.
///
/// Empty and relative values have no origin; values with a scheme separator
/// that still fail to parse are configuration errors.
fn origin_of(field: &'static str, value: Option<&str>) -> Result<Option<String>, ConfigError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    match parse_origin(value) {
        Some(origin) => Ok(Some(origin)),
        None if value.contains("://") => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
        None => Ok(None),
    }
}

/// Request data forwarded by every variant.
fn forwarded_api_options(configuration: &Configuration) -> ApiOptions {
    let request = configuration.request.clone().unwrap_or_default();
    ApiOptions {
        headers: request.headers,
        remote_address: request.remote_address,
        ..Default::default()
    }
}
