//! Token-based setup, page model API 1.0.

use super::{EffectiveOptions, ProtocolDriver, extract_credentials, forwarded_api_options, origin_of};
use crate::config::{ConfigError, Configuration, Protocol};
use crate::logger::Logger;
use crate::url::{UrlBuilderOptions, UrlBuilderOptions10, append_search_params};
use crate::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct Jwt10Driver;

impl ProtocolDriver for Jwt10Driver {
    fn protocol(&self) -> Protocol {
        Protocol::Jwt10
    }

    fn prepare(
        &self,
        configuration: &Configuration,
        logger: &Logger,
    ) -> Result<EffectiveOptions, ConfigError> {
        info!(logger, "jwt10"; "enabled token-based setup");
        info!(logger, "jwt10"; "using page model API 1.0");

        let endpoint_parameter = configuration
            .endpoint_query_parameter
            .as_deref()
            .unwrap_or_default();
        let credentials = extract_credentials(configuration, endpoint_parameter);

        let endpoint = configuration
            .endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .or(credentials.endpoint);
        let origin = match configuration.origin.clone().filter(|o| !o.is_empty()) {
            Some(origin) => Some(origin),
            None => origin_of("endpoint", endpoint.as_deref())?,
        };
        let base_url = append_search_params(
            configuration.base_url.as_deref().unwrap_or_default(),
            &credentials.params,
        );

        if let Some(token) = &credentials.authorization_token {
            debug!(logger, "jwt10"; "token: {}", token);
        }
        if let Some(server_id) = &credentials.server_id {
            debug!(logger, "jwt10"; "server id: {}", server_id);
        }
        debug!(logger, "jwt10"; "endpoint: {:?}", endpoint);
        debug!(logger, "jwt10"; "origin: {:?}", origin);
        debug!(logger, "jwt10"; "path: {}", credentials.path);
        debug!(logger, "jwt10"; "base URL: {}", base_url);

        let mut api = forwarded_api_options(configuration);
        api.authorization_token = credentials.authorization_token;
        api.server_id = credentials.server_id;
        api.api_version = Some(Protocol::Jwt10.api_version().to_string());
        api.origin = origin;

        Ok(EffectiveOptions {
            protocol: Protocol::Jwt10,
            path: credentials.path,
            api,
            cms_url: endpoint.clone(),
            url: UrlBuilderOptions::V10(UrlBuilderOptions10 { endpoint, base_url }),
        })
    }
}
