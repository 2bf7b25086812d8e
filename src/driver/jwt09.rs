//! Token-based setup, page model API 0.9 (deprecated).

use super::{EffectiveOptions, ProtocolDriver, extract_credentials, forwarded_api_options, origin_of};
use crate::config::{ConfigError, Configuration, Protocol};
use crate::logger::Logger;
use crate::url::{UrlBuilderOptions, UrlBuilderOptions09, append_search_params};
use crate::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct Jwt09Driver;

impl ProtocolDriver for Jwt09Driver {
    fn protocol(&self) -> Protocol {
        Protocol::Jwt09
    }

    fn prepare(
        &self,
        configuration: &Configuration,
        logger: &Logger,
    ) -> Result<EffectiveOptions, ConfigError> {
        info!(logger, "jwt09"; "enabled token-based setup");
        info!(logger, "jwt09"; "using page model API 0.9");
        warn!(logger, "jwt09"; "this version of the page model API is deprecated and will be removed in the next major release");

        let credentials = extract_credentials(configuration, "");

        let origin = match configuration.origin.clone().filter(|o| !o.is_empty()) {
            Some(origin) => Some(origin),
            None => origin_of(
                if configuration.api_base_url.is_some() { "apiBaseUrl" } else { "cmsBaseUrl" },
                configuration
                    .api_base_url
                    .as_deref()
                    .or(configuration.cms_base_url.as_deref()),
            )?,
        };
        let spa_base_url = append_search_params(
            configuration.spa_base_url.as_deref().unwrap_or_default(),
            &credentials.params,
        );

        if let Some(token) = &credentials.authorization_token {
            debug!(logger, "jwt09"; "token: {}", token);
        }
        if let Some(server_id) = &credentials.server_id {
            debug!(logger, "jwt09"; "server id: {}", server_id);
        }
        debug!(logger, "jwt09"; "origin: {:?}", origin);
        debug!(logger, "jwt09"; "path: {}", credentials.path);
        debug!(logger, "jwt09"; "base URL: {}", spa_base_url);

        let mut api = forwarded_api_options(configuration);
        api.authorization_token = credentials.authorization_token;
        api.server_id = credentials.server_id;
        api.origin = origin;

        Ok(EffectiveOptions {
            protocol: Protocol::Jwt09,
            path: credentials.path,
            api,
            cms_url: configuration.cms_base_url.clone().filter(|url| !url.is_empty()),
            url: UrlBuilderOptions::V09(UrlBuilderOptions09 {
                api_base_url: configuration.api_base_url.clone(),
                cms_base_url: configuration.cms_base_url.clone(),
                spa_base_url,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_and_server_id_extracted() {
        let configuration = Configuration {
            path: Some("/?token=abc123&server-id=s1".to_string()),
            ..Default::default()
        };
        let options = Jwt09Driver.prepare(&configuration, &Logger::default()).unwrap();

        assert_eq!(options.protocol, Protocol::Jwt09);
        assert_eq!(options.authorization_token(), Some("abc123"));
        assert_eq!(options.server_id(), Some("s1"));
        assert_eq!(options.path, "/");
    }

    #[test]
    fn test_origin_from_cms_base_url() {
        let configuration = Configuration {
            cms_base_url: Some("http://localhost:8080/site".to_string()),
            spa_base_url: Some("/app".to_string()),
            path: Some("/news?token=t".to_string()),
            ..Default::default()
        };
        let options = Jwt09Driver.prepare(&configuration, &Logger::default()).unwrap();

        assert_eq!(options.origin(), Some("http://localhost:8080"));
        assert_eq!(options.cms_url.as_deref(), Some("http://localhost:8080/site"));
        assert!(matches!(
            options.url,
            UrlBuilderOptions::V09(ref url) if url.spa_base_url == "/app?token=t"
        ));
    }

    #[test]
    fn test_explicit_origin_wins() {
        let configuration = Configuration {
            api_base_url: Some("http://internal:8080/site/resourceapi".to_string()),
            origin: Some("https://public.example.com".to_string()),
            ..Default::default()
        };
        let options = Jwt09Driver.prepare(&configuration, &Logger::default()).unwrap();
        assert_eq!(options.origin(), Some("https://public.example.com"));
        assert!(options.bridge_options().is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let configuration = Configuration {
            cms_base_url: Some("http://".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Jwt09Driver.prepare(&configuration, &Logger::default()),
            Err(ConfigError::InvalidUrl { field: "cmsBaseUrl", .. })
        ));
    }
}
