//! Reverse-proxy setup (deprecated).

use super::{EffectiveOptions, ProtocolDriver, forwarded_api_options, origin_of};
use crate::config::{ConfigError, Configuration, EnvironmentOptions, Protocol};
use crate::logger::Logger;
use crate::url::{UrlBuilderOptions, UrlBuilderOptions09, is_matched};
use crate::{debug, info, warn};

/// Picks the live or preview environment by request path; no credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyDriver;

impl ProxyDriver {
    /// Preview when the request path lies under a non-empty preview base path.
    fn select<'a>(
        configuration: &'a Configuration,
        path: &str,
    ) -> Result<(&'a EnvironmentOptions, bool), ConfigError> {
        let options = configuration
            .options
            .as_ref()
            .ok_or(ConfigError::MissingLiveOptions)?;

        if let Some(preview) = &options.preview
            && let Some(base) = preview.spa_base_url.as_deref().filter(|b| !b.is_empty())
            && preview.has_base_url()
            && is_matched(path, base)
        {
            return Ok((preview, true));
        }

        options
            .live
            .as_ref()
            .filter(|live| live.has_base_url())
            .map(|live| (live, false))
            .ok_or(ConfigError::MissingLiveOptions)
    }
}

impl ProtocolDriver for ProxyDriver {
    fn protocol(&self) -> Protocol {
        Protocol::Proxy
    }

    fn prepare(
        &self,
        configuration: &Configuration,
        logger: &Logger,
    ) -> Result<EffectiveOptions, ConfigError> {
        info!(logger, "proxy"; "enabled reverse-proxy based setup");
        warn!(logger, "proxy"; "this setup is deprecated and will not work in the next major release");

        let path = configuration.request_path();
        let (environment, preview) = Self::select(configuration, path)?;
        info!(logger, "proxy"; "using {} configuration", if preview { "preview" } else { "live" });

        let api_base_url = environment.page_model_base_url.clone();
        let cms_base_url = environment.cms_base_url.clone();
        let origin = match origin_of("pageModelBaseUrl", api_base_url.as_deref())? {
            Some(origin) => Some(origin),
            None => origin_of("cmsBaseUrl", cms_base_url.as_deref())?,
        };

        debug!(logger, "proxy"; "path: {}", path);
        debug!(logger, "proxy"; "base URL: {:?}", environment.spa_base_url);

        let mut api = forwarded_api_options(configuration);
        api.origin = origin;

        Ok(EffectiveOptions {
            protocol: Protocol::Proxy,
            path: path.to_string(),
            api,
            cms_url: preview
                .then(|| cms_base_url.clone().or_else(|| api_base_url.clone()))
                .flatten(),
            url: UrlBuilderOptions::V09(UrlBuilderOptions09 {
                api_base_url,
                cms_base_url,
                spa_base_url: environment.spa_base_url.clone().unwrap_or_default(),
            }),
        })
    }
}
