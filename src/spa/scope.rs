//! Per-page service bindings.
//!
//! A scope is created by one `initialize` call and owned by the page it
//! produced. Fetcher and URL builder are rebuilt from the effective options
//! for every fetch; the authoring bridge lives as long as the scope and is
//! closed when the scope is released.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use super::AuthoringBridge;
use crate::api::{Api, HttpClient};
use crate::driver::EffectiveOptions;
use crate::error::Result;
use crate::logger::Logger;
use crate::page::{self, PageDocument, PageGraph};
use crate::url::UrlBuilder;
use crate::{debug, error};

pub(crate) struct Scope {
    options: EffectiveOptions,
    client: Arc<dyn HttpClient>,
    bridge: Arc<dyn AuthoringBridge>,
    bridge_active: AtomicBool,
    released: AtomicBool,
    logger: Logger,
}

impl Scope {
    pub(crate) fn new(
        options: EffectiveOptions,
        client: Arc<dyn HttpClient>,
        bridge: Arc<dyn AuthoringBridge>,
        logger: Logger,
    ) -> Self {
        Self {
            options,
            client,
            bridge,
            bridge_active: AtomicBool::new(false),
            released: AtomicBool::new(false),
            logger,
        }
    }

    #[inline]
    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    #[inline]
    pub(crate) fn options(&self) -> &EffectiveOptions {
        &self.options
    }

    /// Fresh fetcher and URL builder for one request.
    fn services(&self) -> (Api, Arc<dyn UrlBuilder>) {
        let url_builder = self.options.url.clone().into_builder();
        let api = Api::new(
            self.options.api.clone(),
            Arc::clone(&self.client),
            Arc::clone(&url_builder),
        );
        (api, url_builder)
    }

    /// Fetch and build the page for the scope's request path.
    pub(crate) async fn fetch(&self) -> Result<PageGraph> {
        let (api, url_builder) = self.services();
        let path = &self.options.path;
        debug!(self.logger, "scope"; "fetching page model for {}", path);

        let model = api.get_page(path).await.inspect_err(|e| {
            error!(self.logger, "scope"; "page model request failed: {}", e);
        })?;
        self.build_with(model, url_builder)
    }

    /// Build a page from an already available model.
    pub(crate) fn build(&self, model: Value) -> Result<PageGraph> {
        self.build_with(model, self.options.url.clone().into_builder())
    }

    /// Re-fetch one component and merge it into `base`.
    pub(crate) async fn fetch_component(
        &self,
        base: &PageDocument,
        target: &page::Reference,
        url: &str,
        params: &[(String, String)],
    ) -> Result<PageGraph> {
        let (api, url_builder) = self.services();
        debug!(self.logger, "scope"; "fetching component {} from {}", target, url);

        let model = api.get_component(url, params).await.inspect_err(|e| {
            error!(self.logger, "scope"; "component request failed: {}", e);
        })?;
        let partial = PageDocument::from_value(model)?;
        let merged = base.merged_with(partial, target);
        Ok(page::build(merged, url_builder)?)
    }

    fn build_with(&self, model: Value, url_builder: Arc<dyn UrlBuilder>) -> Result<PageGraph> {
        let document = PageDocument::from_value(model)?;
        let graph = page::build(document, url_builder).inspect_err(|e| {
            error!(self.logger, "scope"; "invalid page model: {}", e);
        })?;
        debug!(self.logger, "scope"; "built {:?}", graph);
        Ok(graph)
    }

    /// Open the authoring bridge when the variant supplies a CMS URL.
    pub(crate) async fn activate_bridge(&self) {
        let Some(options) = self.options.bridge_options() else {
            debug!(self.logger, "scope"; "no CMS URL, authoring bridge stays closed");
            return;
        };
        debug!(self.logger, "scope"; "activating authoring bridge for {}", options.cms_url);

        self.bridge.activate(&options).await;
        self.bridge_active.store(true, Ordering::SeqCst);

        // released while activating
        if self.released.load(Ordering::SeqCst) && self.bridge_active.swap(false, Ordering::SeqCst) {
            self.bridge.deactivate();
        }
    }

    /// Release the scope. Returns `false` if it was already released.
    pub(crate) fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        if self.bridge_active.swap(false, Ordering::SeqCst) {
            self.bridge.deactivate();
        }
        debug!(self.logger, "scope"; "released {} scope for {}", self.options.protocol, self.options.path);
        true
    }
}
