//! Page initialization.
//!
//! One skeleton for all protocol variants:
//!
//! ```text
//! classify -> driver.prepare -> Scope -> fetch | preloaded model -> build -> Page
//!                                                                      |
//!                                             preview + CMS URL -> bridge.activate
//! ```
//!
//! Configuration errors surface before any request is made. A failed
//! initialization binds no scope, so there is nothing to destroy.

mod bridge;
mod page;
mod scope;

#[cfg(test)]
mod tests;

pub use bridge::{AuthoringBridge, BridgeOptions, NoopBridge};
pub use page::Page;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::api::{HttpClient, ReqwestClient};
use crate::config::{Configuration, classify};
use crate::driver;
use crate::error::Result;
use crate::logger::Logger;
use crate::{debug, info};
use scope::Scope;

/// Name of the lifecycle event fired once a page is ready.
pub const EVENT_INITIALIZED: &str = "br:spa:initialized";

/// Input that replaces the initial fetch.
pub enum Preloaded {
    /// Page model obtained elsewhere (e.g. embedded by a server render)
    Model(Value),
    /// Already initialized page, returned unchanged
    Page(Page),
}

type InitializedCallback = Box<dyn FnOnce(&Page) + Send>;

/// Initializer for one page.
pub struct Spa {
    configuration: Configuration,
    client: Option<Arc<dyn HttpClient>>,
    bridge: Arc<dyn AuthoringBridge>,
    on_initialized: Option<InitializedCallback>,
}

impl fmt::Debug for Spa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spa")
            .field("configuration", &self.configuration.request_path())
            .field("client", &self.client.is_some())
            .field("on_initialized", &self.on_initialized.is_some())
            .finish()
    }
}

impl Spa {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            client: None,
            bridge: Arc::new(NoopBridge),
            on_initialized: None,
        }
    }

    /// HTTP client for page model requests (default: [`ReqwestClient`]).
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn AuthoringBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    /// Called once with the page after a successful initialization.
    pub fn on_initialized(mut self, callback: impl FnOnce(&Page) + Send + 'static) -> Self {
        self.on_initialized = Some(Box::new(callback));
        self
    }

    /// Fetch the page model for the configured path and build the page.
    pub async fn initialize(self) -> Result<Page> {
        self.run(None).await
    }

    /// Build the page from preloaded input instead of fetching.
    pub async fn initialize_with(self, preloaded: Preloaded) -> Result<Page> {
        self.run(Some(preloaded)).await
    }

    async fn run(self, preloaded: Option<Preloaded>) -> Result<Page> {
        let model = match preloaded {
            Some(Preloaded::Page(page)) => return Ok(page),
            Some(Preloaded::Model(model)) => Some(model),
            None => None,
        };

        let logger = Logger::for_debug(self.configuration.debug);
        let protocol = classify(&self.configuration)?;
        debug!(logger, "spa"; "configuration classified as {}", protocol);
        let options = driver::for_protocol(protocol).prepare(&self.configuration, &logger)?;

        let client: Arc<dyn HttpClient> = match self.client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::new()),
        };
        let scope = Arc::new(Scope::new(options, client, self.bridge, logger));
        debug!(logger, "spa"; "effective options: {:?}", scope.options());

        let graph = match model {
            Some(model) => scope.build(model)?,
            None => scope.fetch().await?,
        };

        if graph.is_preview() {
            info!(logger, "spa"; "preview mode");
            scope.activate_bridge().await;
        }

        let page = Page::new(graph, scope);
        info!(logger, "spa"; "{}", EVENT_INITIALIZED);
        if let Some(callback) = self.on_initialized {
            callback(&page);
        }
        Ok(page)
    }
}

/// Destroy a page, releasing its scope. Safe to call more than once.
pub fn destroy(page: &Page) {
    page.destroy();
}
