//! Page model initialization and synchronization for CMS-driven single page applications.
//!
//! A [`Configuration`] is classified into one of three protocol variants,
//! the matching driver derives request and URL options, and the fetched page
//! model is normalized into a [`page::PageGraph`] held by a [`Page`] handle.
//!
//! ```ignore
//! let page = spa_page::initialize(configuration, None).await?;
//! println!("{:?}", page.get_title());
//! page.sync().await?;
//! page.destroy();
//! ```

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod logger;
pub mod page;
pub mod spa;
pub mod url;

pub use api::{HttpClient, ReqwestClient};
pub use config::{ConfigError, Configuration, Protocol, classify};
pub use error::{Result, SpaError};
pub use spa::{
    AuthoringBridge, BridgeOptions, EVENT_INITIALIZED, NoopBridge, Page, Preloaded, Spa, destroy,
};

/// Initialize a page for `configuration`, optionally from preloaded data.
///
/// Shorthand for [`Spa::initialize`] and [`Spa::initialize_with`] with the
/// default HTTP client and no authoring bridge.
pub async fn initialize(configuration: Configuration, preloaded: Option<Preloaded>) -> Result<Page> {
    let spa = Spa::new(configuration);
    match preloaded {
        Some(preloaded) => spa.initialize_with(preloaded).await,
        None => spa.initialize().await,
    }
}
