//! Authoring side channel.
//!
//! In preview the page talks to the CMS authoring tool that embeds it. The
//! transport (window messaging, websocket, ...) lives outside this crate; the
//! pipeline only decides when the channel is opened and closed.

use async_trait::async_trait;

/// Where the authoring tool lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Origin the authoring tool is expected at
    pub origin: Option<String>,
    pub cms_url: String,
}

#[async_trait]
pub trait AuthoringBridge: Send + Sync {
    /// Open the channel for a preview page.
    async fn activate(&self, options: &BridgeOptions);

    /// Close the channel. Called at most once per activation.
    fn deactivate(&self);
}

/// Bridge for headless use: nothing to talk to.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBridge;

#[async_trait]
impl AuthoringBridge for NoopBridge {
    async fn activate(&self, _options: &BridgeOptions) {}

    fn deactivate(&self) {}
}
