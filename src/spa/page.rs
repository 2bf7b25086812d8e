//! Page handle.
//!
//! The handle keeps its identity across updates: `sync` and
//! `update_component` swap the graph behind it atomically, so readers see
//! either the old or the new graph, never a mix.
//!
//! Each update takes a generation number when it is called. Its result is
//! applied only if no later-called update has been applied already:
//!
//! ```text
//! sync #1 ----------------------------> done (discarded, #2 already applied)
//!    sync #2 ------------> done (applied)
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::scope::Scope;
use crate::error::{Result, SpaError};
use crate::page::{Component, Content, JsonMap, Link, PageGraph};
use crate::{debug, info};

/// Handle to an initialized page. Cloning yields another handle to the same page.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageState>,
}

struct PageState {
    graph: ArcSwap<PageGraph>,
    /// `None` once destroyed
    scope: Mutex<Option<Arc<Scope>>>,
    /// Last generation handed out
    issued: AtomicU64,
    /// Generation of the graph currently held
    applied: Mutex<u64>,
}

impl Page {
    pub(crate) fn new(graph: PageGraph, scope: Arc<Scope>) -> Self {
        Self {
            inner: Arc::new(PageState {
                graph: ArcSwap::from_pointee(graph),
                scope: Mutex::new(Some(scope)),
                issued: AtomicU64::new(0),
                applied: Mutex::new(0),
            }),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Snapshot of the current graph.
    pub fn graph(&self) -> Arc<PageGraph> {
        self.inner.graph.load_full()
    }

    /// Root component.
    pub fn get_component(&self) -> Arc<Component> {
        Arc::clone(self.inner.graph.load().root())
    }

    /// Component by child names from the root, e.g. `["main", "banner"]`.
    pub fn get_component_at(&self, names: &[&str]) -> Option<Arc<Component>> {
        self.inner.graph.load().get_component(names).cloned()
    }

    pub fn get_component_by_id(&self, id: &str) -> Option<Arc<Component>> {
        self.inner.graph.load().get_component_by_id(id).cloned()
    }

    /// Content behind a reference; `None` if the reference resolves to nothing.
    pub fn get_content(&self, reference: impl AsRef<str>) -> Option<Arc<Content>> {
        self.inner.graph.load().get_content(reference)
    }

    pub fn get_document(&self) -> Option<Arc<Content>> {
        self.inner.graph.load().get_document()
    }

    pub fn get_title(&self) -> Option<String> {
        self.inner.graph.load().title().map(str::to_string)
    }

    pub fn get_url(&self, link: &Link) -> Option<String> {
        self.inner.graph.load().get_url(link)
    }

    pub fn get_channel_parameters(&self) -> JsonMap {
        self.inner.graph.load().channel_parameters()
    }

    pub fn is_preview(&self) -> bool {
        self.inner.graph.load().is_preview()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.scope.lock().is_none()
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Re-fetch the page and replace the graph.
    ///
    /// The generation is taken when this is called, not when the returned
    /// future is first polled. On failure the current graph stays in place.
    pub fn sync(&self) -> impl Future<Output = Result<()>> + Send + use<> {
        let state = Arc::clone(&self.inner);
        let generation = state.next_generation();
        let scope = state.scope.lock().clone();

        async move {
            let scope = scope.ok_or(SpaError::Destroyed)?;
            let graph = scope.fetch().await?;
            state.commit(generation, graph, &scope);
            Ok(())
        }
    }

    /// Re-fetch one component with changed parameters and merge it into the page.
    ///
    /// The component is looked up in the graph current at call time.
    pub fn update_component(
        &self,
        id: &str,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<()>> + Send + use<> {
        let state = Arc::clone(&self.inner);
        let generation = state.next_generation();
        let scope = state.scope.lock().clone();
        let base = state.graph.load_full();
        let id = id.to_string();
        let params: Vec<(String, String)> = params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        async move {
            let scope = scope.ok_or(SpaError::Destroyed)?;
            let component = base
                .get_component_by_id(&id)
                .ok_or_else(|| SpaError::UnknownComponent(id.clone()))?;
            let url = component
                .model_url()
                .ok_or_else(|| SpaError::MissingComponentUrl(id.clone()))?
                .to_string();
            let target = component.reference().clone();

            let graph = scope
                .fetch_component(base.document(), &target, &url, &params)
                .await?;
            state.commit(generation, graph, &scope);
            Ok(())
        }
    }

    /// Release the page's scope. Further calls are no-ops.
    pub fn destroy(&self) {
        let scope = self.inner.scope.lock().take();
        if let Some(scope) = scope
            && scope.release()
        {
            info!(scope.logger(), "page"; "destroyed");
        }
    }
}

impl PageState {
    fn next_generation(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply `graph` unless a later update was applied or the page was destroyed.
    fn commit(&self, generation: u64, graph: PageGraph, scope: &Scope) -> bool {
        let mut applied = self.applied.lock();

        if self.scope.lock().is_none() {
            debug!(scope.logger(), "page"; "discarding update #{} of destroyed page", generation);
            return false;
        }
        if generation <= *applied {
            debug!(scope.logger(), "page"; "discarding update #{}, #{} already applied", generation, *applied);
            return false;
        }

        *applied = generation;
        self.graph.store(Arc::new(graph));
        debug!(scope.logger(), "page"; "applied update #{}", generation);
        true
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("graph", &self.graph())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
