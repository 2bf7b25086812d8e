use std::collections::VecDeque;
use std::future::{Future, poll_fn};
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::Poll;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use super::*;
use crate::api::{FetchError, HttpRequest, HttpResponse, Method};
use crate::config::{ConfigError, EnvironmentOptions, ProxyOptions};
use crate::error::SpaError;

// ============================================================================
// Stubs
// ============================================================================

enum Reply {
    Ready(std::result::Result<HttpResponse, FetchError>),
    /// Answered when the test sends on the paired channel
    Gated(oneshot::Receiver<HttpResponse>),
}

#[derive(Default)]
struct StubClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubClient {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        self.requests.lock().push(request);

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx.await.map_err(|_| FetchError::Transport {
                url,
                message: "gate dropped".to_string(),
            }),
            None => Err(FetchError::Transport {
                url,
                message: "no reply queued".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct CountingBridge {
    activated: AtomicUsize,
    deactivated: AtomicUsize,
    options: Mutex<Option<BridgeOptions>>,
}

#[async_trait]
impl AuthoringBridge for CountingBridge {
    async fn activate(&self, options: &BridgeOptions) {
        self.activated.fetch_add(1, Ordering::SeqCst);
        *self.options.lock() = Some(options.clone());
    }

    fn deactivate(&self) {
        self.deactivated.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn response(model: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: model.to_string(),
    }
}

fn ok(model: Value) -> Reply {
    Reply::Ready(Ok(response(model)))
}

/// 1.0 model: root > container `main` > one item per name, `ctype` upper-cased.
fn model(items: &[&str], preview: bool) -> Value {
    let mut page = serde_json::Map::new();
    page.insert(
        "r".to_string(),
        json!({ "id": "r", "type": "component", "children": [{ "$ref": "/page/main" }] }),
    );
    let children: Vec<Value> = items
        .iter()
        .map(|item| json!({ "$ref": format!("/page/{item}") }))
        .collect();
    page.insert(
        "main".to_string(),
        json!({ "id": "r_main", "type": "container", "name": "main", "children": children }),
    );
    for item in items {
        page.insert(
            item.to_string(),
            json!({
                "id": format!("r_main_{item}"),
                "type": "container-item",
                "name": item,
                "ctype": item.to_uppercase(),
                "links": { "self": { "href": format!("/site/resourceapi?_hn:ref=r_main_{item}") } }
            }),
        );
    }
    json!({ "root": { "$ref": "/page/r" }, "meta": { "preview": preview }, "page": page })
}

fn labels(page: &Page) -> Vec<String> {
    page.get_component_at(&["main"])
        .map(|main| {
            main.children()
                .iter()
                .map(|item| item.render_key().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn jwt10() -> Configuration {
    Configuration {
        endpoint: Some("http://cms/site/resourceapi".to_string()),
        path: Some("/?token=abc".to_string()),
        ..Default::default()
    }
}

/// Poll a future once so it reaches its first suspension point.
async fn poll_once<F: Future + Unpin>(future: &mut F) {
    poll_fn(|cx| {
        let _ = Pin::new(&mut *future).poll(cx);
        Poll::Ready(())
    })
    .await
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn test_proxy_end_to_end() {
    let client = StubClient::new([ok(json!({
        "page": { "id": "r", "type": "component", "components": [
            { "id": "r_main", "type": "container", "name": "main", "components": [
                { "id": "r_main_a", "type": "container-item", "name": "a", "label": "A" },
                { "id": "r_main_b", "type": "container-item", "name": "b", "label": "B" }
            ]}
        ]},
        "content": {}
    }))]);
    let configuration = Configuration {
        path: Some("/news".to_string()),
        options: Some(ProxyOptions {
            live: Some(EnvironmentOptions {
                page_model_base_url: Some("http://localhost:8080/site/resourceapi".to_string()),
                ..Default::default()
            }),
            preview: None,
        }),
        ..Default::default()
    };

    let page = Spa::new(configuration)
        .with_http_client(client.clone())
        .initialize()
        .await
        .unwrap();

    assert_eq!(labels(&page), ["A", "B"]);
    assert!(!page.is_preview());

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, "http://localhost:8080/site/resourceapi/news");
    assert!(requests[0].header("Authorization").is_none());
}

#[tokio::test]
async fn test_jwt09_credentials_forwarded() {
    let client = StubClient::new([ok(model(&["a"], false))]);
    let configuration = Configuration {
        path: Some("/?token=abc123&server-id=s1".to_string()),
        cms_base_url: Some("http://localhost:8080/site".to_string()),
        ..Default::default()
    };

    Spa::new(configuration)
        .with_http_client(client.clone())
        .initialize()
        .await
        .unwrap();

    let request = &client.requests()[0];
    assert_eq!(request.url, "http://localhost:8080/site/resourceapi");
    assert_eq!(request.header("Authorization"), Some("Bearer abc123"));
    assert_eq!(request.header("Server-Id"), Some("s1"));
    assert!(request.header("Accept-Version").is_none());
}

#[tokio::test]
async fn test_config_error_before_fetch() {
    let client = StubClient::new([]);
    let configuration = Configuration {
        api_version: Some("2.0".to_string()),
        ..Default::default()
    };

    let result = Spa::new(configuration)
        .with_http_client(client.clone())
        .initialize()
        .await;

    assert!(matches!(
        result,
        Err(SpaError::Config(ConfigError::UnsupportedApiVersion(_)))
    ));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_build_error_surfaces() {
    let client = StubClient::new([ok(json!({ "content": {} }))]);
    let result = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await;
    assert!(matches!(result, Err(SpaError::Build(_))));
}

#[tokio::test]
async fn test_preloaded_model_skips_fetch() {
    let client = StubClient::new([]);
    let page = Spa::new(jwt10())
        .with_http_client(client.clone())
        .initialize_with(Preloaded::Model(model(&["a", "b"], false)))
        .await
        .unwrap();

    assert_eq!(labels(&page), ["A", "B"]);
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_channel_parameters() {
    let mut value = model(&["a"], false);
    value["channel"] = json!({ "info": { "props": { "theme": "dark" } } });
    let page = Spa::new(jwt10())
        .with_http_client(StubClient::new([]))
        .initialize_with(Preloaded::Model(value))
        .await
        .unwrap();

    assert_eq!(page.get_channel_parameters()["theme"], "dark");
    assert!(page.get_title().is_none());
}

#[tokio::test]
async fn test_preloaded_page_short_circuits() {
    let client = StubClient::new([ok(model(&["a"], false))]);
    let page = Spa::new(jwt10())
        .with_http_client(client.clone())
        .initialize()
        .await
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let again = Spa::new(Configuration {
        api_version: Some("2.0".to_string()),
        ..Default::default()
    })
    .on_initialized(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .initialize_with(Preloaded::Page(page.clone()))
    .await
    .unwrap();

    assert_eq!(labels(&again), ["A"]);
    assert_eq!(client.requests().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_on_initialized_called_once() {
    let client = StubClient::new([ok(model(&["a"], false))]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let page = Spa::new(jwt10())
        .with_http_client(client)
        .on_initialized(move |page| sink.lock().push(page.get_component().id().to_string()))
        .initialize()
        .await
        .unwrap();
    page.sync().await.unwrap_err();

    assert_eq!(*seen.lock(), ["r"]);
}

// ============================================================================
// Preview & destroy
// ============================================================================

#[tokio::test]
async fn test_preview_activates_bridge() {
    let client = StubClient::new([ok(model(&["a"], true))]);
    let bridge = Arc::new(CountingBridge::default());

    let page = Spa::new(jwt10())
        .with_http_client(client)
        .with_bridge(bridge.clone())
        .initialize()
        .await
        .unwrap();

    assert!(page.is_preview());
    assert_eq!(bridge.activated.load(Ordering::SeqCst), 1);
    assert_eq!(
        *bridge.options.lock(),
        Some(BridgeOptions {
            origin: Some("http://cms".to_string()),
            cms_url: "http://cms/site/resourceapi".to_string(),
        })
    );
}

#[tokio::test]
async fn test_live_page_keeps_bridge_closed() {
    let client = StubClient::new([ok(model(&["a"], false))]);
    let bridge = Arc::new(CountingBridge::default());

    let page = Spa::new(jwt10())
        .with_http_client(client)
        .with_bridge(bridge.clone())
        .initialize()
        .await
        .unwrap();
    page.destroy();

    assert_eq!(bridge.activated.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.deactivated.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_double_destroy_releases_once() {
    let client = StubClient::new([ok(model(&["a"], true))]);
    let bridge = Arc::new(CountingBridge::default());

    let page = Spa::new(jwt10())
        .with_http_client(client.clone())
        .with_bridge(bridge.clone())
        .initialize()
        .await
        .unwrap();

    page.destroy();
    destroy(&page);
    page.clone().destroy();

    assert!(page.is_destroyed());
    assert_eq!(bridge.deactivated.load(Ordering::SeqCst), 1);
    assert!(matches!(page.sync().await, Err(SpaError::Destroyed)));
    assert_eq!(client.requests().len(), 1);
    // last graph stays readable
    assert_eq!(labels(&page), ["A"]);
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_sync_replaces_graph() {
    let client = StubClient::new([ok(model(&["a"], false)), ok(model(&["a", "b"], false))]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();
    let handle = page.clone();

    page.sync().await.unwrap();

    assert_eq!(labels(&handle), ["A", "B"]);
}

#[tokio::test]
async fn test_sync_later_initiated_wins() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let client = StubClient::new([
        ok(model(&["a"], false)),
        Reply::Gated(first_rx),
        Reply::Gated(second_rx),
    ]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();

    let mut first = pin!(page.sync());
    let mut second = pin!(page.sync());
    poll_once(&mut first).await;
    poll_once(&mut second).await;

    // the later sync resolves first
    second_tx.send(response(model(&["b"], false))).unwrap();
    second.await.unwrap();
    assert_eq!(labels(&page), ["B"]);

    // the earlier one arrives late and is discarded
    first_tx.send(response(model(&["c"], false))).unwrap();
    first.await.unwrap();
    assert_eq!(labels(&page), ["B"]);
}

#[tokio::test]
async fn test_sync_in_completion_order() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let client = StubClient::new([
        ok(model(&["a"], false)),
        Reply::Gated(first_rx),
        Reply::Gated(second_rx),
    ]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();

    let mut first = pin!(page.sync());
    let mut second = pin!(page.sync());
    poll_once(&mut first).await;
    poll_once(&mut second).await;

    first_tx.send(response(model(&["b"], false))).unwrap();
    first.await.unwrap();
    assert_eq!(labels(&page), ["B"]);

    second_tx.send(response(model(&["c"], false))).unwrap();
    second.await.unwrap();
    assert_eq!(labels(&page), ["C"]);
}

#[tokio::test]
async fn test_sync_failure_keeps_graph() {
    let client = StubClient::new([
        ok(model(&["a"], false)),
        Reply::Ready(Ok(HttpResponse {
            status: 500,
            body: String::new(),
        })),
        ok(json!({ "page": {} })),
    ]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();

    assert!(matches!(
        page.sync().await,
        Err(SpaError::Fetch(FetchError::Status { status: 500, .. }))
    ));
    assert!(matches!(page.sync().await, Err(SpaError::Build(_))));
    assert_eq!(labels(&page), ["A"]);
}

#[tokio::test]
async fn test_sync_after_destroy_in_flight_discarded() {
    let (tx, rx) = oneshot::channel();
    let client = StubClient::new([ok(model(&["a"], false)), Reply::Gated(rx)]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();

    let mut sync = pin!(page.sync());
    poll_once(&mut sync).await;
    page.destroy();

    tx.send(response(model(&["b"], false))).unwrap();
    sync.await.unwrap();
    assert_eq!(labels(&page), ["A"]);
}

// ============================================================================
// Component updates
// ============================================================================

#[tokio::test]
async fn test_update_component_merges() {
    let client = StubClient::new([
        ok(model(&["a", "b"], false)),
        ok(json!({
            "root": { "$ref": "/page/x" },
            "page": {
                "x": { "id": "r_main_a", "type": "container-item", "name": "a", "ctype": "VIDEO" }
            }
        })),
    ]);
    let page = Spa::new(jwt10())
        .with_http_client(client.clone())
        .initialize()
        .await
        .unwrap();

    page.update_component("r_main_a", &[("color", "red")])
        .await
        .unwrap();

    assert_eq!(labels(&page), ["VIDEO", "B"]);

    let request = &client.requests()[1];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://cms/site/resourceapi?_hn:ref=r_main_a");
    assert_eq!(request.body.as_deref(), Some("color=red"));
    assert_eq!(request.header("Authorization"), Some("Bearer abc"));
}

#[tokio::test]
async fn test_update_unknown_component() {
    let client = StubClient::new([ok(model(&["a"], false))]);
    let page = Spa::new(jwt10())
        .with_http_client(client)
        .initialize()
        .await
        .unwrap();

    assert!(matches!(
        page.update_component("nope", &[]).await,
        Err(SpaError::UnknownComponent(id)) if id == "nope"
    ));
}
