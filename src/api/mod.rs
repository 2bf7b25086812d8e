//! Page model API access.
//!
//! The HTTP transport is a collaborator behind [`HttpClient`]; this module
//! only decides what to request and how to read the answer. Retries and
//! timeouts belong to the client.

mod client;

pub use client::ReqwestClient;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::url::{UrlBuilder, parse_url};

// ============================================================================
// HTTP collaborator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Form-encoded body (POST only)
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Sends page model requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Network, status and decoding failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to `{url}` returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid page model JSON from `{url}`")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Api
// ============================================================================

/// Credentials and forwarded request data for page model requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiOptions {
    pub authorization_token: Option<String>,
    pub server_id: Option<String>,
    /// Sent as `Accept-Version` when set
    pub api_version: Option<String>,
    /// Headers forwarded from the incoming request
    pub headers: BTreeMap<String, String>,
    /// Sent as `X-Forwarded-For`
    pub remote_address: Option<String>,
    /// Prefix for relative component URLs
    pub origin: Option<String>,
}

// Tokens stay out of `{:?}` output.
impl fmt::Debug for ApiOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiOptions")
            .field("authorization_token", &self.authorization_token.as_ref().map(|_| "***"))
            .field("server_id", &self.server_id)
            .field("api_version", &self.api_version)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("remote_address", &self.remote_address)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Page model fetcher bound to one scope.
pub struct Api {
    options: ApiOptions,
    client: Arc<dyn HttpClient>,
    url_builder: Arc<dyn UrlBuilder>,
}

impl Api {
    pub fn new(
        options: ApiOptions,
        client: Arc<dyn HttpClient>,
        url_builder: Arc<dyn UrlBuilder>,
    ) -> Self {
        Self {
            options,
            client,
            url_builder,
        }
    }

    pub fn options(&self) -> &ApiOptions {
        &self.options
    }

    /// Fetch the page model for an SPA route.
    pub async fn get_page(&self, path: &str) -> Result<Value, FetchError> {
        let request = HttpRequest {
            method: Method::Get,
            url: self.url_builder.api_url(path),
            headers: self.headers(),
            body: None,
        };
        self.send_json(request).await
    }

    /// Re-fetch one component model with changed parameters.
    pub async fn get_component(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Value, FetchError> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();

        let mut headers = self.headers();
        headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));

        let request = HttpRequest {
            method: Method::Post,
            url: self.absolute(url),
            headers,
            body: Some(body),
        };
        self.send_json(request).await
    }

    fn absolute(&self, url: &str) -> String {
        match &self.options.origin {
            Some(origin) if !parse_url(url).is_absolute() => {
                format!("{}/{}", origin.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let options = &self.options;
        let mut headers: Vec<(String, String)> = options
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if let Some(address) = &options.remote_address {
            headers.push(("X-Forwarded-For".to_string(), address.clone()));
        }
        if let Some(token) = &options.authorization_token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        if let Some(server_id) = &options.server_id {
            headers.push(("Server-Id".to_string(), server_id.clone()));
        }
        if let Some(version) = &options.api_version {
            headers.push(("Accept-Version".to_string(), version.clone()));
        }

        headers
    }

    async fn send_json(&self, request: HttpRequest) -> Result<Value, FetchError> {
        let url = request.url.clone();
        let response = self.client.send(request).await?;

        if !(200..300).contains(&response.status) {
            return Err(FetchError::Status {
                url,
                status: response.status,
            });
        }

        serde_json::from_str(&response.body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::{UrlBuilder10, UrlBuilderOptions10};
    use parking_lot::Mutex;

    /// Records requests and answers with a fixed response.
    struct Recorder {
        requests: Mutex<Vec<HttpRequest>>,
        response: HttpResponse,
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
            self.requests.lock().push(request);
            Ok(self.response.clone())
        }
    }

    fn api(options: ApiOptions, status: u16, body: &str) -> (Api, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            requests: Mutex::new(Vec::new()),
            response: HttpResponse {
                status,
                body: body.to_string(),
            },
        });
        let builder = Arc::new(UrlBuilder10::new(UrlBuilderOptions10 {
            endpoint: Some("http://cms/site/resourceapi".to_string()),
            base_url: String::new(),
        }));
        (Api::new(options, recorder.clone(), builder), recorder)
    }

    #[tokio::test]
    async fn test_get_page_headers() {
        let options = ApiOptions {
            authorization_token: Some("abc123".to_string()),
            server_id: Some("s1".to_string()),
            api_version: Some("1.0".to_string()),
            headers: BTreeMap::from([("Cookie".to_string(), "JSESSIONID=1".to_string())]),
            remote_address: Some("10.0.0.1".to_string()),
            origin: None,
        };
        let (api, recorder) = api(options, 200, "{}");

        api.get_page("/news").await.unwrap();

        let requests = recorder.requests.lock();
        let request = &requests[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "http://cms/site/resourceapi/news");
        assert_eq!(request.header("authorization"), Some("Bearer abc123"));
        assert_eq!(request.header("Server-Id"), Some("s1"));
        assert_eq!(request.header("Accept-Version"), Some("1.0"));
        assert_eq!(request.header("cookie"), Some("JSESSIONID=1"));
        assert_eq!(request.header("X-Forwarded-For"), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_get_page_without_credentials() {
        let (api, recorder) = api(ApiOptions::default(), 200, "{}");
        api.get_page("/").await.unwrap();
        assert!(recorder.requests.lock()[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_status_error() {
        let (api, _) = api(ApiOptions::default(), 503, "");
        let err = api.get_page("/").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let (api, _) = api(ApiOptions::default(), 200, "<html>");
        let err = api.get_page("/").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_get_component_posts_form() {
        let options = ApiOptions {
            origin: Some("http://cms".to_string()),
            ..Default::default()
        };
        let (api, recorder) = api(options, 200, "{}");

        api.get_component(
            "/site/resourceapi?_hn:ref=r1",
            &[("title".to_string(), "Hello World".to_string())],
        )
        .await
        .unwrap();

        let requests = recorder.requests.lock();
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://cms/site/resourceapi?_hn:ref=r1");
        assert_eq!(request.body.as_deref(), Some("title=Hello+World"));
    }

    #[test]
    fn test_debug_hides_token() {
        let options = ApiOptions {
            authorization_token: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{options:?}").contains("secret"));
    }
}
