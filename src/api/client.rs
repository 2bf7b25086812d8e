//! Default `reqwest`-backed HTTP client.

use async_trait::async_trait;

use super::{FetchError, HttpClient, HttpRequest, HttpResponse, Method};

/// HTTP client backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url;
        let transport = |err: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            message: err.to_string(),
        };

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        Ok(HttpResponse { status, body })
    }
}
