//! reqwest-backed transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use tracing::debug;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::config::HttpConfig;
use crate::{Error, Result};

/// HTTP transport using a pooled [`reqwest::Client`]
#[derive(Clone)]
pub struct ReqwestTransport {
    /// HTTP client
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport from HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Arc<Self>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            // Token endpoints answer directly; a redirect would drop the POST
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Arc::new(Self { client }))
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: Client) -> Arc<Self> {
        Arc::new(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = name
                .parse::<HeaderName>()
                .map_err(|e| Error::Transport(format!("Invalid header name {name}: {e}")))?;
            let value = value
                .parse::<HeaderValue>()
                .map_err(|e| Error::Transport(format!("Invalid header value: {e}")))?;
            headers.append(name, value);
        }

        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                // The query carries grant material; keep it out of the message
                Error::Transport(format!("{} request failed: {}", request.method, e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        debug!(method = %request.method, status, bytes = body.len(), "HTTP exchange complete");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
