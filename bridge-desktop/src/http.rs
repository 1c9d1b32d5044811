//! `HttpClient` over a pooled reqwest client.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::{header::HeaderMap, Client, Method};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("release-sync/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Desktop transport.
///
/// One attempt per request; rate-limit waits live in the catalog client,
/// which knows how the remote signals them. Only connecting is time-boxed
/// by default: a slow answer is still an answer.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::build(Self::builder())
    }

    /// Additionally caps every request at `timeout` overall.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(
            Self::builder()
                .timeout(timeout)
                .connect_timeout(CONNECT_TIMEOUT.min(timeout)),
        )
    }

    fn builder() -> reqwest::ClientBuilder {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(8)
            .user_agent(USER_AGENT)
    }

    fn build(builder: reqwest::ClientBuilder) -> Result<Self> {
        builder
            .build()
            .map(Self::with_client)
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client unavailable: {e}")))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn prepare(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let method = match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let builder = headers
            .into_iter()
            .fold(self.client.request(method, url), |builder, (name, value)| {
                builder.header(name, value)
            });
        let builder = match body {
            Some(body) => builder.body(body),
            None => builder,
        };
        match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

fn network_error(error: reqwest::Error) -> BridgeError {
    let detail = if error.is_timeout() {
        "timed out".to_string()
    } else if error.is_connect() {
        format!("connect failed: {error}")
    } else {
        error.to_string()
    };
    BridgeError::Network(detail)
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "HTTP request");

        let response = self.prepare(request).send().await.map_err(|e| {
            warn!(error = %e, "HTTP transport failure");
            network_error(e)
        })?;

        let status = response.status();
        let headers = flatten_headers(response.headers());
        let body = response.bytes().await.map_err(network_error)?;

        debug!(status = status.as_u16(), bytes = body.len(), "HTTP response");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
