//! Authenticated Web API transport.
//!
//! [`FetchClient`] adds the bearer credential to every call, interprets the
//! status code and transparently waits out rate limiting. A 429 answer is
//! retried after `Retry-After + 1` seconds, as many times as the server asks.
//! No other failure is retried.

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_async::time::{sleep, Duration};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SpotifyError};
use crate::types::{ErrorEnvelope, Paged};

/// Spotify Web API base URL
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1/";

const TOO_MANY_REQUESTS: u16 = 429;

/// Margin added on top of `Retry-After`, which tends to undershoot.
const RETRY_AFTER_MARGIN: Duration = Duration::from_secs(1);

pub struct FetchClient {
    http_client: Arc<dyn HttpClient>,
    access_token: String,
    base_url: String,
}

impl FetchClient {
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
            base_url: SPOTIFY_API_BASE.to_string(),
        }
    }

    /// Points the client at another API root (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Absolute URL for an endpoint relative to the API root.
    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET `url` and decode the JSON payload.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = HttpRequest::get(url).header("Accept", "application/json");
        let response = self.send(request).await?;
        decode(&response)
    }

    /// POST `body` as JSON to `url` and decode the JSON payload.
    pub async fn post<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = HttpRequest::post(url).json(body)?;
        let response = self.send(request).await?;
        decode(&response)
    }

    /// Follows `next` links from `url` until the last page, an empty page,
    /// or until `follow` returns `false`.
    ///
    /// `extract` pulls the paging object out of each response, which lets
    /// endpoints that nest it (`{"artists": {...}}`) share the loop.
    /// `follow` sees every item collected so far, including the page just
    /// fetched; that page is always kept.
    pub async fn paginate<R, T, F, C>(&self, url: String, extract: F, mut follow: C) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        T: Send,
        F: Fn(R) -> Paged<T> + Send,
        C: FnMut(&[T]) -> bool + Send,
    {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page = extract(self.get::<R>(&url).await?);
            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);

            if follow(&items) {
                next = page.next;
            }
        }

        Ok(items)
    }

    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = request.bearer_token(&self.access_token);

        loop {
            let response = self.http_client.execute(request.clone()).await?;

            if response.is_success() {
                debug!(status = response.status, "API request succeeded");
                return Ok(response);
            }

            if response.status == TOO_MANY_REQUESTS {
                let wait = retry_after(&response).saturating_add(RETRY_AFTER_MARGIN);
                warn!(wait_ms = wait.as_millis() as u64, "Rate limited, retrying");
                sleep(wait).await;
                continue;
            }

            warn!(status = response.status, "API request failed");

            if response.is_client_error() {
                return Err(SpotifyError::Request {
                    status: response.status,
                    status_text: response.status_text.clone(),
                    message: error_message(&response),
                });
            }

            return Err(SpotifyError::Server {
                status: response.status,
                status_text: response.status_text.clone(),
            });
        }
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| SpotifyError::Parse(format!("Failed to parse response body: {}", e)))
}

/// `Retry-After` as whole seconds. Missing or garbled values count as zero.
fn retry_after(response: &HttpResponse) -> Duration {
    response
        .header("Retry-After")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}

fn error_message(response: &HttpResponse) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelope>(&response.body)
        .ok()
        .and_then(|envelope| envelope.error.message)
}
