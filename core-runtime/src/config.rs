//! # Core Configuration Module
//!
//! Configuration for the release sync engine.
//!
//! ## Overview
//!
//! A [`CoreConfig`] is assembled with [`CoreConfigBuilder`] and holds every
//! injected dependency plus the tunable settings. Validation is fail-fast:
//! `build()` refuses a config the orchestrators could not run with.
//!
//! ## Required Dependencies
//!
//! - Access token - Bearer credential for the catalog API
//! - `HttpClient` - HTTP transport (desktop default: reqwest, behind the
//!   `desktop-shims` feature)
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source for release cutoffs (default: [`SystemClock`])
//!
//! ## Settings
//!
//! - [`SyncSettings`] - user-facing choices: release groups, market and the
//!   lookback window. Replaceable at runtime.
//! - [`EngineLimits`] - fixed engine constants: worker count, page sizes,
//!   playlist capacity and the progress tick.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, SyncSettings};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .access_token("BQD...")
//!     .http_client(Arc::new(MyHttpClient))
//!     .settings(SyncSettings::default().with_lookback_days(14))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No access token
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing access token");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AlbumGroup, Clock, HttpClient, Market, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Catalog Web API root. Paths are joined onto it, so it ends with `/`.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1/";

// ============================================================================
// Sync Settings
// ============================================================================

/// User-selectable sync options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Release groups to fetch, in request order.
    pub groups: Vec<AlbumGroup>,

    /// Market filter; `None` means the account's own market.
    pub market: Option<Market>,

    /// How far back (in days) a release may be and still count.
    pub lookback_days: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            groups: AlbumGroup::ALL.to_vec(),
            market: None,
            lookback_days: 30,
        }
    }
}

impl SyncSettings {
    pub fn with_groups(mut self, groups: impl Into<Vec<AlbumGroup>>) -> Self {
        self.groups = groups.into();
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Market to send with catalog requests.
    pub fn effective_market(&self) -> Market {
        self.market.clone().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::Config(
                "At least one release group must be selected".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self.groups.iter().find(|group| !seen.insert(**group)) {
            return Err(Error::Config(format!(
                "Release group '{}' is listed more than once",
                duplicate
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Engine Limits
// ============================================================================

/// Fixed engine constants. The defaults match the catalog's request caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineLimits {
    /// Concurrent artist/album workers.
    pub worker_count: usize,

    /// Page size for followed artists and artist albums (max 50).
    pub page_size: usize,

    /// Album ids per tracks lookup (max 20).
    pub album_batch_size: usize,

    /// Tracks per playlist part before a new part is started.
    pub playlist_capacity: usize,

    /// Track URIs per append request (max 100).
    pub append_batch_size: usize,

    /// Progress tick period.
    pub progress_interval_ms: u64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            worker_count: 6,
            page_size: 50,
            album_batch_size: 20,
            playlist_capacity: 9500,
            append_batch_size: 100,
            progress_interval_ms: 550,
        }
    }
}

impl EngineLimits {
    pub const MAX_PAGE_SIZE: usize = 50;
    pub const MAX_ALBUM_BATCH_SIZE: usize = 20;
    pub const MAX_APPEND_BATCH_SIZE: usize = 100;

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("worker_count", self.worker_count),
            ("page_size", self.page_size),
            ("album_batch_size", self.album_batch_size),
            ("playlist_capacity", self.playlist_capacity),
            ("append_batch_size", self.append_batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }

        if self.progress_interval_ms == 0 {
            return Err(Error::Config(
                "progress_interval_ms must be greater than 0".to_string(),
            ));
        }

        let capped = [
            ("page_size", self.page_size, Self::MAX_PAGE_SIZE),
            (
                "album_batch_size",
                self.album_batch_size,
                Self::MAX_ALBUM_BATCH_SIZE,
            ),
            (
                "append_batch_size",
                self.append_batch_size,
                Self::MAX_APPEND_BATCH_SIZE,
            ),
        ];
        for (name, value, max) in capped {
            if value > max {
                return Err(Error::Config(format!(
                    "{} exceeds the catalog maximum of {}",
                    name, max
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Core Config
// ============================================================================

/// Core configuration for the release sync engine.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Bearer token sent with every catalog request
    pub access_token: String,

    /// HTTP transport
    pub http_client: Arc<dyn HttpClient>,

    /// Time source for release cutoffs
    pub clock: Arc<dyn Clock>,

    /// Catalog API root
    pub api_base_url: String,

    pub settings: SyncSettings,

    pub limits: EngineLimits,

    /// Per-subscriber event buffer
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("access_token", &"<redacted>")
            .field("http_client", &"HttpClient { ... }")
            .field("clock", &"Clock { ... }")
            .field("api_base_url", &self.api_base_url)
            .field("settings", &self.settings)
            .field("limits", &self.limits)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::Config("Access token cannot be empty".to_string()));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "API base URL must be http(s): {}",
                self.api_base_url
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.settings.validate()?;
        self.limits.validate()
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new().map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: format!("Failed to initialize desktop HTTP client: {}", e),
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "An HttpClient implementation is required for catalog requests. \
                  Enable the 'desktop-shims' feature or inject one with .http_client()."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    access_token: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    api_base_url: Option<String>,
    settings: Option<SyncSettings>,
    limits: Option<EngineLimits>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the bearer token (required).
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// Required unless the `desktop-shims` feature supplies a default.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Overrides the catalog API root. A missing trailing `/` is added.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.api_base_url = Some(url);
        self
    }

    pub fn settings(mut self, settings: SyncSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn limits(mut self, limits: EngineLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the access token is missing or any setting is
    ///   out of range
    /// - `Error::CapabilityMissing` if no HTTP client was injected and no
    ///   platform default is available
    pub fn build(self) -> Result<CoreConfig> {
        let access_token = self.access_token.ok_or_else(|| {
            Error::Config("Access token is required. Use .access_token() to set it.".to_string())
        })?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            access_token,
            http_client,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            api_base_url: self
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            settings: self.settings.unwrap_or_default(),
            limits: self.limits.unwrap_or_default(),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
