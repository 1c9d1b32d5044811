//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`CoreConfig`] (credential, HTTP transport, clock and
//! settings) into the shared Rust core: it builds the Spotify catalog
//! provider, the event bus and the task supervisor, and exposes the inbound
//! triggers a host UI needs. Desktop apps typically enable the
//! `desktop-shims` feature so a reqwest-backed HTTP client is provided when
//! none is injected.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::{CoreConfig, CoreService};
//!
//! let config = CoreConfig::builder().access_token("token").build()?;
//! let core = CoreService::bootstrap(config)?;
//!
//! let mut events = core.subscribe();
//! core.start_sync().await;
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.description());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, EngineLimits, SyncSettings};
pub use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaylistEvent, SyncEvent};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_sync::{PlaylistRequest, RunId, SyncOutcome, TaskKind};

use bridge_traits::{CatalogProvider, CatalogUser};
use core_sync::TaskSupervisor;
use provider_spotify::{FetchClient, SpotifyConnector};
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    event_bus: Arc<EventBus>,
    supervisor: Arc<TaskSupervisor>,
}

impl CoreService {
    /// Builds the engine against the Spotify Web API.
    ///
    /// # Errors
    ///
    /// `CoreError::Config` if the configuration does not validate.
    pub fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let client = FetchClient::new(Arc::clone(&config.http_client), &config.access_token)
            .with_base_url(&config.api_base_url);
        let connector = SpotifyConnector::from_client(client).with_page_size(config.limits.page_size);

        info!(api_base_url = %config.api_base_url, "Core service bootstrapped");
        Self::with_catalog(config, Arc::new(connector))
    }

    /// Builds the engine against any catalog implementation.
    ///
    /// # Errors
    ///
    /// `CoreError::Config` if the configuration does not validate.
    pub fn with_catalog(config: CoreConfig, catalog: Arc<dyn CatalogProvider>) -> Result<Self> {
        config.validate()?;

        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let supervisor = TaskSupervisor::new(
            catalog,
            Arc::clone(&event_bus),
            config.clock,
            config.settings,
            config.limits,
        );

        Ok(Self {
            event_bus,
            supervisor: Arc::new(supervisor),
        })
    }

    /// Starts a library sync, superseding one already running.
    pub async fn start_sync(&self) -> RunId {
        self.supervisor.start_sync().await
    }

    /// Starts creating playlists, superseding a creation already running.
    pub async fn start_playlist_creation(&self, request: PlaylistRequest) -> RunId {
        self.supervisor.start_playlist_creation(request).await
    }

    /// Returns `false` when no creation was running.
    pub async fn cancel_playlist_creation(&self) -> bool {
        self.supervisor.cancel_playlist_creation().await
    }

    /// Outbound notifications from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Replaces the sync settings used by the next run.
    pub async fn update_settings(&self, settings: SyncSettings) -> Result<()> {
        Ok(self.supervisor.update_settings(settings).await?)
    }

    pub async fn settings(&self) -> SyncSettings {
        self.supervisor.settings().await
    }

    pub async fn current_user(&self) -> Option<CatalogUser> {
        self.supervisor.current_user().await
    }

    /// Outcome of the latest successful sync.
    pub async fn last_sync(&self) -> Option<Arc<SyncOutcome>> {
        self.supervisor.last_sync().await
    }

    pub async fn is_running(&self, kind: TaskKind) -> bool {
        self.supervisor.is_running(kind).await
    }

    /// Waits for the latest run of `kind` to end.
    pub async fn wait(&self, kind: TaskKind) {
        self.supervisor.wait(kind).await
    }

    /// Cancels all runs and waits for them to unwind.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("event_bus", &self.event_bus)
            .finish_non_exhaustive()
    }
}
