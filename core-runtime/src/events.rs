//! # Event Bus System
//!
//! Outbound notifications from the orchestration engine, delivered over a
//! `tokio::sync::broadcast` channel.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps one enum per orchestrator kind
//!   plus the generic error-message request
//! - **EventBus**: central broadcast channel, cheap to clone
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ SyncOrchestrator ├─────────>│           ├────────────>│ UI / host  │
//! └──────────────────┘          │ EventBus  │             └────────────┘
//! ┌──────────────────┐   emit   │           │  subscribe  ┌────────────┐
//! │PlaylistOrchestr. ├─────────>│           ├────────────>│ Subscriber │
//! └──────────────────┘          └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(1024);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Sync(SyncEvent::ProgressUpdated { percent: 50.0 }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Sync progress updated");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell `n` events behind and
//!   those events are gone. A sync with thousands of followed artists emits
//!   one `AlbumsAppended` per artist, so size the buffer accordingly.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers returns an error; the orchestrators ignore
//! it with `.ok()`.

use bridge_traits::catalog::{Album, Artist, CatalogUser};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1024;

/// Everything the engine tells its host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Library sync notifications
    Sync(SyncEvent),
    /// Playlist creation notifications
    Playlist(PlaylistEvent),
    /// The host should show its generic "something went wrong" message.
    ErrorMessageRequested,
}

impl CoreEvent {
    /// Short label for logs.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Playlist(e) => e.description(),
            CoreEvent::ErrorMessageRequested => "Error message requested",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::Failed) => EventSeverity::Error,
            CoreEvent::Playlist(PlaylistEvent::Failed) => EventSeverity::Error,
            CoreEvent::ErrorMessageRequested => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::Finished) => EventSeverity::Info,
            CoreEvent::Playlist(PlaylistEvent::Created { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Whether the event ends a run of its kind.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CoreEvent::Sync(SyncEvent::Finished | SyncEvent::Failed)
                | CoreEvent::Playlist(PlaylistEvent::Created { .. } | PlaylistEvent::Failed)
        )
    }
}

/// Coarse importance, used when hosts mirror events into their own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Notifications emitted by a library sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Identity of the account being synced.
    UserResolved { user: CatalogUser },
    /// Full followed-artist list, before any releases are fetched.
    ArtistsResolved { artists: Vec<Artist> },
    /// Albums of one artist, delivered as soon as that artist completes.
    AlbumsAppended {
        albums: Vec<Album>,
        /// Cutoff date (`YYYY-MM-DD`) the albums were fetched against.
        min_date: String,
    },
    /// Smoothed progress in `[0, 100]`.
    ProgressUpdated { percent: f64 },
    Finished,
    Failed,
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::UserResolved { .. } => "Sync user resolved",
            SyncEvent::ArtistsResolved { .. } => "Followed artists resolved",
            SyncEvent::AlbumsAppended { .. } => "Artist albums appended",
            SyncEvent::ProgressUpdated { .. } => "Sync progress updated",
            SyncEvent::Finished => "Sync finished",
            SyncEvent::Failed => "Sync failed",
        }
    }
}

/// Notifications emitted by a playlist creation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaylistEvent {
    /// All parts created and filled; carries the first part's id.
    Created { playlist_id: String },
    Failed,
}

impl PlaylistEvent {
    fn description(&self) -> &str {
        match self {
            PlaylistEvent::Created { .. } => "Playlist created",
            PlaylistEvent::Failed => "Playlist creation failed",
        }
    }
}

/// Fan-out channel every orchestrator publishes on. Clones share one
/// channel; a subscriber only sees events emitted after it subscribed.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// `capacity` events are retained per subscriber before it lags.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of subscribers reached; `Err` when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(16);
/// let playlist_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playlist(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Next buffered event that passes the filter, without waiting.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        use broadcast::error::TryRecvError;

        loop {
            let event = match self.receiver.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(skipped)) => return Some(Err(RecvError::Lagged(skipped))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            };
            if self.accepts(&event) {
                return Some(Ok(event));
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::catalog::AlbumGroup;

    fn sample_album() -> Album {
        Album {
            id: "album-1".to_string(),
            name: "Night Drive".to_string(),
            image: Some("https://i.scdn.co/image/300".to_string()),
            artists: vec![Artist {
                id: "artist-1".to_string(),
                name: "Kavinsky".to_string(),
            }],
            release_date: "2024-04-12".to_string(),
            group: AlbumGroup::Single,
            artist_id: "artist-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(CoreEvent::Sync(SyncEvent::Finished)).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = CoreEvent::Sync(SyncEvent::AlbumsAppended {
            albums: vec![sample_album()],
            min_date: "2024-04-01".to_string(),
        });

        let result = bus.emit(event.clone());
        assert_eq!(result.unwrap(), 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Playlist(PlaylistEvent::Created {
            playlist_id: "pl-1".to_string(),
        });
        bus.emit(event.clone()).ok();

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Playlist(_)));

        bus.emit(CoreEvent::Sync(SyncEvent::ProgressUpdated { percent: 10.0 }))
            .ok();
        bus.emit(CoreEvent::ErrorMessageRequested).ok();
        bus.emit(CoreEvent::Playlist(PlaylistEvent::Failed)).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, CoreEvent::Playlist(PlaylistEvent::Failed));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(CoreEvent::Sync(SyncEvent::ProgressUpdated {
                percent: f64::from(i) * 20.0,
            }))
            .ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            CoreEvent::Sync(SyncEvent::Failed).severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::ErrorMessageRequested.severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Sync(SyncEvent::Finished).severity(),
            EventSeverity::Info
        );
        assert_eq!(
            CoreEvent::Sync(SyncEvent::ProgressUpdated { percent: 1.0 }).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(CoreEvent::Sync(SyncEvent::Finished).is_terminal());
        assert!(CoreEvent::Playlist(PlaylistEvent::Failed).is_terminal());
        assert!(!CoreEvent::ErrorMessageRequested.is_terminal());
        assert!(!CoreEvent::Sync(SyncEvent::ProgressUpdated { percent: 100.0 }).is_terminal());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Sync(SyncEvent::ProgressUpdated { percent: 50.0 });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Sync");
        assert_eq!(json["payload"]["event"], "ProgressUpdated");
        assert_eq!(json["payload"]["percent"], 50.0);

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_unit_event_serialization() {
        let json = serde_json::to_value(CoreEvent::ErrorMessageRequested).unwrap();
        assert_eq!(json["type"], "ErrorMessageRequested");
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for _ in 0..10 {
                bus1.emit(CoreEvent::ErrorMessageRequested).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 0..10 {
                bus2.emit(CoreEvent::Sync(SyncEvent::ProgressUpdated {
                    percent: f64::from(i) * 10.0,
                }))
                .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
