//! # Host Bridge Traits
//!
//! Contracts between the orchestration engine and the world around it.
//!
//! ## Overview
//!
//! The engine never talks to a socket, a wall clock or a concrete catalog
//! directly. Each capability it needs is a trait defined here and injected at
//! bootstrap, which keeps the orchestrators deterministic under test.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP transport
//!
//! ### Catalog
//! - [`CatalogProvider`](catalog::CatalogProvider) - Identity, followed artists,
//!   artist releases, album tracks and playlist writes against a remote
//!   music catalog
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert their own failures into it and keep HTTP status details intact in
//! [`BridgeError::Http`](error::BridgeError::Http).
//!
//! Every trait requires `Send + Sync`; implementations are shared across
//! worker tasks behind an `Arc`.

pub mod catalog;
pub mod error;
pub mod http;
pub mod logger;
pub mod time;

pub use error::BridgeError;

pub use catalog::{
    Album, AlbumGroup, Artist, CatalogProvider, CatalogUser, Market, PlaylistDetails,
    PlaylistHandle,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logger::{LogEntry, LogLevel, LoggerSink};
pub use time::{Clock, SystemClock};
